//! # DROPLOCK Rules
//!
//! Item drop suppression for monster loot tables.
//!
//! ## Pipeline
//!
//! ```text
//! Rule file ──> parse() ──> PolicyTable ──> apply() ──> zeroed loot slots
//!                  │                           │
//!                  ▼                           ▼
//!            diagnostics                SuppressionReport
//! ```
//!
//! ## Design Principles
//!
//! 1. **Only ever zero** - a slot is either left alone or emptied
//! 2. **Exceptions win** - an exempt monster keeps its drop whatever the tier flags say
//! 3. **Tier is derived** - computed from the monster record at apply time, never cached
//! 4. **Skip, don't fail** - unknown names and duplicates disable one entry, not the file
//!
//! ## Example
//!
//! ```rust,ignore
//! use droplock_rules::{apply, parse, FileRuleSource};
//!
//! let outcome = parse(&FileRuleSource::new("conf/itemdroplock.toml"), &items, &mobs);
//! let report = apply(&outcome.table, &mut items, &mut mobs);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod engine;
pub mod error;
pub mod policy;
pub mod reader;
pub mod source;

pub use engine::{apply, MobTier, SuppressionReport};
pub use error::{RuleDiagnostic, RuleSourceError, RuleSourceResult};
pub use policy::{PolicyTable, SuppressionPolicy};
pub use reader::{parse, ParseOutcome};
pub use source::{FileRuleSource, InlineRuleSource, RuleSource, DROP_BLOCK_LIST};
