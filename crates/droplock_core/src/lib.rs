//! # DROPLOCK Core
//!
//! The item and monster databases the drop-lock rules are applied to.
//!
//! ## Ownership
//!
//! The host owns both databases. The rule engine only borrows them for the
//! duration of a single pass:
//!
//! ```text
//! ┌─────────────┐  resolve names   ┌─────────────────┐
//! │   ItemDb    │<─────────────────│   Rule Reader   │
//! │             │                  └─────────────────┘
//! │ max_chance  │<──┐
//! │ drop_sources│   │ zero ceilings ┌─────────────────┐
//! └─────────────┘   └───────────────│   Suppression   │
//! ┌─────────────┐   zero slots      │     Engine      │
//! │    MobDb    │<──────────────────│                 │
//! └─────────────┘                   └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use droplock_core::{ItemDb, MobDb};
//!
//! let items = ItemDb::load("data/db/item_db.toml")?;
//! let mobs = MobDb::load("data/db/mob_db.toml", &items)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod item_db;
pub mod mob_db;

pub use error::{DatabaseError, DatabaseResult};
pub use item_db::{
    DropSource, ItemDatabase, ItemDb, ItemId, ItemRecord, EMPTY_ITEM, MAX_DROP_SOURCES,
};
pub use mob_db::{
    DropSlot, MobDb, MobId, MobMode, MobRecord, MonsterDatabase, MAX_MOB_DROP, MAX_MVP_DROP,
};
