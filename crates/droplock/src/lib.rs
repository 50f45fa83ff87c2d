//! # DROPLOCK
//!
//! Keeps locked items out of monster loot tables, across every database
//! reload the map server goes through.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  HostEvent  ┌───────────┐  hooks  ┌──────────────┐
//! │  stdin   │────────────>│ MapServer │────────>│   DropLock   │
//! └──────────┘             │           │         │ (lifecycle)  │
//!                          │ Databases │<────────│ parse/apply  │
//!                          └───────────┘  &mut   └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use droplock::{Databases, DropLock, DropLockConfig, HostEvent, MapServer};
//! use droplock_rules::FileRuleSource;
//!
//! let config = DropLockConfig::load("data/droplock.toml")?;
//! let mut server = MapServer::new(Databases::load(&config.database)?);
//! server.register(Box::new(DropLock::new(FileRuleSource::new(config.rules.path))))?;
//! server.handle(HostEvent::ServerOnline);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod lifecycle;
pub mod plugin;

pub use config::{DatabaseConfig, DropLockConfig, LoggingConfig, RulesConfig};
pub use error::{ServerError, ServerResult};
pub use events::{EventBus, EventReceiver, EventSender, HostEvent};
pub use host::{Databases, MapServer, ServerPlugin};
pub use lifecycle::{CycleReport, DropLock, Phase};
pub use plugin::RELOAD_COMMAND;
