//! # Server Error Types
//!
//! Errors of the host side. The drop-lock lifecycle itself has none: every
//! rule problem is a diagnostic.

use std::path::PathBuf;

use droplock_core::DatabaseError;
use thiserror::Error;

/// Errors that can occur while setting up or reloading the host.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The server config file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server config file is not valid.
    #[error("invalid config {path}: {source}")]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// An item or monster database failed to load.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Two plugins registered the same @command.
    #[error("command @{command} already registered by {owner}")]
    DuplicateCommand {
        /// The command name.
        command: String,
        /// Plugin that registered it first.
        owner: &'static str,
    },
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
