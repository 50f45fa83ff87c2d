//! # Database Error Types
//!
//! All errors that can occur while loading the item and monster databases.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a database file.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The database file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The database file is not valid TOML for its schema.
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// Two records share the same numeric id.
    #[error("duplicate id {id} in {what} database")]
    DuplicateId {
        /// Which database ("item" or "mob").
        what: &'static str,
        /// The repeated id.
        id: u32,
    },

    /// Two records share the same lookup name.
    #[error("duplicate name '{name}' in {what} database")]
    DuplicateName {
        /// Which database ("item" or "mob").
        what: &'static str,
        /// The repeated name.
        name: String,
    },

    /// Id 0 is reserved for the empty slot.
    #[error("id 0 is reserved in {what} database (record '{name}')")]
    ReservedId {
        /// Which database ("item" or "mob").
        what: &'static str,
        /// Name of the offending record.
        name: String,
    },
}

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
