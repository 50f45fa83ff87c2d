//! # Rule Error Types
//!
//! `RuleSourceError` covers a rule source that cannot be read at all.
//! `RuleDiagnostic` covers everything the reader reports while it keeps
//! going. Neither ever aborts a reload.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading the rule source as a whole.
#[derive(Error, Debug)]
pub enum RuleSourceError {
    /// The rule file could not be read (including: it does not exist).
    #[error("cannot read {path}: {source}")]
    Io {
        /// Rule file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The rule document is not valid TOML.
    #[error("cannot parse {origin}: {source}")]
    Syntax {
        /// Where the document came from.
        origin: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The document has no rule list.
    #[error("'{list}' not found in {origin}")]
    MissingList {
        /// Where the document came from.
        origin: String,
        /// Expected list name.
        list: &'static str,
    },

    /// The rule list key exists but is not a list.
    #[error("'{list}' in {origin} is not a list")]
    NotAList {
        /// Where the document came from.
        origin: String,
        /// Expected list name.
        list: &'static str,
    },
}

impl RuleSourceError {
    /// Returns true if the source simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for rule source operations.
pub type RuleSourceResult<T> = Result<T, RuleSourceError>;

/// Something the reader skipped, and why.
///
/// Entry numbers are 1-based positions in the rule list.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RuleDiagnostic {
    /// The rule source could not be read; no rules are active.
    #[error("cannot read rule source {origin}: {reason}")]
    SourceUnavailable {
        /// Where the rules were expected.
        origin: String,
        /// Why they could not be read.
        reason: String,
    },

    /// A group entry without an `Item` field.
    #[error("item name not found for entry #{entry}, skipping")]
    MissingItemName {
        /// Entry position.
        entry: usize,
    },

    /// An entry that is neither an item name nor a well-formed group.
    #[error("malformed entry #{entry}: {reason}")]
    MalformedEntry {
        /// Entry position.
        entry: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The item name does not resolve against the item database.
    #[error("invalid item name '{name}' for entry #{entry}")]
    UnknownItem {
        /// Entry position.
        entry: usize,
        /// The unresolved name.
        name: String,
    },

    /// The item already has a policy from an earlier entry.
    #[error("duplicate entry for '{name}', entry #{entry}")]
    DuplicateItem {
        /// Entry position.
        entry: usize,
        /// The repeated item name.
        name: String,
    },

    /// An `Except` name does not resolve against the monster database.
    #[error("invalid mob '{mob}' for item '{item}'")]
    UnknownMob {
        /// Item whose exception list named it.
        item: String,
        /// The unresolved name.
        mob: String,
    },

    /// A monster listed twice in one `Except` list.
    #[error("duplicate mob '{mob}' for item '{item}'")]
    DuplicateMob {
        /// Item whose exception list repeated it.
        item: String,
        /// The repeated monster name.
        mob: String,
    },
}
