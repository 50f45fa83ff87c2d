//! # Rule Sources
//!
//! Where the rule list comes from. The reader only sees the list elements;
//! file access and TOML syntax stay here.
//!
//! ```toml
//! drop_block_db = [
//!     "Yellow_Gemstone",
//!     { Item = "Red_Potion", Boss = true },
//!     { Item = "Apple", Mvp = true, Except = ["Poring", "Drops"] },
//! ]
//! ```

use std::path::{Path, PathBuf};

use crate::error::{RuleSourceError, RuleSourceResult};

/// Name of the rule list in the document.
pub const DROP_BLOCK_LIST: &str = "drop_block_db";

/// A loadable key/value rule document.
pub trait RuleSource {
    /// Human-readable origin, used in diagnostics.
    fn origin(&self) -> String;

    /// Reads the document and returns the elements of the rule list, in order.
    ///
    /// # Errors
    ///
    /// Returns error if the document cannot be read or parsed, or has no
    /// rule list.
    fn entries(&self) -> RuleSourceResult<Vec<toml::Value>>;
}

/// Rules read from a TOML file on every call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    /// Creates a source for `path`. The file is not touched until read.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for FileRuleSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn entries(&self) -> RuleSourceResult<Vec<toml::Value>> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| RuleSourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        rule_list(&text, &self.origin())
    }
}

/// Rules held in memory, for embedding and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineRuleSource {
    text: String,
}

impl InlineRuleSource {
    /// Creates a source from TOML text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Replaces the document, as an operator editing the file would.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl RuleSource for InlineRuleSource {
    fn origin(&self) -> String {
        "<inline>".to_string()
    }

    fn entries(&self) -> RuleSourceResult<Vec<toml::Value>> {
        rule_list(&self.text, &self.origin())
    }
}

fn rule_list(text: &str, origin: &str) -> RuleSourceResult<Vec<toml::Value>> {
    let mut document: toml::Table =
        toml::from_str(text).map_err(|source| RuleSourceError::Syntax {
            origin: origin.to_string(),
            source,
        })?;

    match document.remove(DROP_BLOCK_LIST) {
        Some(toml::Value::Array(entries)) => Ok(entries),
        Some(_) => Err(RuleSourceError::NotAList {
            origin: origin.to_string(),
            list: DROP_BLOCK_LIST,
        }),
        None => Err(RuleSourceError::MissingList {
            origin: origin.to_string(),
            list: DROP_BLOCK_LIST,
        }),
    }
}
