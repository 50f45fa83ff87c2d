//! # Server Configuration
//!
//! ```toml
//! [rules]
//! path = "conf/itemdroplock.toml"
//!
//! [database]
//! item_db = "db/item_db.toml"
//! mob_db = "db/mob_db.toml"
//!
//! [logging]
//! level = "info"
//! json = false
//! ```
//!
//! Every section is optional. Relative paths are taken relative to the
//! directory holding the config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ServerError, ServerResult};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DropLockConfig {
    /// Rule source.
    pub rules: RulesConfig,
    /// Database files.
    pub database: DatabaseConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Where the drop-lock rules live.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule file path.
    pub path: PathBuf,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("conf/itemdroplock.toml"),
        }
    }
}

/// Where the databases live.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Item database file.
    pub item_db: PathBuf,
    /// Monster database file.
    pub mob_db: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            item_db: PathBuf::from("db/item_db.toml"),
            mob_db: PathBuf::from("db/mob_db.toml"),
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `droplock_rules=debug`.
    pub level: String,
    /// Emit JSON lines instead of text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl DropLockConfig {
    /// Loads a config file and anchors its relative paths at the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ServerError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.anchored_at(base))
    }

    /// Joins every relative path onto `base`.
    #[must_use]
    pub fn anchored_at(mut self, base: &Path) -> Self {
        for path in [
            &mut self.rules.path,
            &mut self.database.item_db,
            &mut self.database.mob_db,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DropLockConfig::default();
        assert_eq!(config.rules.path, PathBuf::from("conf/itemdroplock.toml"));
        assert_eq!(config.database.mob_db, PathBuf::from("db/mob_db.toml"));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: DropLockConfig = toml::from_str(
            r#"
[rules]
path = "custom/rules.toml"

[logging]
json = true
"#,
        )
        .unwrap();
        assert_eq!(config.rules.path, PathBuf::from("custom/rules.toml"));
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_anchors_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("droplock.toml");
        std::fs::write(
            &path,
            r#"
[database]
item_db = "/srv/db/item_db.toml"
"#,
        )
        .unwrap();

        let config = DropLockConfig::load(&path).unwrap();
        assert_eq!(config.rules.path, dir.path().join("conf/itemdroplock.toml"));
        assert_eq!(config.database.item_db, PathBuf::from("/srv/db/item_db.toml"));
        assert_eq!(config.database.mob_db, dir.path().join("db/mob_db.toml"));
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("droplock.toml");
        std::fs::write(&path, "[logging]\njson = \"maybe\"\n").unwrap();
        assert!(matches!(
            DropLockConfig::load(&path),
            Err(ServerError::Config { .. })
        ));
        assert!(matches!(
            DropLockConfig::load(dir.path().join("missing.toml")),
            Err(ServerError::ConfigIo { .. })
        ));
    }
}
