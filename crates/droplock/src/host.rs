//! # Map Server Host
//!
//! The minimal host the drop-lock plugin lives in: it owns the databases,
//! knows when they finish loading, and routes @commands.
//!
//! ## Plugin Registration
//!
//! ```text
//! register(plugin) ──> hooks: server_online, mob_db_loaded,
//!                             item_db_reloaded, shutdown
//!                  └─> commands: @name -> plugin
//! ```
//!
//! Plugins are called in registration order. Built-in commands:
//! `@reloadmobdb`, `@reloaditemdb`.

use std::collections::HashMap;

use droplock_core::{ItemDatabase, ItemDb, MobDb, MonsterDatabase};
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{ServerError, ServerResult};
use crate::events::HostEvent;

/// The databases a plugin may read and mutate.
#[derive(Clone, Debug, Default)]
pub struct Databases {
    /// Item database.
    pub items: ItemDb,
    /// Monster database.
    pub mobs: MobDb,
}

impl Databases {
    /// Wraps loaded databases and builds the item drop index.
    #[must_use]
    pub fn new(mut items: ItemDb, mobs: MobDb) -> Self {
        items.index_drops(mobs.mobs());
        Self { items, mobs }
    }

    /// Loads both databases from disk.
    ///
    /// # Errors
    ///
    /// Returns error if either file cannot be loaded.
    pub fn load(config: &DatabaseConfig) -> ServerResult<Self> {
        let items = ItemDb::load(&config.item_db)?;
        let mobs = MobDb::load(&config.mob_db, &items)?;
        Ok(Self::new(items, mobs))
    }
}

/// A server extension hooked into database load events.
///
/// Every hook has an empty default.
pub trait ServerPlugin {
    /// Plugin name, for logs.
    fn name(&self) -> &'static str;

    /// @commands this plugin answers, without the `@`.
    fn commands(&self) -> &'static [&'static str] {
        &[]
    }

    /// The server finished booting.
    fn on_server_online(&self, _dbs: &mut Databases) {}

    /// The monster database finished (re)loading.
    fn on_mob_db_loaded(&self, _dbs: &mut Databases) {}

    /// The item database finished reloading.
    fn on_item_db_reloaded(&self, _dbs: &mut Databases) {}

    /// Runs one of `commands()`. Returns the reply for the requester.
    fn on_command(&self, command: &str, _dbs: &mut Databases) -> String {
        format!("@{command} is not implemented by {}", self.name())
    }

    /// The server is stopping.
    fn on_shutdown(&self) {}
}

/// Owns the databases and the plugins; handles one event at a time.
pub struct MapServer {
    dbs: Databases,
    /// Files to re-read on reload; `None` restores from memory instead.
    paths: Option<DatabaseConfig>,
    plugins: Vec<Box<dyn ServerPlugin>>,
    /// Command name -> index into `plugins`.
    commands: HashMap<String, usize>,
}

impl MapServer {
    /// Creates a server over already-loaded databases.
    #[must_use]
    pub fn new(dbs: Databases) -> Self {
        Self {
            dbs,
            paths: None,
            plugins: Vec::new(),
            commands: HashMap::new(),
        }
    }

    /// Re-reads databases from these files on reload.
    #[must_use]
    pub fn with_paths(mut self, paths: DatabaseConfig) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Registers a plugin's hooks and commands.
    ///
    /// # Errors
    ///
    /// Returns error if a command is already taken.
    pub fn register(&mut self, plugin: Box<dyn ServerPlugin>) -> ServerResult<()> {
        let index = self.plugins.len();
        for command in plugin.commands() {
            let key = command.to_lowercase();
            if Self::is_builtin(&key) {
                return Err(ServerError::DuplicateCommand {
                    command: key,
                    owner: "map-server",
                });
            }
            if let Some(&owner) = self.commands.get(&key) {
                return Err(ServerError::DuplicateCommand {
                    command: key,
                    owner: self.plugins[owner].name(),
                });
            }
        }
        for command in plugin.commands() {
            self.commands.insert(command.to_lowercase(), index);
        }
        info!("Plugin '{}' registered", plugin.name());
        self.plugins.push(plugin);
        Ok(())
    }

    /// The databases.
    #[must_use]
    pub fn databases(&self) -> &Databases {
        &self.dbs
    }

    /// Handles one event. Returns the reply for command events.
    pub fn handle(&mut self, event: HostEvent) -> Option<String> {
        match event {
            HostEvent::ServerOnline => {
                info!("Server is now online");
                for plugin in &self.plugins {
                    plugin.on_server_online(&mut self.dbs);
                }
                None
            }
            HostEvent::Command { requester, line } => Some(self.run_command(&requester, &line)),
            HostEvent::Shutdown => {
                info!("Server is shutting down");
                for plugin in &self.plugins {
                    plugin.on_shutdown();
                }
                None
            }
        }
    }

    fn is_builtin(command: &str) -> bool {
        matches!(command, "reloadmobdb" | "reloaditemdb")
    }

    fn run_command(&mut self, requester: &str, line: &str) -> String {
        let Some(command) = line
            .trim()
            .strip_prefix('@')
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_lowercase)
        else {
            return format!("'{}' is not a command", line.trim());
        };
        info!("{} used @{}", requester, command);

        let result = match command.as_str() {
            "reloadmobdb" => self.reload_mob_db(),
            "reloaditemdb" => self.reload_item_db(),
            _ => match self.commands.get(&command) {
                Some(&index) => Ok(self.plugins[index].on_command(&command, &mut self.dbs)),
                None => {
                    warn!("{} used unknown command @{}", requester, command);
                    return format!("Unknown command: @{command}");
                }
            },
        };
        result.unwrap_or_else(|e| {
            error!("@{} failed: {}", command, e);
            format!("@{command} failed: {e}")
        })
    }

    /// Re-reads the monster database (or restores it from memory), then
    /// fires `on_mob_db_loaded`.
    fn reload_mob_db(&mut self) -> ServerResult<String> {
        match &self.paths {
            Some(paths) => self.dbs.mobs = MobDb::load(&paths.mob_db, &self.dbs.items)?,
            None => self.dbs.mobs.reload(),
        }
        self.dbs.items.index_drops(self.dbs.mobs.mobs());
        for plugin in &self.plugins {
            plugin.on_mob_db_loaded(&mut self.dbs);
        }
        Ok("Monster database has been reloaded.".to_string())
    }

    /// Re-reads the item database (when backed by a file), then fires
    /// `on_item_db_reloaded`.
    fn reload_item_db(&mut self) -> ServerResult<String> {
        if let Some(paths) = &self.paths {
            self.dbs.items = ItemDb::load(&paths.item_db)?;
            self.dbs.items.index_drops(self.dbs.mobs.mobs());
        }
        for plugin in &self.plugins {
            plugin.on_item_db_reloaded(&mut self.dbs);
        }
        Ok("Item database has been reloaded.".to_string())
    }
}
