//! Hooks the drop-lock coordinator into the map server.

use droplock_rules::RuleSource;

use crate::host::{Databases, ServerPlugin};
use crate::lifecycle::DropLock;

/// The operator command that rereads the rules.
pub const RELOAD_COMMAND: &str = "reloadlockeddrops";

impl<S: RuleSource> ServerPlugin for DropLock<S> {
    fn name(&self) -> &'static str {
        "itemdroplock"
    }

    fn commands(&self) -> &'static [&'static str] {
        &[RELOAD_COMMAND]
    }

    fn on_server_online(&self, dbs: &mut Databases) {
        self.server_online(&mut dbs.items, &mut dbs.mobs);
    }

    fn on_mob_db_loaded(&self, dbs: &mut Databases) {
        self.mob_db_loaded(&mut dbs.items, &mut dbs.mobs);
    }

    fn on_item_db_reloaded(&self, dbs: &mut Databases) {
        self.item_db_reloaded(&dbs.items, &dbs.mobs);
    }

    fn on_command(&self, _command: &str, dbs: &mut Databases) -> String {
        self.reload_command(&mut dbs.items, &mut dbs.mobs)
            .ack_message()
    }

    fn on_shutdown(&self) {
        self.shutdown();
    }
}
