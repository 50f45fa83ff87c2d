//! # Lifecycle Coordinator
//!
//! Owns the policy table and sequences every cycle that touches it.
//!
//! ```text
//! trigger              clear  parse  install  restore loot  apply
//! ──────────────────── ─────  ─────  ───────  ────────────  ─────
//! server_online          ✓      ✓       ✓                     ✓
//! mob_db_loaded                                               ✓
//! item_db_reloaded       ✓      ✓       ✓
//! reload_command         ✓      ✓       ✓          ✓          ✓
//! shutdown               ✓
//! ```
//!
//! ## Concurrency
//!
//! Each trigger holds the phase lock from start to finish, so cycles never
//! interleave. The table is swapped in whole under the write lock; the
//! engine only ever sees a complete table.
//!
//! `item_db_reloaded` does not touch loot tables. Suppression reaches the
//! monsters on the next `mob_db_loaded` (or an explicit reload).

use droplock_core::{ItemDatabase, MonsterDatabase};
use droplock_rules::{apply, parse, PolicyTable, RuleSource, SuppressionReport};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tracing::{info, warn};

/// Where the coordinator is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Constructed; the server has not come online yet.
    Created,
    /// Rules loaded and applied at least once.
    Online,
    /// Shut down; the table is empty and triggers are ignored.
    ShutDown,
}

/// Outcome of one lifecycle cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Policies committed by the parse (0 if the cycle did not parse).
    pub committed: usize,
    /// Diagnostics emitted by the parse.
    pub skipped: usize,
    /// What the suppression pass changed (empty if the cycle did not apply).
    pub suppression: SuppressionReport,
}

impl CycleReport {
    /// The acknowledgment sent back to an operator. Always a success.
    #[must_use]
    pub fn ack_message(&self) -> String {
        format!(
            "Locked Drops have been reloaded ({} entries).",
            self.committed
        )
    }
}

/// The drop-lock coordinator.
pub struct DropLock<S> {
    /// Where the rules come from.
    source: S,
    /// The active policies.
    policies: RwLock<PolicyTable>,
    /// Current phase; held for the duration of each trigger.
    phase: Mutex<Phase>,
}

impl<S: RuleSource> DropLock<S> {
    /// Creates a coordinator with an empty table.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            policies: RwLock::new(PolicyTable::new()),
            phase: Mutex::new(Phase::Created),
        }
    }

    /// The rule source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Read access to the active policies.
    pub fn policies(&self) -> RwLockReadGuard<'_, PolicyTable> {
        self.policies.read()
    }

    /// Process start: load the rules and apply them.
    pub fn server_online(
        &self,
        items: &mut impl ItemDatabase,
        mobs: &mut impl MonsterDatabase,
    ) -> CycleReport {
        let mut phase = self.phase.lock();
        if *phase == Phase::ShutDown {
            warn!("DropLock: server_online after shutdown, ignored");
            return CycleReport::default();
        }

        let mut report = self.reparse(items, mobs);
        report.suppression = self.apply_current(items, mobs);
        *phase = Phase::Online;
        report
    }

    /// Monster database (re)loaded: apply the current rules, no reparse.
    pub fn mob_db_loaded(
        &self,
        items: &mut impl ItemDatabase,
        mobs: &mut impl MonsterDatabase,
    ) -> CycleReport {
        let phase = self.phase.lock();
        if *phase == Phase::ShutDown {
            warn!("DropLock: mob_db_loaded after shutdown, ignored");
            return CycleReport::default();
        }

        CycleReport {
            suppression: self.apply_current(items, mobs),
            ..CycleReport::default()
        }
    }

    /// Item database reloaded: item ids may have moved, so reparse.
    pub fn item_db_reloaded(
        &self,
        items: &impl ItemDatabase,
        mobs: &impl MonsterDatabase,
    ) -> CycleReport {
        let phase = self.phase.lock();
        if *phase == Phase::ShutDown {
            warn!("DropLock: item_db_reloaded after shutdown, ignored");
            return CycleReport::default();
        }

        self.reparse(items, mobs)
    }

    /// Operator reload: reparse, restore the loot tables from the monster
    /// database's source, and apply.
    pub fn reload_command(
        &self,
        items: &mut impl ItemDatabase,
        mobs: &mut impl MonsterDatabase,
    ) -> CycleReport {
        let phase = self.phase.lock();
        if *phase == Phase::ShutDown {
            warn!("DropLock: reload requested after shutdown, ignored");
            return CycleReport::default();
        }

        let mut report = self.reparse(items, mobs);
        mobs.reload();
        items.index_drops(mobs.mobs());
        report.suppression = self.apply_current(items, mobs);
        info!("DropLock: {}", report.ack_message());
        report
    }

    /// Process shutdown: drop every policy.
    pub fn shutdown(&self) {
        let mut phase = self.phase.lock();
        self.policies.write().clear();
        *phase = Phase::ShutDown;
        info!("DropLock: shut down");
    }

    fn reparse(&self, items: &impl ItemDatabase, mobs: &impl MonsterDatabase) -> CycleReport {
        self.policies.write().clear();
        let outcome = parse(&self.source, items, mobs);
        let report = CycleReport {
            committed: outcome.committed(),
            skipped: outcome.diagnostics.len(),
            suppression: SuppressionReport::default(),
        };
        self.policies.write().install(outcome.table);
        report
    }

    fn apply_current(
        &self,
        items: &mut impl ItemDatabase,
        mobs: &mut impl MonsterDatabase,
    ) -> SuppressionReport {
        let policies = self.policies.read();
        apply(&policies, items, mobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droplock_core::{ItemDb, ItemRecord, MobDb, MobRecord};
    use droplock_rules::InlineRuleSource;

    fn databases() -> (ItemDb, MobDb) {
        let mut items = ItemDb::from_records([
            ItemRecord::new(501, "Red_Potion", "Red Potion"),
            ItemRecord::new(909, "Jellopy", "Jellopy"),
        ])
        .unwrap();
        let mobs = MobDb::from_records([MobRecord::new(1002, "PORING", "Poring")
            .with_drop(909, 7000)
            .with_drop(501, 700)])
        .unwrap();
        items.index_drops(mobs.mobs());
        (items, mobs)
    }

    #[test]
    fn test_phases() {
        let (mut items, mut mobs) = databases();
        let lock = DropLock::new(InlineRuleSource::new(r#"drop_block_db = ["Jellopy"]"#));
        assert_eq!(lock.phase(), Phase::Created);

        let report = lock.server_online(&mut items, &mut mobs);
        assert_eq!(lock.phase(), Phase::Online);
        assert_eq!(report.committed, 1);
        assert_eq!(report.suppression.drops_suppressed, 1);

        lock.shutdown();
        assert_eq!(lock.phase(), Phase::ShutDown);
        assert!(lock.policies().is_empty());
    }

    #[test]
    fn test_triggers_after_shutdown_are_ignored() {
        let (mut items, mut mobs) = databases();
        let lock = DropLock::new(InlineRuleSource::new(r#"drop_block_db = ["Jellopy"]"#));
        lock.shutdown();

        assert_eq!(lock.server_online(&mut items, &mut mobs), CycleReport::default());
        assert_eq!(lock.reload_command(&mut items, &mut mobs), CycleReport::default());
        assert_eq!(lock.item_db_reloaded(&items, &mobs), CycleReport::default());
        assert!(lock.policies().is_empty());
        assert_eq!(mobs.mob(1002).unwrap().drop_chance(909), 7000);
    }

    #[test]
    fn test_mob_db_loaded_before_online_is_harmless() {
        let (mut items, mut mobs) = databases();
        let lock = DropLock::new(InlineRuleSource::new(r#"drop_block_db = ["Jellopy"]"#));

        let report = lock.mob_db_loaded(&mut items, &mut mobs);
        assert_eq!(report.suppression.total_suppressed(), 0);
        assert_eq!(report.suppression.mobs_scanned, 1);
    }

    #[test]
    fn test_ack_message_reports_entries() {
        let report = CycleReport {
            committed: 3,
            skipped: 2,
            suppression: SuppressionReport::default(),
        };
        assert_eq!(
            report.ack_message(),
            "Locked Drops have been reloaded (3 entries)."
        );
    }
}
