//! # Classification & Suppression Engine
//!
//! One pass over every monster. For each occupied regular slot whose item
//! has a policy, the slot is kept when the monster is exempt or its tier is
//! allowed, and emptied otherwise. MVP reward slots are only looked at on
//! MVP-tier monsters and only answer to `allow_mvp`.
//!
//! ## Aggregate Ceiling
//!
//! When a suppressed item is blocked on every tier, its `max_chance` is
//! zeroed too. The monster's entry in the item's drop-source list is zeroed
//! on every regular suppression. MVP slots touch neither.
//!
//! ## Idempotence
//!
//! Emptied slots are skipped on the next pass, so applying twice without a
//! reload in between changes nothing.

use droplock_core::{DropSlot, ItemDatabase, MobId, MobRecord, MonsterDatabase};
use tracing::{debug, info};

use crate::policy::PolicyTable;

/// Monster classification for drop rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MobTier {
    /// Neither boss nor MVP.
    Normal,
    /// Boss mode bit set, no MVP experience.
    Boss,
    /// Positive MVP experience.
    Mvp,
}

impl MobTier {
    /// Derives the tier from the current monster record.
    #[inline]
    #[must_use]
    pub const fn of(mob: &MobRecord) -> Self {
        if mob.mvp_exp > 0 {
            Self::Mvp
        } else if mob.is_boss() {
            Self::Boss
        } else {
            Self::Normal
        }
    }
}

/// What one pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuppressionReport {
    /// Monsters visited.
    pub mobs_scanned: usize,
    /// Regular slots emptied.
    pub drops_suppressed: usize,
    /// MVP reward slots emptied.
    pub mvp_drops_suppressed: usize,
    /// Item ceilings set to zero.
    pub ceilings_zeroed: usize,
}

impl SuppressionReport {
    /// Total slots emptied.
    #[must_use]
    pub const fn total_suppressed(&self) -> usize {
        self.drops_suppressed + self.mvp_drops_suppressed
    }
}

/// Applies `table` to every loot table in `mobs`.
pub fn apply(
    table: &PolicyTable,
    items: &mut impl ItemDatabase,
    mobs: &mut impl MonsterDatabase,
) -> SuppressionReport {
    let mut report = SuppressionReport::default();

    for mob in mobs.mobs_mut() {
        report.mobs_scanned += 1;
        let tier = MobTier::of(mob);
        suppress_regular(table, items, mob.id, tier, &mut mob.drops, &mut report);
        if tier == MobTier::Mvp {
            suppress_mvp(table, mob.id, &mut mob.mvp_drops, &mut report);
        }
    }

    info!(
        "DropLock: {} drops and {} MVP drops locked across {} monsters",
        report.drops_suppressed, report.mvp_drops_suppressed, report.mobs_scanned
    );
    report
}

fn suppress_regular(
    table: &PolicyTable,
    items: &mut impl ItemDatabase,
    mob_id: MobId,
    tier: MobTier,
    slots: &mut [DropSlot],
    report: &mut SuppressionReport,
) {
    for slot in slots.iter_mut().filter(|s| !s.is_empty()) {
        let item_id = slot.item_id;
        let Some(policy) = table.lookup(item_id) else {
            continue;
        };
        if policy.permits(mob_id, tier) {
            continue;
        }

        slot.clear();
        report.drops_suppressed += 1;
        debug!(mob_id, item_id, ?tier, "drop locked");

        let Some(item) = items.item_mut(item_id) else {
            continue;
        };
        item.clear_drop_source(mob_id);
        if policy.blocks_every_tier() && item.max_chance != 0 {
            item.max_chance = 0;
            report.ceilings_zeroed += 1;
        }
    }
}

fn suppress_mvp(
    table: &PolicyTable,
    mob_id: MobId,
    slots: &mut [DropSlot],
    report: &mut SuppressionReport,
) {
    for slot in slots.iter_mut().filter(|s| !s.is_empty()) {
        let item_id = slot.item_id;
        let Some(policy) = table.lookup(item_id) else {
            continue;
        };
        if policy.permits(mob_id, MobTier::Mvp) {
            continue;
        }

        slot.clear();
        report.mvp_drops_suppressed += 1;
        debug!(mob_id, item_id, "MVP drop locked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SuppressionPolicy;
    use droplock_core::{ItemDb, ItemRecord, MobDb, MobMode};

    const RED_POTION: u32 = 501;
    const YELLOW_GEMSTONE: u32 = 715;
    const JELLOPY: u32 = 909;

    const PORING: u32 = 1002;
    const DROPS: u32 = 1113;
    const OSIRIS: u32 = 1038;
    const MASTERING: u32 = 1090;

    fn databases() -> (ItemDb, MobDb) {
        let mut items = ItemDb::from_records([
            ItemRecord::new(RED_POTION, "Red_Potion", "Red Potion"),
            ItemRecord::new(YELLOW_GEMSTONE, "Yellow_Gemstone", "Yellow Gemstone"),
            ItemRecord::new(JELLOPY, "Jellopy", "Jellopy"),
        ])
        .unwrap();
        let mobs = MobDb::from_records([
            MobRecord::new(PORING, "PORING", "Poring")
                .with_drop(JELLOPY, 7000)
                .with_drop(RED_POTION, 700)
                .with_drop(YELLOW_GEMSTONE, 100),
            MobRecord::new(DROPS, "DROPS", "Drops")
                .with_drop(YELLOW_GEMSTONE, 300)
                .with_drop(RED_POTION, 900),
            MobRecord::new(MASTERING, "MASTERING", "Mastering")
                .with_mode(MobMode::BOSS)
                .with_drop(RED_POTION, 2000)
                .with_drop(YELLOW_GEMSTONE, 500),
            MobRecord::new(OSIRIS, "OSIRIS", "Osiris")
                .with_mode(MobMode::BOSS)
                .with_mvp_exp(4_000)
                .with_drop(RED_POTION, 5000)
                .with_drop(YELLOW_GEMSTONE, 250)
                .with_mvp_drop(RED_POTION, 5500)
                .with_mvp_drop(JELLOPY, 3000),
        ])
        .unwrap();
        items.index_drops(mobs.mobs());
        (items, mobs)
    }

    fn chance(mobs: &MobDb, mob_id: u32, item_id: u32) -> u32 {
        mobs.mob(mob_id).unwrap().drop_chance(item_id)
    }

    fn mvp_chance(mobs: &MobDb, mob_id: u32, item_id: u32) -> u32 {
        mobs.mob(mob_id)
            .unwrap()
            .mvp_drops
            .iter()
            .find(|s| s.item_id == item_id)
            .map_or(0, |s| s.chance)
    }

    #[test]
    fn test_tier_classification() {
        let (_, mobs) = databases();
        assert_eq!(MobTier::of(mobs.mob(PORING).unwrap()), MobTier::Normal);
        assert_eq!(MobTier::of(mobs.mob(MASTERING).unwrap()), MobTier::Boss);
        // MVP experience outranks the boss bit.
        assert_eq!(MobTier::of(mobs.mob(OSIRIS).unwrap()), MobTier::Mvp);
        let plain_mvp = MobRecord::new(1, "X", "").with_mvp_exp(1);
        assert_eq!(MobTier::of(&plain_mvp), MobTier::Mvp);
    }

    #[test]
    fn test_blocked_everywhere_zeroes_slots_and_ceiling() {
        let (mut items, mut mobs) = databases();
        let mut table = PolicyTable::new();
        table.insert(YELLOW_GEMSTONE, SuppressionPolicy::block_all());

        let report = apply(&table, &mut items, &mut mobs);

        for mob in mobs.mobs() {
            assert_eq!(mob.drop_chance(YELLOW_GEMSTONE), 0, "mob {}", mob.id);
        }
        let gem = items.item(YELLOW_GEMSTONE).unwrap();
        assert_eq!(gem.max_chance, 0);
        assert!(gem.drop_sources.iter().all(|s| s.chance == 0));
        assert_eq!(report.drops_suppressed, 4);
        assert_eq!(report.ceilings_zeroed, 1);
        assert_eq!(report.mobs_scanned, 4);
        // Untouched items keep their chances.
        assert_eq!(chance(&mobs, PORING, JELLOPY), 7000);
        assert_eq!(items.item(JELLOPY).unwrap().max_chance, 7000);
    }

    #[test]
    fn test_boss_allowed_scenario() {
        let (mut items, mut mobs) = databases();
        let mut table = PolicyTable::new();
        table.insert(
            RED_POTION,
            SuppressionPolicy::block_all().with_flags(false, true, false),
        );

        apply(&table, &mut items, &mut mobs);

        assert_eq!(chance(&mobs, MASTERING, RED_POTION), 2000);
        assert_eq!(chance(&mobs, PORING, RED_POTION), 0);
        assert_eq!(chance(&mobs, DROPS, RED_POTION), 0);
        assert_eq!(chance(&mobs, OSIRIS, RED_POTION), 0);
        assert_eq!(mvp_chance(&mobs, OSIRIS, RED_POTION), 0);
        // A tier still allows it, so the ceiling stays.
        assert_eq!(items.item(RED_POTION).unwrap().max_chance, 5000);
        assert_eq!(
            items.item(RED_POTION).unwrap().drop_source(PORING).unwrap().chance,
            0
        );
        assert_eq!(
            items.item(RED_POTION).unwrap().drop_source(MASTERING).unwrap().chance,
            2000
        );
    }

    #[test]
    fn test_exception_keeps_slot() {
        let (mut items, mut mobs) = databases();
        let mut table = PolicyTable::new();
        table.insert(
            YELLOW_GEMSTONE,
            SuppressionPolicy::block_all().with_exception(PORING),
        );

        apply(&table, &mut items, &mut mobs);

        assert_eq!(chance(&mobs, PORING, YELLOW_GEMSTONE), 100);
        assert_eq!(chance(&mobs, DROPS, YELLOW_GEMSTONE), 0);
        assert_eq!(chance(&mobs, MASTERING, YELLOW_GEMSTONE), 0);
        assert_eq!(chance(&mobs, OSIRIS, YELLOW_GEMSTONE), 0);
        assert_eq!(items.item(YELLOW_GEMSTONE).unwrap().max_chance, 0);
    }

    #[test]
    fn test_exception_beats_disallowed_tier_on_mvp_slots() {
        let (mut items, mut mobs) = databases();
        let mut table = PolicyTable::new();
        table.insert(JELLOPY, SuppressionPolicy::block_all().with_exception(OSIRIS));

        apply(&table, &mut items, &mut mobs);

        assert_eq!(mvp_chance(&mobs, OSIRIS, JELLOPY), 3000);
        assert_eq!(chance(&mobs, PORING, JELLOPY), 0);
    }

    #[test]
    fn test_mvp_allowed_keeps_both_tables() {
        let (mut items, mut mobs) = databases();
        let mut table = PolicyTable::new();
        table.insert(RED_POTION, SuppressionPolicy::block_all().with_flags(false, false, true));

        let report = apply(&table, &mut items, &mut mobs);

        assert_eq!(chance(&mobs, OSIRIS, RED_POTION), 5000);
        assert_eq!(mvp_chance(&mobs, OSIRIS, RED_POTION), 5500);
        assert_eq!(chance(&mobs, MASTERING, RED_POTION), 0);
        assert_eq!(report.mvp_drops_suppressed, 0);
    }

    #[test]
    fn test_mvp_slots_do_not_touch_ceiling() {
        let mut items = ItemDb::from_records([ItemRecord::new(JELLOPY, "Jellopy", "")]).unwrap();
        let mut mobs = MobDb::from_records([MobRecord::new(OSIRIS, "OSIRIS", "Osiris")
            .with_mvp_exp(4_000)
            .with_mvp_drop(JELLOPY, 3000)])
        .unwrap();
        items.index_drops(mobs.mobs());
        items.item_mut(JELLOPY).unwrap().max_chance = 1234;

        let mut table = PolicyTable::new();
        table.insert(JELLOPY, SuppressionPolicy::block_all());
        let report = apply(&table, &mut items, &mut mobs);

        assert_eq!(report.mvp_drops_suppressed, 1);
        assert_eq!(report.ceilings_zeroed, 0);
        assert_eq!(items.item(JELLOPY).unwrap().max_chance, 1234);
    }

    #[test]
    fn test_mvp_table_ignored_on_non_mvp() {
        let mut items = ItemDb::from_records([ItemRecord::new(JELLOPY, "Jellopy", "")]).unwrap();
        let mut mobs = MobDb::from_records([MobRecord::new(MASTERING, "MASTERING", "Mastering")
            .with_mode(MobMode::BOSS)
            .with_mvp_drop(JELLOPY, 3000)])
        .unwrap();

        let mut table = PolicyTable::new();
        table.insert(JELLOPY, SuppressionPolicy::block_all());
        apply(&table, &mut items, &mut mobs);

        assert_eq!(mvp_chance(&mobs, MASTERING, JELLOPY), 3000);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let (mut items, mut mobs) = databases();
        let mut table = PolicyTable::new();
        table.insert(RED_POTION, SuppressionPolicy::block_all().with_flags(false, true, false));
        table.insert(YELLOW_GEMSTONE, SuppressionPolicy::block_all().with_exception(DROPS));

        apply(&table, &mut items, &mut mobs);
        let once: Vec<MobRecord> = mobs.mobs().cloned().collect();
        let second = apply(&table, &mut items, &mut mobs);
        let twice: Vec<MobRecord> = mobs.mobs().cloned().collect();

        assert_eq!(once, twice);
        assert_eq!(second.total_suppressed(), 0);
        assert_eq!(second.ceilings_zeroed, 0);
    }

    #[test]
    fn test_empty_table_changes_nothing() {
        let (mut items, mut mobs) = databases();
        let before: Vec<MobRecord> = mobs.mobs().cloned().collect();
        let report = apply(&PolicyTable::new(), &mut items, &mut mobs);
        let after: Vec<MobRecord> = mobs.mobs().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(report.total_suppressed(), 0);
    }
}
