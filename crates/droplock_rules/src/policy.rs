//! # Policy Table
//!
//! Item identity -> suppression policy. An item without a policy is never
//! touched. The table is built in full by one parse and swapped in whole.

use std::collections::{BTreeSet, HashMap};

use droplock_core::{ItemId, MobId};

use crate::engine::MobTier;

/// Which tiers may drop an item, and which monsters always may.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuppressionPolicy {
    /// Drop permitted from normal monsters.
    pub allow_normal: bool,
    /// Drop permitted from boss-flagged, zero-exp monsters.
    pub allow_boss: bool,
    /// Drop permitted from MVP-tier monsters.
    pub allow_mvp: bool,
    /// Monsters that keep the drop regardless of the flags.
    pub exceptions: BTreeSet<MobId>,
}

impl SuppressionPolicy {
    /// Blocks the item from every tier, no exceptions.
    #[must_use]
    pub fn block_all() -> Self {
        Self::default()
    }

    /// Sets the per-tier flags.
    #[must_use]
    pub fn with_flags(mut self, allow_normal: bool, allow_boss: bool, allow_mvp: bool) -> Self {
        self.allow_normal = allow_normal;
        self.allow_boss = allow_boss;
        self.allow_mvp = allow_mvp;
        self
    }

    /// Adds an exempt monster.
    #[must_use]
    pub fn with_exception(mut self, mob_id: MobId) -> Self {
        self.exceptions.insert(mob_id);
        self
    }

    /// Returns the flag for `tier`.
    #[inline]
    #[must_use]
    pub const fn allows(&self, tier: MobTier) -> bool {
        match tier {
            MobTier::Normal => self.allow_normal,
            MobTier::Boss => self.allow_boss,
            MobTier::Mvp => self.allow_mvp,
        }
    }

    /// Returns true if `mob_id` is exempt.
    #[inline]
    #[must_use]
    pub fn is_exception(&self, mob_id: MobId) -> bool {
        self.exceptions.contains(&mob_id)
    }

    /// Decides one slot: exception first, then the tier flag.
    #[inline]
    #[must_use]
    pub fn permits(&self, mob_id: MobId, tier: MobTier) -> bool {
        self.is_exception(mob_id) || self.allows(tier)
    }

    /// Returns true if no tier may ever drop the item.
    #[inline]
    #[must_use]
    pub const fn blocks_every_tier(&self) -> bool {
        !self.allow_normal && !self.allow_boss && !self.allow_mvp
    }
}

/// The full set of loaded policies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyTable {
    policies: HashMap<ItemId, SuppressionPolicy>,
}

impl PolicyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the policy for an item.
    #[inline]
    #[must_use]
    pub fn lookup(&self, item_id: ItemId) -> Option<&SuppressionPolicy> {
        self.policies.get(&item_id)
    }

    /// Returns true if the item has a policy.
    #[must_use]
    pub fn contains(&self, item_id: ItemId) -> bool {
        self.policies.contains_key(&item_id)
    }

    /// Adds a policy. Returns `false` and keeps the existing one if the
    /// item already has a policy.
    pub fn insert(&mut self, item_id: ItemId, policy: SuppressionPolicy) -> bool {
        if self.policies.contains_key(&item_id) {
            return false;
        }
        self.policies.insert(item_id, policy);
        true
    }

    /// Removes every policy.
    pub fn clear(&mut self) {
        self.policies.clear();
    }

    /// Replaces the whole content with `table`.
    pub fn install(&mut self, table: PolicyTable) {
        *self = table;
    }

    /// Number of items with a policy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns true if no rules are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Iterates `(item, policy)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &SuppressionPolicy)> {
        self.policies.iter().map(|(id, policy)| (*id, policy))
    }
}
