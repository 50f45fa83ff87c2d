//! # Monster Database
//!
//! Monster identities, the two attributes the tier is derived from
//! (`mvp_exp` and the boss mode bit), and the loot tables.
//!
//! The database keeps a copy of every loot table as it was loaded. `reload`
//! puts those back, which is how the host undoes earlier suppression.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{DatabaseError, DatabaseResult};
use crate::item_db::{ItemDatabase, ItemId, EMPTY_ITEM};

/// Unique identifier for a monster type.
pub type MobId = u32;

/// Regular loot slots per monster.
pub const MAX_MOB_DROP: usize = 10;

/// MVP reward slots per monster.
pub const MAX_MVP_DROP: usize = 3;

/// Monster behavior flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MobMode(u32);

impl MobMode {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Monster can move.
    pub const CAN_MOVE: Self = Self(1 << 0);
    /// Monster picks up items.
    pub const LOOTER: Self = Self(1 << 1);
    /// Monster attacks on sight.
    pub const AGGRESSIVE: Self = Self(1 << 2);
    /// Monster helps its kind.
    pub const ASSIST: Self = Self(1 << 3);
    /// Monster detects casting while idle.
    pub const CAST_SENSOR_IDLE: Self = Self(1 << 4);
    /// Boss protocol (immune to status effects, shows on radar).
    pub const BOSS: Self = Self(1 << 5);
    /// Monster takes 1 damage per hit.
    pub const PLANT: Self = Self(1 << 6);

    /// Creates flags from raw value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Checks if a specific flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Combines two flag sets.
    #[inline]
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }
}

/// One entry of a loot table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DropSlot {
    /// The item, or `EMPTY_ITEM`.
    pub item_id: ItemId,
    /// Drop chance in 1/10000 units.
    pub chance: u32,
}

impl DropSlot {
    /// Creates an empty slot.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            item_id: EMPTY_ITEM,
            chance: 0,
        }
    }

    /// Creates a slot.
    #[inline]
    #[must_use]
    pub const fn new(item_id: ItemId, chance: u32) -> Self {
        Self { item_id, chance }
    }

    /// Returns true if this slot can never drop anything.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.chance == 0 || self.item_id == EMPTY_ITEM
    }

    /// Clears this slot.
    #[inline]
    pub fn clear(&mut self) {
        self.item_id = EMPTY_ITEM;
        self.chance = 0;
    }
}

/// A monster definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MobRecord {
    /// Unique identifier.
    pub id: MobId,
    /// Sprite name (e.g. `PORING`).
    pub sprite: String,
    /// Display name.
    pub name: String,
    /// MVP experience reward. Positive means MVP-tier.
    pub mvp_exp: u32,
    /// Behavior flags.
    pub mode: MobMode,
    /// Regular loot table.
    pub drops: Vec<DropSlot>,
    /// MVP reward table.
    pub mvp_drops: Vec<DropSlot>,
}

impl MobRecord {
    /// Creates a normal monster with empty loot tables.
    #[must_use]
    pub fn new(id: MobId, sprite: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            sprite: sprite.into(),
            name: name.into(),
            mvp_exp: 0,
            mode: MobMode::NONE,
            drops: Vec::new(),
            mvp_drops: Vec::new(),
        }
    }

    /// Sets the MVP experience reward.
    #[must_use]
    pub fn with_mvp_exp(mut self, mvp_exp: u32) -> Self {
        self.mvp_exp = mvp_exp;
        self
    }

    /// Adds mode flags.
    #[must_use]
    pub fn with_mode(mut self, mode: MobMode) -> Self {
        self.mode = self.mode.with(mode);
        self
    }

    /// Appends a regular loot slot. Ignored once the table is full.
    #[must_use]
    pub fn with_drop(mut self, item_id: ItemId, chance: u32) -> Self {
        if self.drops.len() < MAX_MOB_DROP {
            self.drops.push(DropSlot::new(item_id, chance));
        }
        self
    }

    /// Appends an MVP reward slot. Ignored once the table is full.
    #[must_use]
    pub fn with_mvp_drop(mut self, item_id: ItemId, chance: u32) -> Self {
        if self.mvp_drops.len() < MAX_MVP_DROP {
            self.mvp_drops.push(DropSlot::new(item_id, chance));
        }
        self
    }

    /// Returns true if the boss mode bit is set.
    #[inline]
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        self.mode.has(MobMode::BOSS)
    }

    /// Returns the regular slot chance for an item (0 if absent).
    #[must_use]
    pub fn drop_chance(&self, item_id: ItemId) -> u32 {
        self.drops
            .iter()
            .filter(|s| s.item_id == item_id)
            .map(|s| s.chance)
            .max()
            .unwrap_or(0)
    }
}

/// Read and write access to the host's monster database.
pub trait MonsterDatabase {
    /// Resolves a sprite or display name (case-insensitive) to a monster id.
    fn resolve_mob(&self, name: &str) -> Option<MobId>;

    /// Looks up a monster by id.
    fn mob(&self, id: MobId) -> Option<&MobRecord>;

    /// Iterates all monsters in ascending id order.
    fn mobs(&self) -> impl Iterator<Item = &MobRecord>;

    /// Iterates all monsters mutably in ascending id order.
    fn mobs_mut(&mut self) -> impl Iterator<Item = &mut MobRecord>;

    /// Restores every loot table from the database's source of truth.
    fn reload(&mut self);
}

#[derive(Deserialize)]
struct MobFile {
    #[serde(default)]
    mob: Vec<RawMob>,
}

#[derive(Deserialize)]
struct RawMob {
    id: MobId,
    sprite: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mvp_exp: u32,
    #[serde(default)]
    mode: MobMode,
    #[serde(default)]
    drops: Vec<RawDrop>,
    #[serde(default)]
    mvp_drops: Vec<RawDrop>,
}

#[derive(Deserialize)]
struct RawDrop {
    item: String,
    chance: u32,
}

/// In-memory monster database keyed by id.
#[derive(Clone, Debug, Default)]
pub struct MobDb {
    records: BTreeMap<MobId, MobRecord>,
    /// Loot tables as loaded, restored by `reload`.
    origin: BTreeMap<MobId, MobRecord>,
    names: HashMap<String, MobId>,
}

impl MobDb {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a database from records. The records become the reload source.
    ///
    /// # Errors
    ///
    /// Returns error on a reserved id, a repeated id, or a repeated sprite name.
    pub fn from_records(records: impl IntoIterator<Item = MobRecord>) -> DatabaseResult<Self> {
        let mut db = Self::new();
        for record in records {
            db.insert(record)?;
        }
        Ok(db)
    }

    /// Loads a TOML monster database (`[[mob]]` tables).
    ///
    /// Loot entries name their item; entries naming an unknown item are
    /// skipped with a warning, and entries past the table size are dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or holds
    /// conflicting records.
    pub fn load(path: impl AsRef<Path>, items: &impl ItemDatabase) -> DatabaseResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DatabaseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: MobFile = toml::from_str(&text).map_err(|source| DatabaseError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut db = Self::new();
        for raw in file.mob {
            let drops = resolve_slots(&raw.sprite, &raw.drops, MAX_MOB_DROP, items);
            let mvp_drops = resolve_slots(&raw.sprite, &raw.mvp_drops, MAX_MVP_DROP, items);
            db.insert(MobRecord {
                id: raw.id,
                sprite: raw.sprite,
                name: raw.name,
                mvp_exp: raw.mvp_exp,
                mode: raw.mode,
                drops,
                mvp_drops,
            })?;
        }
        info!("Loaded {} monsters from '{}'", db.len(), path.display());
        Ok(db)
    }

    /// Adds one record and snapshots its loot tables.
    ///
    /// # Errors
    ///
    /// Returns error on a reserved id, a repeated id, or a repeated sprite name.
    pub fn insert(&mut self, record: MobRecord) -> DatabaseResult<()> {
        if record.id == 0 {
            return Err(DatabaseError::ReservedId {
                what: "mob",
                name: record.sprite,
            });
        }
        if self.records.contains_key(&record.id) {
            return Err(DatabaseError::DuplicateId {
                what: "mob",
                id: record.id,
            });
        }

        let sprite = record.sprite.to_lowercase();
        let taken = self
            .names
            .get(&sprite)
            .and_then(|id| self.records.get(id))
            .is_some_and(|r| r.sprite.to_lowercase() == sprite);
        if taken {
            return Err(DatabaseError::DuplicateName {
                what: "mob",
                name: record.sprite,
            });
        }
        self.names.insert(sprite, record.id);
        if !record.name.is_empty() {
            self.names.entry(record.name.to_lowercase()).or_insert(record.id);
        }

        self.origin.insert(record.id, record.clone());
        self.records.insert(record.id, record);
        Ok(())
    }

    /// Number of monsters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the database holds no monsters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn resolve_slots(
    sprite: &str,
    raw: &[RawDrop],
    limit: usize,
    items: &impl ItemDatabase,
) -> Vec<DropSlot> {
    if raw.len() > limit {
        warn!(
            "Monster '{}' lists {} drops, only the first {} are kept",
            sprite,
            raw.len(),
            limit
        );
    }
    raw.iter()
        .take(limit)
        .filter_map(|drop| match items.resolve_item(&drop.item) {
            Some(item_id) => Some(DropSlot::new(item_id, drop.chance)),
            None => {
                warn!("Monster '{}' drops unknown item '{}', skipping", sprite, drop.item);
                None
            }
        })
        .collect()
}

impl MonsterDatabase for MobDb {
    fn resolve_mob(&self, name: &str) -> Option<MobId> {
        self.names.get(&name.to_lowercase()).copied()
    }

    fn mob(&self, id: MobId) -> Option<&MobRecord> {
        self.records.get(&id)
    }

    fn mobs(&self) -> impl Iterator<Item = &MobRecord> {
        self.records.values()
    }

    fn mobs_mut(&mut self) -> impl Iterator<Item = &mut MobRecord> {
        self.records.values_mut()
    }

    fn reload(&mut self) {
        self.records.clone_from(&self.origin);
    }
}
