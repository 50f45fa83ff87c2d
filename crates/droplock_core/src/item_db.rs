//! # Item Database
//!
//! Item identities, name lookup, and the per-item drop bookkeeping the loot
//! system keeps next to the monster loot tables:
//! - `max_chance`: the aggregate ceiling used for drop-chance normalization
//! - `drop_sources`: the monsters that drop the item, best chance first

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{DatabaseError, DatabaseResult};
use crate::mob_db::{MobId, MobRecord};

/// Unique identifier for an item type.
pub type ItemId = u32;

/// Item id stored in a loot slot that holds nothing.
pub const EMPTY_ITEM: ItemId = 0;

/// Maximum number of monsters tracked per item in `drop_sources`.
pub const MAX_DROP_SOURCES: usize = 5;

/// One monster known to drop an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DropSource {
    /// The monster dropping the item.
    pub mob_id: MobId,
    /// Its regular drop chance (1/10000 units).
    pub chance: u32,
}

/// An item definition.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ItemRecord {
    /// Unique identifier.
    pub id: ItemId,
    /// Script name (e.g. `Red_Potion`). Rule files refer to items by this.
    pub aegis_name: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Highest regular drop chance over all monsters.
    #[serde(skip)]
    pub max_chance: u32,
    /// Monsters dropping this item, highest chance first.
    #[serde(skip)]
    pub drop_sources: Vec<DropSource>,
}

impl ItemRecord {
    /// Creates an item with no drop bookkeeping yet.
    #[must_use]
    pub fn new(id: ItemId, aegis_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            aegis_name: aegis_name.into(),
            name: name.into(),
            max_chance: 0,
            drop_sources: Vec::new(),
        }
    }

    /// Returns the drop-source entry for a monster, if tracked.
    #[must_use]
    pub fn drop_source(&self, mob_id: MobId) -> Option<&DropSource> {
        self.drop_sources.iter().find(|s| s.mob_id == mob_id)
    }

    /// Zeroes the chance recorded for `mob_id`.
    ///
    /// Returns `true` if the monster was tracked.
    pub fn clear_drop_source(&mut self, mob_id: MobId) -> bool {
        match self.drop_sources.iter_mut().find(|s| s.mob_id == mob_id) {
            Some(source) => {
                source.chance = 0;
                true
            }
            None => false,
        }
    }
}

/// Read and write access to the host's item database.
pub trait ItemDatabase {
    /// Resolves a script or display name (case-insensitive) to an item id.
    fn resolve_item(&self, name: &str) -> Option<ItemId>;

    /// Looks up an item by id.
    fn item(&self, id: ItemId) -> Option<&ItemRecord>;

    /// Looks up an item by id for mutation.
    fn item_mut(&mut self, id: ItemId) -> Option<&mut ItemRecord>;

    /// Rebuilds every item's `max_chance` and `drop_sources` from the
    /// regular loot tables of `mobs`.
    fn index_drops<'a>(&mut self, mobs: impl Iterator<Item = &'a MobRecord>);
}

#[derive(Deserialize)]
struct ItemFile {
    #[serde(default)]
    item: Vec<ItemRecord>,
}

/// In-memory item database keyed by id.
#[derive(Clone, Debug, Default)]
pub struct ItemDb {
    records: BTreeMap<ItemId, ItemRecord>,
    names: HashMap<String, ItemId>,
}

impl ItemDb {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a database from records.
    ///
    /// # Errors
    ///
    /// Returns error on a reserved id, a repeated id, or a repeated script name.
    pub fn from_records(records: impl IntoIterator<Item = ItemRecord>) -> DatabaseResult<Self> {
        let mut db = Self::new();
        for record in records {
            db.insert(record)?;
        }
        Ok(db)
    }

    /// Loads a TOML item database (`[[item]]` tables).
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or holds
    /// conflicting records.
    pub fn load(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DatabaseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ItemFile = toml::from_str(&text).map_err(|source| DatabaseError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::from_records(file.item)?;
        info!("Loaded {} items from '{}'", db.len(), path.display());
        Ok(db)
    }

    /// Adds one record.
    ///
    /// Display names are indexed only when no other item already claims
    /// them; script names must be unique.
    ///
    /// # Errors
    ///
    /// Returns error on a reserved id, a repeated id, or a repeated script name.
    pub fn insert(&mut self, record: ItemRecord) -> DatabaseResult<()> {
        if record.id == EMPTY_ITEM {
            return Err(DatabaseError::ReservedId {
                what: "item",
                name: record.aegis_name,
            });
        }
        if self.records.contains_key(&record.id) {
            return Err(DatabaseError::DuplicateId {
                what: "item",
                id: record.id,
            });
        }

        let aegis = record.aegis_name.to_lowercase();
        let taken = self
            .names
            .get(&aegis)
            .and_then(|id| self.records.get(id))
            .is_some_and(|r| r.aegis_name.to_lowercase() == aegis);
        if taken {
            return Err(DatabaseError::DuplicateName {
                what: "item",
                name: record.aegis_name,
            });
        }
        // A script name always wins over a display name claimed earlier.
        self.names.insert(aegis, record.id);
        if !record.name.is_empty() {
            self.names.entry(record.name.to_lowercase()).or_insert(record.id);
        }

        self.records.insert(record.id, record);
        Ok(())
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the database holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates items in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemRecord> {
        self.records.values()
    }
}

impl ItemDatabase for ItemDb {
    fn resolve_item(&self, name: &str) -> Option<ItemId> {
        self.names.get(&name.to_lowercase()).copied()
    }

    fn item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.records.get(&id)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut ItemRecord> {
        self.records.get_mut(&id)
    }

    fn index_drops<'a>(&mut self, mobs: impl Iterator<Item = &'a MobRecord>) {
        for item in self.records.values_mut() {
            item.max_chance = 0;
            item.drop_sources.clear();
        }

        for mob in mobs {
            for slot in mob.drops.iter().filter(|s| !s.is_empty()) {
                let Some(item) = self.records.get_mut(&slot.item_id) else {
                    continue;
                };
                item.max_chance = item.max_chance.max(slot.chance);
                match item.drop_sources.iter_mut().find(|s| s.mob_id == mob.id) {
                    Some(source) => source.chance = source.chance.max(slot.chance),
                    None => item.drop_sources.push(DropSource {
                        mob_id: mob.id,
                        chance: slot.chance,
                    }),
                }
            }
        }

        for item in self.records.values_mut() {
            // Stable sort keeps ascending mob id among equal chances.
            item.drop_sources.sort_by(|a, b| b.chance.cmp(&a.chance));
            item.drop_sources.truncate(MAX_DROP_SOURCES);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> ItemDb {
        ItemDb::from_records([
            ItemRecord::new(501, "Red_Potion", "Red Potion"),
            ItemRecord::new(715, "Yellow_Gemstone", "Yellow Gemstone"),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let db = sample_db();
        assert_eq!(db.resolve_item("Red_Potion"), Some(501));
        assert_eq!(db.resolve_item("red_potion"), Some(501));
        assert_eq!(db.resolve_item("Yellow Gemstone"), Some(715));
        assert_eq!(db.resolve_item("Nonexistent_Item"), None);
    }

    #[test]
    fn test_rejects_conflicting_records() {
        let mut db = sample_db();
        assert!(matches!(
            db.insert(ItemRecord::new(501, "Other", "")),
            Err(DatabaseError::DuplicateId { id: 501, .. })
        ));
        assert!(matches!(
            db.insert(ItemRecord::new(502, "RED_POTION", "")),
            Err(DatabaseError::DuplicateName { .. })
        ));
        assert!(matches!(
            db.insert(ItemRecord::new(EMPTY_ITEM, "Nothing", "")),
            Err(DatabaseError::ReservedId { .. })
        ));
    }

    #[test]
    fn test_index_drops_tracks_ceiling_and_sources() {
        let mut db = sample_db();
        let mobs = [
            MobRecord::new(1002, "PORING", "Poring").with_drop(501, 700),
            MobRecord::new(1113, "DROPS", "Drops")
                .with_drop(501, 1500)
                .with_drop(715, 50),
        ];
        db.index_drops(mobs.iter());

        let potion = db.item(501).unwrap();
        assert_eq!(potion.max_chance, 1500);
        assert_eq!(potion.drop_sources[0].mob_id, 1113);
        assert_eq!(potion.drop_sources[1].mob_id, 1002);
        assert_eq!(db.item(715).unwrap().max_chance, 50);
    }

    #[test]
    fn test_index_drops_caps_source_list() {
        let mut db = sample_db();
        let mobs: Vec<MobRecord> = (1..=8)
            .map(|i| MobRecord::new(1000 + i, format!("MOB_{i}"), "").with_drop(501, i * 10))
            .collect();
        db.index_drops(mobs.iter());

        let potion = db.item(501).unwrap();
        assert_eq!(potion.drop_sources.len(), MAX_DROP_SOURCES);
        assert_eq!(potion.drop_sources[0].chance, 80);
        assert_eq!(potion.max_chance, 80);
    }

    #[test]
    fn test_clear_drop_source() {
        let mut db = sample_db();
        let mobs = [MobRecord::new(1002, "PORING", "Poring").with_drop(501, 700)];
        db.index_drops(mobs.iter());

        let potion = db.item_mut(501).unwrap();
        assert!(potion.clear_drop_source(1002));
        assert!(!potion.clear_drop_source(9999));
        assert_eq!(potion.drop_source(1002).unwrap().chance, 0);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("item_db.toml");
        std::fs::write(
            &path,
            r#"
[[item]]
id = 501
aegis_name = "Red_Potion"
name = "Red Potion"

[[item]]
id = 909
aegis_name = "Jellopy"
"#,
        )
        .unwrap();

        let db = ItemDb::load(&path).unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.resolve_item("jellopy"), Some(909));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ItemDb::load("/nonexistent/item_db.toml").unwrap_err();
        assert!(matches!(err, DatabaseError::Io { .. }));
    }
}
