//! # Rule Source Reader
//!
//! Turns the rule list into a fresh `PolicyTable`.
//!
//! Per entry, in order:
//! 1. Resolve the item name. Unknown: skip the entry.
//! 2. Already has a policy from this parse: skip (first entry wins).
//! 3. Build the policy. Flags default to `false`; a group overrides them.
//! 4. Resolve each `Except` name. Unknown or repeated: skip that name only.
//!
//! A source that cannot be read yields an empty table and one diagnostic.

use droplock_core::{ItemDatabase, MonsterDatabase};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::RuleDiagnostic;
use crate::policy::{PolicyTable, SuppressionPolicy};
use crate::source::RuleSource;

/// Result of one parse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// The policies committed by this parse.
    pub table: PolicyTable,
    /// Everything that was skipped, in order.
    pub diagnostics: Vec<RuleDiagnostic>,
    /// Number of list elements read, committed or not.
    pub entries_read: usize,
}

impl ParseOutcome {
    /// Number of policies committed.
    #[must_use]
    pub fn committed(&self) -> usize {
        self.table.len()
    }
}

/// A structured entry as written in the rule file.
#[derive(Deserialize)]
struct RuleGroup {
    #[serde(rename = "Item")]
    item: Option<String>,
    #[serde(rename = "Normal")]
    normal: Option<bool>,
    #[serde(rename = "Boss")]
    boss: Option<bool>,
    #[serde(rename = "Mvp")]
    mvp: Option<bool>,
    #[serde(rename = "Except", default)]
    except: Vec<String>,
}

/// One entry, normalized.
struct RuleEntry {
    item: String,
    normal: bool,
    boss: bool,
    mvp: bool,
    except: Vec<String>,
}

impl RuleEntry {
    fn from_value(entry: usize, value: toml::Value) -> Result<Self, RuleDiagnostic> {
        match value {
            toml::Value::String(item) => Ok(Self {
                item,
                normal: false,
                boss: false,
                mvp: false,
                except: Vec::new(),
            }),
            value @ toml::Value::Table(_) => {
                let group = value.try_into::<RuleGroup>().map_err(|e| {
                    RuleDiagnostic::MalformedEntry {
                        entry,
                        reason: e.message().to_string(),
                    }
                })?;
                let item = group
                    .item
                    .ok_or(RuleDiagnostic::MissingItemName { entry })?;
                Ok(Self {
                    item,
                    normal: group.normal.unwrap_or(false),
                    boss: group.boss.unwrap_or(false),
                    mvp: group.mvp.unwrap_or(false),
                    except: group.except,
                })
            }
            other => Err(RuleDiagnostic::MalformedEntry {
                entry,
                reason: format!("expected an item name or a group, found {}", other.type_str()),
            }),
        }
    }
}

/// Reads `source` into a fresh policy table.
///
/// Never fails: every problem becomes a diagnostic and the affected entry
/// (or `Except` name) is left out.
pub fn parse(
    source: &impl RuleSource,
    items: &impl ItemDatabase,
    mobs: &impl MonsterDatabase,
) -> ParseOutcome {
    let origin = source.origin();
    let mut outcome = ParseOutcome::default();

    let entries = match source.entries() {
        Ok(entries) => entries,
        Err(e) => {
            if e.is_not_found() {
                warn!("DropLock: no rule file at {}, no drops are locked", origin);
            } else {
                error!("DropLock: {}", e);
            }
            outcome.diagnostics.push(RuleDiagnostic::SourceUnavailable {
                origin,
                reason: e.to_string(),
            });
            return outcome;
        }
    };

    for (index, value) in entries.into_iter().enumerate() {
        let entry = index + 1;
        outcome.entries_read += 1;

        if let Err(diagnostic) = read_entry(entry, value, items, mobs, &mut outcome) {
            error!("DropLock: {} in {}", diagnostic, origin);
            outcome.diagnostics.push(diagnostic);
        }
    }

    info!(
        "Done reading '{}' entries in '{}' ({} committed, {} skipped)",
        outcome.entries_read,
        origin,
        outcome.committed(),
        outcome.diagnostics.len()
    );
    outcome
}

/// Commits one entry. An `Err` means the whole entry was skipped; skipped
/// `Except` names are pushed straight into `outcome`.
fn read_entry(
    entry: usize,
    value: toml::Value,
    items: &impl ItemDatabase,
    mobs: &impl MonsterDatabase,
    outcome: &mut ParseOutcome,
) -> Result<(), RuleDiagnostic> {
    let rule = RuleEntry::from_value(entry, value)?;

    let Some(item_id) = items.resolve_item(&rule.item) else {
        return Err(RuleDiagnostic::UnknownItem {
            entry,
            name: rule.item,
        });
    };
    if outcome.table.contains(item_id) {
        return Err(RuleDiagnostic::DuplicateItem {
            entry,
            name: rule.item,
        });
    }

    let mut policy = SuppressionPolicy::block_all().with_flags(rule.normal, rule.boss, rule.mvp);
    for mob in rule.except {
        let diagnostic = match mobs.resolve_mob(&mob) {
            None => RuleDiagnostic::UnknownMob {
                item: rule.item.clone(),
                mob,
            },
            Some(mob_id) if policy.exceptions.insert(mob_id) => continue,
            Some(_) => RuleDiagnostic::DuplicateMob {
                item: rule.item.clone(),
                mob,
            },
        };
        error!("DropLock: {}", diagnostic);
        outcome.diagnostics.push(diagnostic);
    }

    outcome.table.insert(item_id, policy);
    Ok(())
}
