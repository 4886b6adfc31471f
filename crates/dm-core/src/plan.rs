//! Natural-key index and reconciliation plan
//!
//! The plan partitions `fresh ∪ destination` keys into creates, updates and
//! deletes. It owns the fresh records so the apply step can write them
//! without another lookup.

use crate::keys::{NaturalKey, RowId};
use crate::record::{DestinationRecord, OutputRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A destination key seen on more than one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub key: NaturalKey,
    /// Row the index resolves the key to (the last one listed)
    pub kept: RowId,
    /// Earlier row with the same key, left untouched by reconciliation
    pub shadowed: RowId,
}

/// Mapping from natural key to the row that currently holds it.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    rows: HashMap<NaturalKey, RowId>,
    duplicates: Vec<DuplicateKey>,
    unkeyed: Vec<RowId>,
}

impl KeyIndex {
    /// Index destination rows by `key_field`.
    ///
    /// Duplicate keys resolve last-write-wins; the shadowed rows are kept in
    /// [`duplicates`](Self::duplicates). Rows without a usable key are
    /// listed in [`unkeyed`](Self::unkeyed) and never planned.
    pub fn build(records: &[DestinationRecord], key_field: &str) -> Self {
        let mut index = Self::default();
        for record in records {
            let Some(key) = record.key(key_field) else {
                log::warn!(
                    "Row {} has no value for key field '{}'; leaving it untouched",
                    record.row_id,
                    key_field
                );
                index.unkeyed.push(record.row_id.clone());
                continue;
            };
            if let Some(previous) = index.rows.insert(key.clone(), record.row_id.clone()) {
                log::warn!(
                    "Duplicate key '{}' in destination (rows {} and {}); using row {}",
                    key,
                    previous,
                    record.row_id,
                    record.row_id
                );
                index.duplicates.push(DuplicateKey {
                    key,
                    kept: record.row_id.clone(),
                    shadowed: previous,
                });
            }
        }
        index
    }

    pub fn get(&self, key: &str) -> Option<&RowId> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &NaturalKey> {
        self.rows.keys()
    }

    pub fn duplicates(&self) -> &[DuplicateKey] {
        &self.duplicates
    }

    pub fn unkeyed(&self) -> &[RowId] {
        &self.unkeyed
    }
}

/// Category a key falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Create => write!(f, "create"),
            ActionKind::Update => write!(f, "update"),
            ActionKind::Delete => write!(f, "delete"),
        }
    }
}

/// A single planned write
#[derive(Debug, Clone, PartialEq)]
pub enum PlanAction {
    Create { record: OutputRecord },
    Update { record: OutputRecord, row_id: RowId },
    Delete { key: NaturalKey, row_id: RowId },
}

impl PlanAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PlanAction::Create { .. } => ActionKind::Create,
            PlanAction::Update { .. } => ActionKind::Update,
            PlanAction::Delete { .. } => ActionKind::Delete,
        }
    }

    pub fn key(&self) -> &NaturalKey {
        match self {
            PlanAction::Create { record } | PlanAction::Update { record, .. } => record.key(),
            PlanAction::Delete { key, .. } => key,
        }
    }

    /// Row targeted by an update or delete
    pub fn row_id(&self) -> Option<&RowId> {
        match self {
            PlanAction::Create { .. } => None,
            PlanAction::Update { row_id, .. } | PlanAction::Delete { row_id, .. } => Some(row_id),
        }
    }
}

/// Ordered list of writes that makes the sink mirror the fresh set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationPlan {
    actions: Vec<PlanAction>,
    fresh_duplicates: Vec<NaturalKey>,
}

impl ReconciliationPlan {
    /// Diff fresh records against the destination index.
    ///
    /// Fresh duplicates collapse last-write-wins. Creates and updates come
    /// first, ordered by display key (case-insensitive) then natural key;
    /// deletes follow in natural-key order.
    pub fn build(fresh: Vec<OutputRecord>, index: &KeyIndex) -> Self {
        let (mut records, fresh_duplicates) = dedupe_by_key(fresh);
        records.sort_by(|a, b| {
            a.display()
                .to_lowercase()
                .cmp(&b.display().to_lowercase())
                .then_with(|| a.key().cmp(b.key()))
        });

        let fresh_keys: HashSet<NaturalKey> = records.iter().map(|r| r.key().clone()).collect();

        let mut actions: Vec<PlanAction> = records
            .into_iter()
            .map(|record| match index.get(record.key().as_str()) {
                Some(row_id) => PlanAction::Update {
                    row_id: row_id.clone(),
                    record,
                },
                None => PlanAction::Create { record },
            })
            .collect();

        let mut stale: Vec<(&NaturalKey, &RowId)> = index
            .rows
            .iter()
            .filter(|(key, _)| !fresh_keys.contains(*key))
            .collect();
        stale.sort_by(|a, b| a.0.cmp(b.0));
        actions.extend(stale.into_iter().map(|(key, row_id)| PlanAction::Delete {
            key: key.clone(),
            row_id: row_id.clone(),
        }));

        Self {
            actions,
            fresh_duplicates,
        }
    }

    pub fn actions(&self) -> &[PlanAction] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<PlanAction> {
        self.actions
    }

    /// Fresh keys that appeared more than once (the later record won)
    pub fn fresh_duplicates(&self) -> &[NaturalKey] {
        &self.fresh_duplicates
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind() == kind).count()
    }

    /// Category of `key`, if it is in either set
    pub fn kind_of(&self, key: &str) -> Option<ActionKind> {
        self.actions
            .iter()
            .find(|a| a.key().as_str() == key)
            .map(PlanAction::kind)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Collapse records sharing a natural key, keeping the position of the first
/// occurrence and the content of the last.
fn dedupe_by_key(records: Vec<OutputRecord>) -> (Vec<OutputRecord>, Vec<NaturalKey>) {
    let mut positions: HashMap<NaturalKey, usize> = HashMap::new();
    let mut deduped: Vec<OutputRecord> = Vec::with_capacity(records.len());
    let mut duplicates = Vec::new();

    for record in records {
        match positions.get(record.key()) {
            Some(&pos) => {
                log::warn!(
                    "Duplicate key '{}' in fresh records; the later record wins",
                    record.key()
                );
                duplicates.push(record.key().clone());
                deduped[pos] = record;
            }
            None => {
                positions.insert(record.key().clone(), deduped.len());
                deduped.push(record);
            }
        }
    }

    (deduped, duplicates)
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
