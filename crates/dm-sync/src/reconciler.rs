//! Mirror fresh records into a list store

use crate::error::{SyncError, SyncResult};
use crate::progress::ProgressSink;
use dm_core::{
    ActionKind, DuplicateKey, KeyIndex, NaturalKey, OutputRecord, PlanAction, ReconciliationPlan,
    RowId, SinkConfig,
};
use dm_store::{ListStore, RowFields};
use serde::Serialize;
use std::collections::HashMap;

/// How output fields land in store columns
#[derive(Debug, Clone)]
pub struct SinkMapping {
    key_column: String,
    columns: HashMap<String, String>,
}

impl SinkMapping {
    /// Identity mapping keyed on `key_field`
    pub fn identity(key_field: &str) -> Self {
        Self {
            key_column: key_field.to_string(),
            columns: HashMap::new(),
        }
    }

    /// Mapping from a sink definition.
    ///
    /// The key column defaults to the column the pipeline's key field maps
    /// to, and must be one of the columns the records produce.
    pub fn from_config(sink: &SinkConfig, fields: &[&str], key_field: &str) -> SyncResult<Self> {
        let key_column = sink
            .key_field
            .clone()
            .unwrap_or_else(|| sink.column_for(key_field).to_string());

        if !fields.iter().any(|f| sink.column_for(f) == key_column) {
            return Err(SyncError::Mapping(format!(
                "key column '{}' is not written by any field ({})",
                key_column,
                fields.join(", ")
            )));
        }

        Ok(Self {
            key_column,
            columns: sink.field_map.clone(),
        })
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn column<'a>(&'a self, field: &'a str) -> &'a str {
        self.columns.get(field).map(|s| s.as_str()).unwrap_or(field)
    }

    /// Every field of the record under its column name
    pub fn row_fields(&self, record: &OutputRecord) -> RowFields {
        record
            .fields()
            .iter()
            .map(|(name, value)| (self.column(name).to_string(), value.to_json()))
            .collect()
    }

    /// Re-key a record by its column-mapped key.
    fn stored_key(&self, record: &OutputRecord) -> Option<NaturalKey> {
        let row = self.row_fields(record);
        row.get(&self.key_column).and_then(dm_core::entity::value_as_key)
    }
}

/// A write that failed
#[derive(Debug, Clone, Serialize)]
pub struct ApplyFailure {
    pub key: NaturalKey,
    pub action: ActionKind,
    pub message: String,
}

/// Plan plus what the destination index reported
#[derive(Debug, Clone)]
pub struct PlannedSync {
    pub plan: ReconciliationPlan,
    pub duplicates: Vec<DuplicateKey>,
    pub unkeyed: Vec<RowId>,
    pub destination_rows: usize,
}

/// Counts of a reconcile run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<ApplyFailure>,
    pub duplicate_keys: usize,
    pub unkeyed_rows: usize,
}

impl ReconcileSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Diffs fresh records against a list store and applies the difference
pub struct Reconciler<'a> {
    store: &'a dyn ListStore,
    mapping: SinkMapping,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn ListStore, mapping: SinkMapping) -> Self {
        Self { store, mapping }
    }

    /// Build the plan without writing anything.
    ///
    /// Failure to list the destination is fatal.
    pub async fn plan(&self, fresh: Vec<OutputRecord>) -> SyncResult<PlannedSync> {
        let rows = self.store.list_rows().await?;
        let index = KeyIndex::build(&rows, self.mapping.key_column());
        log::info!(
            "{}: {} row(s), {} keyed",
            self.store.describe(),
            rows.len(),
            index.len()
        );

        let fresh = fresh
            .into_iter()
            .filter_map(|record| self.rekey(record))
            .collect();

        Ok(PlannedSync {
            plan: ReconciliationPlan::build(fresh, &index),
            duplicates: index.duplicates().to_vec(),
            unkeyed: index.unkeyed().to_vec(),
            destination_rows: rows.len(),
        })
    }

    /// Plan and apply; only a failure to list the destination is an error.
    pub async fn reconcile(
        &self,
        fresh: Vec<OutputRecord>,
        progress: &dyn ProgressSink,
    ) -> SyncResult<ReconcileSummary> {
        let planned = self.plan(fresh).await?;
        let mut summary = self.apply(planned.plan, progress).await;
        summary.duplicate_keys = planned.duplicates.len();
        summary.unkeyed_rows = planned.unkeyed.len();
        Ok(summary)
    }

    /// Apply every action in order. Failed writes are recorded and skipped.
    pub async fn apply(
        &self,
        plan: ReconciliationPlan,
        progress: &dyn ProgressSink,
    ) -> ReconcileSummary {
        let actions = plan.into_actions();
        progress.start(actions.len(), "sync");
        let mut summary = ReconcileSummary::default();

        for action in actions {
            let kind = action.kind();
            let key = action.key().clone();
            let result = match &action {
                PlanAction::Create { record } => self
                    .store
                    .create_row(&self.mapping.row_fields(record))
                    .await
                    .map(|_| ()),
                PlanAction::Update { record, row_id } => {
                    self.store
                        .update_row(row_id, &self.mapping.row_fields(record))
                        .await
                }
                PlanAction::Delete { row_id, .. } => self.store.delete_row(row_id).await,
            };

            match result {
                Ok(()) => {
                    log::debug!("{} {}", kind, key);
                    match kind {
                        ActionKind::Create => summary.created += 1,
                        ActionKind::Update => summary.updated += 1,
                        ActionKind::Delete => summary.deleted += 1,
                    }
                }
                Err(e) => {
                    log::warn!("Failed to {} '{}': {}", kind, key, e);
                    summary.failures.push(ApplyFailure {
                        key: key.clone(),
                        action: kind,
                        message: e.to_string(),
                    });
                }
            }
            progress.advance(key.as_str());
        }

        progress.finish();
        summary
    }

    /// The store compares keys as written to the key column, so plan on that.
    fn rekey(&self, record: OutputRecord) -> Option<OutputRecord> {
        let Some(key) = self.mapping.stored_key(&record) else {
            log::warn!(
                "Record '{}' has no value for key column '{}'; not synced",
                record.display(),
                self.mapping.key_column()
            );
            return None;
        };
        if &key == record.key() {
            return Some(record);
        }
        let mut rekeyed = OutputRecord::new(key, record.display());
        for (name, value) in record.fields() {
            rekeyed.set(name.clone(), value.clone());
        }
        Some(rekeyed)
    }
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
