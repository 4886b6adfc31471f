//! In-memory list store for tests

use crate::error::{StoreError, StoreResult};
use crate::traits::{ListStore, RowFields};
use async_trait::async_trait;
use dm_core::{DestinationRecord, RowId};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// List store held in a map, with write failures injectable per key value.
#[derive(Default)]
pub struct InMemoryListStore {
    rows: Mutex<BTreeMap<RowId, RowFields>>,
    next_id: AtomicU64,
    key_field: String,
    failing_keys: HashSet<String>,
    fail_listing: bool,
}

impl InMemoryListStore {
    /// `key_field` is only used to match injected failures
    pub fn new(key_field: &str) -> Self {
        Self {
            key_field: key_field.to_string(),
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    /// Seed a row with a fixed id
    pub fn with_row(self, row_id: &str, fields: RowFields) -> Self {
        if let (Some(id), Ok(mut rows)) = (RowId::try_new(row_id), self.rows.lock()) {
            rows.insert(id, fields);
        }
        self
    }

    /// Fail every create, update or delete touching a row with this key value
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Current rows ordered by row id
    pub fn snapshot(&self) -> Vec<(RowId, RowFields)> {
        self.rows
            .lock()
            .map(|rows| rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn check(&self, fields: &RowFields) -> StoreResult<()> {
        let key = fields.get(&self.key_field).and_then(Value::as_str);
        match key {
            Some(k) if self.failing_keys.contains(k) => Err(StoreError::Database(format!(
                "injected failure for '{}'",
                k
            ))),
            _ => Ok(()),
        }
    }

    fn rows(&self) -> StoreResult<std::sync::MutexGuard<'_, BTreeMap<RowId, RowFields>>> {
        self.rows
            .lock()
            .map_err(|e| StoreError::MutexPoisoned(e.to_string()))
    }
}

#[async_trait]
impl ListStore for InMemoryListStore {
    async fn list_rows(&self) -> StoreResult<Vec<DestinationRecord>> {
        if self.fail_listing {
            return Err(StoreError::Database("injected listing failure".to_string()));
        }
        Ok(self
            .rows()?
            .iter()
            .map(|(id, fields)| DestinationRecord::new(id.clone(), fields.clone()))
            .collect())
    }

    async fn create_row(&self, fields: &RowFields) -> StoreResult<RowId> {
        self.check(fields)?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = RowId::try_new(format!("row-{}", n))
            .ok_or_else(|| StoreError::MalformedRow("blank row id".to_string()))?;
        self.rows()?.insert(id.clone(), fields.clone());
        Ok(id)
    }

    async fn update_row(&self, row_id: &RowId, fields: &RowFields) -> StoreResult<()> {
        self.check(fields)?;
        let mut rows = self.rows()?;
        match rows.get_mut(row_id) {
            Some(existing) => {
                *existing = fields.clone();
                Ok(())
            }
            None => Err(StoreError::RowNotFound(row_id.to_string())),
        }
    }

    async fn delete_row(&self, row_id: &RowId) -> StoreResult<()> {
        let mut rows = self.rows()?;
        let existing = rows
            .get(row_id)
            .ok_or_else(|| StoreError::RowNotFound(row_id.to_string()))?;
        self.check(existing)?;
        rows.remove(row_id);
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }

    fn describe(&self) -> String {
        "in-memory list".to_string()
    }
}
