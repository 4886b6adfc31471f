//! List-store trait definition

use crate::error::StoreResult;
use async_trait::async_trait;
use dm_core::{DestinationRecord, RowId};
use serde_json::{Map, Value};

/// Column values for one row
pub type RowFields = Map<String, Value>;

/// Destination list abstraction
///
/// Implementations must be Send + Sync for async operation. Rows are
/// identified by a store-assigned `RowId`, never by their natural key.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Every row with its field values
    async fn list_rows(&self) -> StoreResult<Vec<DestinationRecord>>;

    /// Insert a row, returning the id the store assigned
    async fn create_row(&self, fields: &RowFields) -> StoreResult<RowId>;

    /// Overwrite a row's fields
    async fn update_row(&self, row_id: &RowId, fields: &RowFields) -> StoreResult<()>;

    async fn delete_row(&self, row_id: &RowId) -> StoreResult<()>;

    /// Store type identifier for logging
    fn store_type(&self) -> &'static str;

    /// Human-readable location of the store
    fn describe(&self) -> String;
}
