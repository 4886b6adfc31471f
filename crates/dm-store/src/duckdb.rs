//! Local DuckDB table used as a list store

use crate::error::{StoreError, StoreResult};
use crate::traits::{ListStore, RowFields};
use async_trait::async_trait;
use dm_core::{DestinationRecord, RowId};
use duckdb::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Rows live in `{table}(row_id VARCHAR PRIMARY KEY, fields VARCHAR)`, the
/// second column holding the row's fields as a JSON object. Row ids are
/// random UUIDs.
pub struct DuckDbListStore {
    conn: Mutex<Connection>,
    table: String,
    location: String,
}

impl DuckDbListStore {
    /// Create a store over an in-memory database
    pub fn in_memory(table: &str) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, table, ":memory:".to_string())
    }

    /// Create a store over a database file, creating it if needed
    pub fn from_path(path: &Path, table: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn, table, path.display().to_string())
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str, table: &str) -> StoreResult<Self> {
        if path == ":memory:" {
            Self::in_memory(table)
        } else {
            Self::from_path(Path::new(path), table)
        }
    }

    fn init(conn: Connection, table: &str, location: String) -> StoreResult<Self> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (row_id VARCHAR PRIMARY KEY, fields VARCHAR NOT NULL)",
            table
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
            location,
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::MutexPoisoned(e.to_string()))
    }

    fn list_rows_sync(&self) -> StoreResult<Vec<DestinationRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT row_id, fields FROM {} ORDER BY row_id",
            self.table
        ))?;
        let raw: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;

        raw.into_iter()
            .map(|(id, fields)| {
                let row_id = RowId::try_new(&id)
                    .ok_or_else(|| StoreError::MalformedRow("blank row_id".to_string()))?;
                match serde_json::from_str::<Value>(&fields) {
                    Ok(Value::Object(map)) => Ok(DestinationRecord::new(row_id, map)),
                    _ => Err(StoreError::MalformedRow(format!(
                        "row {} does not hold a JSON object",
                        row_id
                    ))),
                }
            })
            .collect()
    }

    fn write_sync(&self, sql: &str, first: &str, second: &str) -> StoreResult<usize> {
        let conn = self.lock()?;
        Ok(conn.execute(sql, duckdb::params![first, second])?)
    }
}

fn encode(fields: &RowFields) -> String {
    Value::Object(fields.clone()).to_string()
}

#[async_trait]
impl ListStore for DuckDbListStore {
    async fn list_rows(&self) -> StoreResult<Vec<DestinationRecord>> {
        self.list_rows_sync()
    }

    async fn create_row(&self, fields: &RowFields) -> StoreResult<RowId> {
        let id = uuid::Uuid::new_v4().to_string();
        self.write_sync(
            &format!("INSERT INTO {} (row_id, fields) VALUES (?, ?)", self.table),
            &id,
            &encode(fields),
        )?;
        RowId::try_new(&id).ok_or_else(|| StoreError::MalformedRow("blank row_id".to_string()))
    }

    async fn update_row(&self, row_id: &RowId, fields: &RowFields) -> StoreResult<()> {
        let affected = self.write_sync(
            &format!("UPDATE {} SET fields = ? WHERE row_id = ?", self.table),
            &encode(fields),
            row_id.as_str(),
        )?;
        if affected == 0 {
            return Err(StoreError::RowNotFound(row_id.to_string()));
        }
        Ok(())
    }

    async fn delete_row(&self, row_id: &RowId) -> StoreResult<()> {
        let conn = self.lock()?;
        let affected = conn.execute(
            &format!("DELETE FROM {} WHERE row_id = ?", self.table),
            duckdb::params![row_id.as_str()],
        )?;
        if affected == 0 {
            return Err(StoreError::RowNotFound(row_id.to_string()));
        }
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "duckdb"
    }

    fn describe(&self) -> String {
        format!("table '{}' in {}", self.table, self.location)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
