//! Error types for dm-store

use dm_graph::GraphError;
use thiserror::Error;

/// List-store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// S001: The configured site or list does not exist
    #[error("[S001] Destination not found: {0}")]
    DestinationNotFound(String),

    /// S002: Remote list call failed
    #[error("[S002] List request failed: {0}")]
    Remote(#[from] GraphError),

    /// S003: Local database error
    #[error("[S003] Database error: {0}")]
    Database(String),

    /// S004: Row does not exist
    #[error("[S004] Row not found: {0}")]
    RowNotFound(String),

    /// S005: A row came back in a shape the store cannot use
    #[error("[S005] Malformed row: {0}")]
    MalformedRow(String),

    /// S006: Mutex poisoned
    #[error("[S006] Store mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for StoreError
pub type StoreResult<T> = Result<T, StoreError>;

impl From<duckdb::Error> for StoreError {
    fn from(err: duckdb::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}
