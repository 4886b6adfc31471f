//! Error types for dm-sync

use dm_core::CoreError;
use dm_graph::GraphError;
use dm_store::StoreError;
use thiserror::Error;

/// Pipeline errors. Every variant aborts the run; per-entity and per-row
/// failures are recorded in the output instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Y001: The bulk source fetch failed
    #[error("[Y001] Failed to fetch {collection}: {source}")]
    Fetch {
        collection: String,
        #[source]
        source: GraphError,
    },

    /// Y002: The destination store could not be listed or resolved
    #[error("[Y002] Destination store error: {0}")]
    Store(#[from] StoreError),

    /// Y003: Sink field mapping does not produce the key column
    #[error("[Y003] Invalid sink mapping: {0}")]
    Mapping(String),

    /// Y004: Export file could not be written
    #[error("[Y004] Failed to write '{path}': {source}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Y005: CSV encoding error
    #[error("[Y005] CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Y006: Output stream error
    #[error("[Y006] Write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Core error (config, filter, entity shape)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for SyncError
pub type SyncResult<T> = Result<T, SyncError>;
