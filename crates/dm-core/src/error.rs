//! Error types for dm-core

use thiserror::Error;

/// Core error type for dirmirror
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Filter expression could not be parsed
    #[error("[C003] Invalid filter '{expression}': {reason}")]
    InvalidFilter { expression: String, reason: String },

    /// C004: Entity payload is not usable as a source entity
    #[error("[C004] Malformed entity: {reason}")]
    MalformedEntity { reason: String },

    /// C005: Entity has no value for its natural key field
    #[error("[C005] Entity '{id}' has no value for natural key field '{field}'")]
    MissingNaturalKey { id: String, field: String },

    /// C006: IO error with file path context
    #[error("[C006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C007: YAML parse error
    #[error("[C007] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
