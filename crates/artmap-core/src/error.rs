//! Error types for Artmap

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtmapError {
    // Backend errors
    #[error("Storage backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("Query '{operation}' failed: {reason}")]
    Query { operation: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ArtmapError {
    /// Build a `Query` error for a named store operation
    pub fn query(operation: &str, reason: impl ToString) -> Self {
        Self::Query {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for ArtmapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArtmapError>;
