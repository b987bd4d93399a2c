use thiserror::Error;

/// Unified error type for key-value store operations that application code can handle
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record not found under the given key
    #[error("Record not found")]
    NotFound,

    /// A record already exists under a key that must be unique
    #[error("Record already exists under key {key}")]
    UniqueViolation { key: String },

    /// A stored value could not be serialized or deserialized
    #[error("Failed to {operation} record under key {key}")]
    Serialization {
        key: String,
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type alias for store operation results
pub type Result<T> = std::result::Result<T, StoreError>;
