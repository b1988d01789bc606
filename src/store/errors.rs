//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    // Reachability
    #[error("Connection failed: {0}")]
    Connection(String),

    // Structure
    #[error("Validation conflict on '{collection}': {message}")]
    ValidationConflict { collection: String, message: String },

    #[error("Collection not found: {0}")]
    NamespaceNotFound(String),

    #[error("Collection already exists: {0}")]
    NamespaceExists(String),

    // Writes
    #[error("Document rejected by '{collection}' validator: {reason}")]
    DocumentValidation { collection: String, reason: String },

    #[error("Duplicate key in '{collection}' for index '{index}'")]
    DuplicateKey { collection: String, index: String },

    #[error("Transient storage failure: {0}")]
    Transient(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Connection(_) => "TRIAGE_CONNECTION_ERROR",
            StoreError::ValidationConflict { .. } => "TRIAGE_VALIDATION_CONFLICT",
            StoreError::Transient(_) => "TRIAGE_TRANSIENT_STORAGE",
            StoreError::DocumentValidation { .. }
            | StoreError::DuplicateKey { .. }
            | StoreError::NamespaceNotFound(_)
            | StoreError::NamespaceExists(_)
            | StoreError::Encoding(_)
            | StoreError::Storage(_) => "TRIAGE_STORAGE_ERROR",
        }
    }

    /// Whether a fresh invocation may succeed without manual intervention
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Transient(_))
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(e: bson::ser::Error) -> Self {
        StoreError::Encoding(e.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(e: bson::de::Error) -> Self {
        StoreError::Encoding(e.to_string())
    }
}
