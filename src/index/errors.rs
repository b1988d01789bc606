//! Index error types
//!
//! Error codes:
//! - TRIAGE_INDEX_INVALID_SPEC (FATAL)
//! - TRIAGE_INDEX_CATALOG_CONFLICT (FATAL)

use std::fmt;

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// A single index definition cannot be created
    InvalidSpec,
    /// Definitions in one collection's catalog contradict each other
    CatalogConflict,
}

impl IndexErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::InvalidSpec => "TRIAGE_INDEX_INVALID_SPEC",
            IndexErrorCode::CatalogConflict => "TRIAGE_INDEX_CATALOG_CONFLICT",
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug, Clone)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    index: Option<String>,
}

impl IndexError {
    /// Create an invalid spec error
    pub fn invalid_spec(index: impl Into<String>, reason: impl Into<String>) -> Self {
        let index = index.into();
        Self {
            code: IndexErrorCode::InvalidSpec,
            message: format!("Index '{}' is invalid: {}", index, reason.into()),
            index: Some(index),
        }
    }

    /// Create a catalog conflict error
    pub fn catalog_conflict(collection: &str, reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::CatalogConflict,
            message: format!("Index catalog for '{}' is inconsistent: {}", collection, reason.into()),
            index: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the index name if applicable
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
