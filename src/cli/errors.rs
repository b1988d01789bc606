//! CLI-specific error types
//!
//! Every error reaching the CLI is fatal for the invocation: it is printed as
//! `CODE: message` on stderr and the process exits non-zero.

use std::fmt;

use crate::applier::ReconcileError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Required connection settings missing or invalid
    ConfigError,
    /// Storage unreachable or authentication refused
    ConnectionError,
    /// Existing validator or index cannot be reconciled in place
    ValidationConflict,
    /// Lock contention or a transient network failure
    TransientStorage,
    /// Any other storage failure
    StorageError,
    /// Declared schema or index catalog is inconsistent
    SchemaError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "TRIAGE_CONFIG_ERROR",
            Self::ConnectionError => "TRIAGE_CONNECTION_ERROR",
            Self::ValidationConflict => "TRIAGE_VALIDATION_CONFLICT",
            Self::TransientStorage => "TRIAGE_TRANSIENT_STORAGE",
            Self::StorageError => "TRIAGE_STORAGE_ERROR",
            Self::SchemaError => "TRIAGE_SCHEMA_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether a fresh invocation may succeed without intervention
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            CliErrorCode::ConnectionError | CliErrorCode::TransientStorage
        )
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        let code = match &e {
            StoreError::Connection(_) => CliErrorCode::ConnectionError,
            StoreError::ValidationConflict { .. } => CliErrorCode::ValidationConflict,
            StoreError::Transient(_) => CliErrorCode::TransientStorage,
            _ => CliErrorCode::StorageError,
        };
        Self::new(code, e.to_string())
    }
}

impl From<ReconcileError> for CliError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::Store(inner) => inner.into(),
            ReconcileError::Schema(inner) => Self::new(CliErrorCode::SchemaError, inner.to_string()),
            ReconcileError::Index(inner) => Self::new(CliErrorCode::SchemaError, inner.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
