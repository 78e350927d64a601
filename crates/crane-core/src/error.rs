//! Core error types for crane-core

use thiserror::Error;

use crane_api::{HostState, ParseEnumError};
use crane_exec::ExecError;
use crane_store::StoreError;

/// Errors that can occur in core fleet operations
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Host not found in the catalog
    #[error("host not found: {0}")]
    HostNotFound(String),

    /// Host already exists in the catalog
    #[error("host already exists: {0}")]
    HostAlreadyExists(String),

    /// Invalid state transition attempted
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: HostState,
        /// Attempted target state
        to: HostState,
    },

    /// Value outside one of the closed enums
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The durable store failed
    #[error("storage error: {0}")]
    Storage(String),

    /// The executor failed to carry out an action
    #[error("execution failed: {0}")]
    Execution(String),
}

impl CoreError {
    /// Whether the caller supplied something illegal (a client error)
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidTransition { .. } | CoreError::InvalidValue(_)
        )
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => CoreError::HostNotFound(what),
            StoreError::AlreadyExists(what) => CoreError::HostAlreadyExists(what),
            other => CoreError::Storage(other.to_string()),
        }
    }
}

impl From<ParseEnumError> for CoreError {
    fn from(err: ParseEnumError) -> Self {
        CoreError::InvalidValue(err.to_string())
    }
}

impl From<ExecError> for CoreError {
    fn from(err: ExecError) -> Self {
        CoreError::Execution(err.to_string())
    }
}
