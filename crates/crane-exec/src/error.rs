//! Error types for crane-exec

use std::time::Duration;

use thiserror::Error;

use crane_api::ActionType;

/// Errors that can occur while executing an action
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// No hook is configured for this action type
    #[error("no command configured for {0}")]
    NotConfigured(ActionType),

    /// Hook exited with a non-zero status
    #[error("command execution failed: {status} - {stderr}")]
    CommandFailed {
        /// Exit status code
        status: i32,
        /// Stderr output
        stderr: String,
    },

    /// Hook timed out
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    Spawn(String),

    /// I/O error during execution
    #[error("I/O error: {0}")]
    Io(String),
}

impl ExecError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecError::Spawn(_) | ExecError::Timeout { .. })
    }
}
