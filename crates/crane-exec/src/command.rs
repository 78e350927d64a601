//! Shell-hook executor using `tokio::process`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

use crane_api::{Action, ActionType};

use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::Executor;

/// Environment variable carrying the target host id
pub const HOST_ID_ENV: &str = "CRANE_HOST_ID";
/// Environment variable carrying the action type (`drain_host`, `replace_host`)
pub const ACTION_ENV: &str = "CRANE_ACTION";

/// Hook commands for each action type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandExecutorConfig {
    /// Shell command run for `drain` actions
    pub drain_command: Option<String>,
    /// Shell command run for `replace` actions
    pub replace_command: Option<String>,
    /// Upper bound on a single hook run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for CommandExecutorConfig {
    fn default() -> Self {
        Self {
            drain_command: None,
            replace_command: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CommandExecutorConfig {
    /// Whether any hook is configured
    #[must_use]
    pub fn has_commands(&self) -> bool {
        self.drain_command.is_some() || self.replace_command.is_some()
    }

    /// Hook timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Executor that delegates each action to an operator-provided shell hook
///
/// The hook receives the host id and action type through `CRANE_HOST_ID`
/// and `CRANE_ACTION`. A zero exit status means the action completed.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    config: CommandExecutorConfig,
}

impl CommandExecutor {
    /// Create a new hook executor
    #[must_use]
    pub fn new(config: CommandExecutorConfig) -> Self {
        Self { config }
    }

    fn command_for(&self, action_type: ActionType) -> Option<&str> {
        match action_type {
            ActionType::Drain => self.config.drain_command.as_deref(),
            ActionType::Replace => self.config.replace_command.as_deref(),
        }
    }

    /// Run one hook to completion
    #[instrument(skip(self), level = "debug")]
    async fn run(&self, cmd: &str, action: &Action) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        let child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .env(HOST_ID_ENV, &action.host_id)
            .env(ACTION_ENV, action.action_type.as_str())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::Spawn(e.to_string()))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::Io(e.to_string()))?;

        let result = CommandResult {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        };

        debug!(
            command = %cmd,
            status = result.status,
            duration = ?result.duration,
            "hook completed"
        );

        Ok(result)
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    async fn execute(&self, action: &Action) -> Result<(), ExecError> {
        let cmd = self
            .command_for(action.action_type)
            .ok_or(ExecError::NotConfigured(action.action_type))?;
        let limit = self.config.timeout();

        let result = match timeout(limit, self.run(cmd, action)).await {
            Ok(result) => result?,
            Err(_) => {
                error!(
                    host = %action.host_id,
                    action = %action.action_type,
                    timeout = ?limit,
                    "hook timed out"
                );
                return Err(ExecError::Timeout { timeout: limit });
            }
        };

        if !result.success() {
            error!(
                host = %action.host_id,
                action = %action.action_type,
                status = result.status,
                stderr = %result.stderr.trim(),
                "hook failed"
            );
            return Err(ExecError::CommandFailed {
                status: result.status,
                stderr: result.stderr,
            });
        }

        info!(
            host = %action.host_id,
            action = %action.action_type,
            duration = ?result.duration,
            stdout = %result.stdout.trim(),
            "hook succeeded"
        );
        Ok(())
    }

    fn executor_type(&self) -> &'static str {
        "command"
    }
}
