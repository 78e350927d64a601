//! Executor that only logs

use async_trait::async_trait;
use tracing::info;

use crane_api::Action;

use crate::error::ExecError;
use crate::traits::Executor;

/// Logs every action and reports success without touching infrastructure
#[derive(Debug, Clone, Default)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for DryRunExecutor {
    async fn execute(&self, action: &Action) -> Result<(), ExecError> {
        info!(
            host = %action.host_id,
            action = %action.action_type,
            "dry run: action not executed"
        );
        Ok(())
    }

    fn executor_type(&self) -> &'static str {
        "dry-run"
    }
}
