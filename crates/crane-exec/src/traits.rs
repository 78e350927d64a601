//! Executor trait

use async_trait::async_trait;

use crane_api::Action;

use crate::error::ExecError;

/// Performs a corrective action against real infrastructure.
///
/// Implementations must be idempotent per `(host_id, action_type)`: the
/// reconciler may enqueue the same decision again before an earlier one has
/// completed. Provider-specific retries belong inside the implementation.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, action: &Action) -> Result<(), ExecError>;

    /// Short name used in logs
    fn executor_type(&self) -> &'static str;
}
