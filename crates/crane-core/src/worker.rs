//! Worker: claims queued actions and hands them to an executor
//!
//! Any number of workers may poll the same queue; the store's claim is the
//! only coordination between them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, trace, warn};

use crane_exec::Executor;
use crane_store::{ActionStore, StoreError};

use crate::config::WorkerConfig;
use crate::error::CoreError;

/// What a single `run_once` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    /// Queue was empty
    Idle,
    /// Action executed and marked done
    Done(u64),
    /// Executor failed, action marked failed
    Failed(u64),
}

impl fmt::Display for WorkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkOutcome::Idle => write!(f, "idle"),
            WorkOutcome::Done(id) => write!(f, "done({id})"),
            WorkOutcome::Failed(id) => write!(f, "failed({id})"),
        }
    }
}

/// Queue consumer
pub struct Worker {
    name: String,
    queue: Arc<dyn ActionStore>,
    executor: Arc<dyn Executor>,
}

impl Worker {
    pub fn new(
        name: impl Into<String>,
        queue: Arc<dyn ActionStore>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            name: name.into(),
            queue,
            executor,
        }
    }

    /// Claim at most one action and carry it out.
    ///
    /// An empty queue is `Ok(Idle)`. Executor failures are recorded with
    /// `mark_failed` and reported as `Ok(Failed(id))`; only store faults
    /// surface as errors. Never retries.
    ///
    /// # Errors
    /// `CoreError::Storage` if the queue cannot be read or updated.
    pub async fn run_once(&self) -> Result<WorkOutcome, CoreError> {
        let record = match self.queue.next() {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                trace!(worker = %self.name, "queue empty");
                return Ok(WorkOutcome::Idle);
            }
            Err(e) => return Err(storage(e)),
        };

        let action = record.action();
        info!(
            worker = %self.name,
            action_id = record.id,
            host = %action.host_id,
            action = %action.action_type,
            attempts = record.attempts,
            executor = self.executor.executor_type(),
            "action claimed"
        );

        match self.executor.execute(&action).await {
            Ok(()) => {
                self.queue.mark_done(record.id).map_err(storage)?;
                info!(worker = %self.name, action_id = record.id, host = %action.host_id, "action done");
                Ok(WorkOutcome::Done(record.id))
            }
            Err(e) => {
                let retryable = e.is_retryable();
                let err = CoreError::from(e);
                warn!(
                    worker = %self.name,
                    action_id = record.id,
                    host = %action.host_id,
                    attempts = record.attempts,
                    retryable,
                    error = %err,
                    "action failed"
                );
                self.queue.mark_failed(record.id).map_err(storage)?;
                Ok(WorkOutcome::Failed(record.id))
            }
        }
    }

    /// Poll until `shutdown` flips.
    ///
    /// Re-polls immediately after handling an action. While the queue is
    /// empty, or the store is failing, the delay doubles from
    /// `poll_interval` up to `max_poll_interval`.
    pub async fn run(&self, config: &WorkerConfig, mut shutdown: watch::Receiver<bool>) {
        info!(worker = %self.name, "worker started");

        let base = config.poll_interval();
        let max = config.max_poll_interval();
        let mut delay = base;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = match self.run_once().await {
                Ok(WorkOutcome::Idle) => Some(delay),
                Ok(WorkOutcome::Done(_) | WorkOutcome::Failed(_)) => None,
                Err(e) => {
                    error!(worker = %self.name, error = %e, "queue poll failed");
                    Some(delay)
                }
            };

            let Some(wait) = wait else {
                delay = base;
                continue;
            };
            delay = next_delay(delay, max);

            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(worker = %self.name, "worker shutting down");
    }
}

fn next_delay(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

fn storage(err: StoreError) -> CoreError {
    CoreError::Storage(err.to_string())
}
