//! Reconciler: turns the host catalog into queued actions
//!
//! A pass lists every host, runs the decision policy on each one and
//! enqueues whatever it decides. It never talks to the workers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crane_api::Action;
use crane_store::{ActionStore, HostStore};

use crate::decision::decide;
use crate::error::CoreError;

/// Summary of one reconcile pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Hosts in the catalog snapshot
    pub hosts_seen: usize,
    /// Actions enqueued during the pass
    pub enqueued: usize,
}

/// A single reconcile pass
#[async_trait]
pub trait HostReconciler: Send + Sync {
    /// Run one pass over the whole catalog.
    ///
    /// Aborts on the first listing or enqueue failure; actions enqueued
    /// earlier in the pass stay queued.
    async fn reconcile(&self) -> Result<ReconcileReport, CoreError>;
}

/// Reconciler over a host store and an action store
pub struct DefaultReconciler {
    hosts: Arc<dyn HostStore>,
    queue: Arc<dyn ActionStore>,
}

impl DefaultReconciler {
    pub fn new(hosts: Arc<dyn HostStore>, queue: Arc<dyn ActionStore>) -> Self {
        Self { hosts, queue }
    }
}

#[async_trait]
impl HostReconciler for DefaultReconciler {
    async fn reconcile(&self) -> Result<ReconcileReport, CoreError> {
        let hosts = self.hosts.list_hosts()?;
        let mut report = ReconcileReport {
            hosts_seen: hosts.len(),
            enqueued: 0,
        };

        for host in &hosts {
            let decision = decide(host);
            let Some(action_type) = decision.action_type() else {
                continue;
            };

            let id = self
                .queue
                .enqueue(&Action::new(host.id.clone(), action_type))?;
            debug!(
                host = %host.id,
                state = %host.state,
                health = %host.health,
                action = %action_type,
                action_id = id,
                "action enqueued"
            );
            report.enqueued += 1;
        }

        Ok(report)
    }
}

/// Drives a reconciler on a fixed interval until shutdown
pub struct ReconcileRunner {
    reconciler: Arc<dyn HostReconciler>,
    interval: Duration,
}

impl ReconcileRunner {
    pub fn new(reconciler: Arc<dyn HostReconciler>, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
        }
    }

    /// Tick until `shutdown` flips. The first pass runs immediately.
    ///
    /// Shutdown is only observed between passes, never in the middle of one.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "reconciler started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    match self.reconciler.reconcile().await {
                        Ok(report) => info!(
                            hosts = report.hosts_seen,
                            enqueued = report.enqueued,
                            "reconcile pass complete"
                        ),
                        Err(e) => error!(error = %e, "reconcile pass failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("reconciler shutting down");
    }
}
