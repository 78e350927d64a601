//! Builders that turn configuration into running components

use std::sync::Arc;

use eyre::Result;
use tracing::{info, warn};

use crane_core::{CoreError, HostCatalog};
use crane_exec::{CommandExecutor, CommandExecutorConfig, DryRunExecutor, Executor};
use crane_store::{ActionQueueDb, ActionStore, HostCatalogDb, StoreError};

use crate::config::{HostSeed, StorageConfig};

/// Open both durable stores
///
/// Each database file has a single owner process. The reconciler and all
/// workers that share a queue must run inside that one daemon.
///
/// # Errors
/// Returns error if either database cannot be opened or created, or is
/// already held by another process
pub fn open_stores(storage: &StorageConfig) -> Result<(HostCatalogDb, ActionQueueDb)> {
    let hosts = HostCatalogDb::open(&storage.catalog_path)
        .map_err(|e| open_error("host catalog", e))?;
    info!(path = ?storage.catalog_path, "host catalog opened");

    let queue =
        ActionQueueDb::open(&storage.queue_path).map_err(|e| open_error("action queue", e))?;
    info!(path = ?storage.queue_path, "action queue opened");

    Ok((hosts, queue))
}

fn open_error(store: &str, err: StoreError) -> eyre::Report {
    match err {
        StoreError::Locked(path) => eyre::eyre!(
            "{store} {path} is already open in another process; \
             a store has one owner process, run the reconciler and workers in a single daemon"
        ),
        other => eyre::eyre!("open {store}: {other}"),
    }
}

/// Pick the executor for the configured hooks
///
/// Without any hook configured, actions are only logged.
pub fn create_executor(config: &CommandExecutorConfig) -> Arc<dyn Executor> {
    if config.has_commands() {
        info!(timeout_secs = config.timeout_secs, "using command executor");
        Arc::new(CommandExecutor::new(config.clone()))
    } else {
        warn!("no executor commands configured, actions will only be logged");
        Arc::new(DryRunExecutor::new())
    }
}

/// Register configured hosts that the catalog does not know yet
///
/// Returns the number of hosts added.
///
/// # Errors
/// Returns error on an invalid seed or a store failure
pub fn seed_hosts(catalog: &HostCatalog, seeds: &[HostSeed]) -> Result<usize> {
    let mut added = 0;
    for seed in seeds {
        let host = seed.to_host()?;
        match catalog.register(&host) {
            Ok(()) => added += 1,
            Err(CoreError::HostAlreadyExists(_)) => {
                tracing::debug!(host = %host.id, "host already in catalog");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(added)
}

/// Fail `running` actions left behind by a previous process
///
/// # Errors
/// Returns error on a store failure
pub fn recover_stale(queue: &dyn ActionStore, max_age: std::time::Duration) -> Result<u32> {
    let recovered = queue
        .recover_stale(max_age)
        .map_err(|e| eyre::eyre!("recover stale actions: {e}"))?;
    if recovered > 0 {
        warn!(recovered, "stale running actions marked failed");
    }
    Ok(recovered)
}
