//! `HostCatalog`: guarded access to the host catalog store
//!
//! State changes go through the state machine; health changes are
//! unconstrained. Every call re-reads the store, nothing is cached.

use std::sync::Arc;

use tracing::{debug, info};

use crane_api::{Host, HostHealth, HostState};
use crane_store::{HostStore, StoreError};

use crate::error::CoreError;
use crate::state::can_transition;

/// Host catalog service
#[derive(Clone)]
pub struct HostCatalog {
    store: Arc<dyn HostStore>,
}

impl HostCatalog {
    /// Create a catalog service over the given store
    pub fn new(store: Arc<dyn HostStore>) -> Self {
        Self { store }
    }

    /// Add a newly provisioned host
    ///
    /// # Errors
    /// `HostAlreadyExists` if the id is taken, `Storage` on store failure.
    pub fn register(&self, host: &Host) -> Result<(), CoreError> {
        self.store.create(host).map_err(|e| host_error(&host.id, e))?;
        info!(host = %host.id, state = %host.state, health = %host.health, "host registered");
        Ok(())
    }

    /// Fetch a host
    ///
    /// # Errors
    /// `HostNotFound` if absent, `Storage` on store failure.
    pub fn get(&self, id: &str) -> Result<Host, CoreError> {
        self.store.get_by_id(id).map_err(|e| host_error(id, e))
    }

    /// List every host
    ///
    /// # Errors
    /// `Storage` on store failure.
    pub fn list(&self) -> Result<Vec<Host>, CoreError> {
        Ok(self.store.list_hosts()?)
    }

    /// Move a host to `requested` if the state machine allows it
    ///
    /// The check and the write are not one atomic step: a concurrent
    /// transition of the same host may interleave between them. The write
    /// itself is atomic.
    ///
    /// # Errors
    /// `HostNotFound`, `InvalidTransition`, or `Storage`.
    pub fn transition_state(&self, id: &str, requested: HostState) -> Result<(), CoreError> {
        let host = self.get(id)?;

        if !can_transition(host.state, requested) {
            debug!(host = %id, from = %host.state, to = %requested, "transition rejected");
            return Err(CoreError::InvalidTransition {
                from: host.state,
                to: requested,
            });
        }

        self.store
            .update_state(id, requested)
            .map_err(|e| host_error(id, e))?;

        info!(host = %id, from = %host.state, to = %requested, "state transition");
        Ok(())
    }

    /// Overwrite a host's health, whatever its current state
    ///
    /// # Errors
    /// `HostNotFound` or `Storage`.
    pub fn transition_health(&self, id: &str, health: HostHealth) -> Result<(), CoreError> {
        self.store
            .update_health(id, health)
            .map_err(|e| host_error(id, e))?;

        info!(host = %id, %health, "health updated");
        Ok(())
    }
}

fn host_error(id: &str, err: StoreError) -> CoreError {
    match err {
        StoreError::NotFound(_) => CoreError::HostNotFound(id.to_string()),
        StoreError::AlreadyExists(_) => CoreError::HostAlreadyExists(id.to_string()),
        other => other.into(),
    }
}
