//! Application state shared across HTTP handlers

use std::sync::Arc;

use crane_core::HostCatalog;
use crane_store::ActionStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Guarded access to the host catalog
    pub catalog: HostCatalog,
    /// Action queue, read-only from HTTP
    pub queue: Arc<dyn ActionStore>,
}

impl AppState {
    /// Create new application state
    pub fn new(catalog: HostCatalog, queue: Arc<dyn ActionStore>) -> Self {
        Self { catalog, queue }
    }
}
