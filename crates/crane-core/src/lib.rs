//! crane-core: Fleet lifecycle logic
//!
//! Implements the host state machine, the catalog service that guards
//! state/health transitions, the decision policy, the reconciler that turns
//! the catalog into queued actions, and the worker that drains the queue.
//!
//! The reconciler and the workers never talk to each other: the host
//! catalog and the action queue are the only synchronization points.

pub mod catalog;
pub mod config;
pub mod decision;
pub mod error;
pub mod reconciler;
pub mod state;
pub mod worker;

pub use catalog::HostCatalog;
pub use config::{ReconcilerConfig, WorkerConfig};
pub use decision::{Decision, decide};
pub use error::CoreError;
pub use reconciler::{DefaultReconciler, HostReconciler, ReconcileReport, ReconcileRunner};
pub use state::{can_transition, valid_next_states};
pub use worker::{WorkOutcome, Worker};
