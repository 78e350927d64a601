//! crane-api: Shared data model and API schemas
//!
//! Contains the host and action types persisted by the stores, plus the
//! request/response bodies used by the daemon's HTTP surface.

pub mod action;
pub mod error;
pub mod host;
pub mod requests;
pub mod responses;

pub use action::{Action, ActionRecord, ActionStatus, ActionType};
pub use error::ParseEnumError;
pub use host::{Host, HostHealth, HostState};
