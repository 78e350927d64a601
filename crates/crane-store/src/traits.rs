//! Store contracts
//!
//! The core only talks to these traits, so alternative backends can be
//! swapped in without touching the reconciler or the workers.

use std::time::Duration;

use crane_api::{Action, ActionRecord, ActionStatus, Host, HostHealth, HostState};

use crate::error::StoreResult;

/// Durable catalog of hosts
pub trait HostStore: Send + Sync {
    /// Insert a new host. Fails with `AlreadyExists` if the id is taken.
    fn create(&self, host: &Host) -> StoreResult<()>;

    /// Fetch a host. Fails with `NotFound` if absent.
    fn get_by_id(&self, id: &str) -> StoreResult<Host>;

    /// Atomically overwrite the state of an existing host.
    fn update_state(&self, id: &str, state: HostState) -> StoreResult<()>;

    /// Atomically overwrite the health of an existing host.
    fn update_health(&self, id: &str, health: HostHealth) -> StoreResult<()>;

    /// Full snapshot of every host, including terminated ones.
    fn list_hosts(&self) -> StoreResult<Vec<Host>>;
}

/// Durable queue of corrective actions
pub trait ActionStore: Send + Sync {
    /// Insert a new `pending` record and return its id.
    fn enqueue(&self, action: &Action) -> StoreResult<u64>;

    /// Claim the oldest pending record.
    ///
    /// Marks it `running` and increments `attempts` as one indivisible
    /// operation; no two callers ever receive the same record. Fails with
    /// `NotFound` when nothing is pending.
    fn next(&self) -> StoreResult<ActionRecord>;

    /// Transition a running record to `done`. No-op on terminal records.
    fn mark_done(&self, id: u64) -> StoreResult<()>;

    /// Transition a running record to `failed`. No-op on terminal records.
    /// Never re-queues.
    fn mark_failed(&self, id: u64) -> StoreResult<()>;

    /// Fetch a single record.
    fn get(&self, id: u64) -> StoreResult<ActionRecord>;

    /// List records in ascending id order, optionally filtered by status.
    fn list(&self, status: Option<ActionStatus>) -> StoreResult<Vec<ActionRecord>>;

    /// Mark `running` records not updated within `max_age` as `failed`.
    ///
    /// Returns the number of records recovered.
    fn recover_stale(&self, max_age: Duration) -> StoreResult<u32>;
}
