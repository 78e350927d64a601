//! crane-store: Durable host catalog and action queue
//!
//! Both stores are backed by [redb](https://docs.rs/redb). Every mutating
//! operation runs inside exactly one write transaction; redb serializes
//! write transactions, so a read-modify-write such as claiming the next
//! pending action is indivisible for every caller sharing the database.
//!
//! Values are JSON-encoded into `&[u8]` columns. The stores are `Clone`
//! (backed by `Arc<Database>`) and can be shared across tasks and threads.

mod db;
pub mod error;
pub mod host;
pub mod queue;
pub mod tables;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use host::HostCatalogDb;
pub use queue::ActionQueueDb;
pub use traits::{ActionStore, HostStore};
