//! Shared database plumbing.

use std::path::Path;

use redb::{Database, DatabaseError};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StoreError, StoreResult};

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| $crate::error::StoreError::$variant(e.to_string())
    };
}

pub(crate) use map_err;

/// Open or create a database file. redb locks the file, so only one
/// process can hold it at a time.
pub(crate) fn open_file(path: &Path) -> StoreResult<Database> {
    Database::create(path).map_err(|e| match e {
        DatabaseError::DatabaseAlreadyOpen => StoreError::Locked(path.display().to_string()),
        other => StoreError::Open(other.to_string()),
    })
}

pub(crate) fn open_memory() -> StoreResult<Database> {
    let backend = redb::backends::InMemoryBackend::new();
    Database::builder()
        .create_with_backend(backend)
        .map_err(map_err!(Open))
}

pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(map_err!(Serialize))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}
