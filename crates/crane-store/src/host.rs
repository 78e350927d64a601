//! `HostCatalogDb`: redb-backed host catalog.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crane_api::{Host, HostHealth, HostState};

use crate::db::{decode, encode, map_err, open_file, open_memory};
use crate::error::{StoreError, StoreResult};
use crate::tables::HOSTS;
use crate::traits::HostStore;

/// Thread-safe host catalog backed by redb.
#[derive(Clone)]
pub struct HostCatalogDb {
    db: Arc<Database>,
}

impl HostCatalogDb {
    /// Open (or create) a persistent catalog at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let store = Self {
            db: Arc::new(open_file(path)?),
        };
        store.ensure_tables()?;
        debug!(?path, "host catalog opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory catalog (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self {
            db: Arc::new(open_memory()?),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(HOSTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Read-modify-write a single host inside one write transaction.
    fn modify(&self, id: &str, apply: impl FnOnce(&mut Host)) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
            let mut host: Host = match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => decode(guard.value())?,
                None => return Err(StoreError::NotFound(format!("host {id}"))),
            };
            apply(&mut host);
            let value = encode(&host)?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

impl HostStore for HostCatalogDb {
    fn create(&self, host: &Host) -> StoreResult<()> {
        let value = encode(host)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
            if table.get(host.id.as_str()).map_err(map_err!(Read))?.is_some() {
                return Err(StoreError::AlreadyExists(format!("host {}", host.id)));
            }
            table
                .insert(host.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(host = %host.id, state = %host.state, "host created");
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Host> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => decode(guard.value()),
            None => Err(StoreError::NotFound(format!("host {id}"))),
        }
    }

    fn update_state(&self, id: &str, state: HostState) -> StoreResult<()> {
        self.modify(id, |host| host.state = state)?;
        debug!(host = %id, %state, "host state stored");
        Ok(())
    }

    fn update_health(&self, id: &str, health: HostHealth) -> StoreResult<()> {
        self.modify(id, |host| host.health = health)?;
        debug!(host = %id, %health, "host health stored");
        Ok(())
    }

    fn list_hosts(&self) -> StoreResult<Vec<Host>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HOSTS).map_err(map_err!(Table))?;
        let mut hosts = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            hosts.push(decode(value.value())?);
        }
        Ok(hosts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_host(id: &str) -> Host {
        Host::new(id, "worker", "us-west-2a", "ami-123")
            .with_state(HostState::Ready)
            .with_health(HostHealth::Healthy)
    }

    #[test]
    fn create_and_get() {
        let store = HostCatalogDb::open_in_memory().unwrap();
        let host = test_host("host-1");

        store.create(&host).unwrap();

        assert_eq!(store.get_by_id("host-1").unwrap(), host);
    }

    #[test]
    fn create_duplicate_fails() {
        let store = HostCatalogDb::open_in_memory().unwrap();
        store.create(&test_host("host-1")).unwrap();

        let err = store.create(&test_host("host-1")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = HostCatalogDb::open_in_memory().unwrap();
        let err = store.get_by_id("missing-host").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_state_in_place() {
        let store = HostCatalogDb::open_in_memory().unwrap();
        store.create(&test_host("host-1")).unwrap();

        store.update_state("host-1", HostState::Draining).unwrap();

        let host = store.get_by_id("host-1").unwrap();
        assert_eq!(host.state, HostState::Draining);
        assert_eq!(host.health, HostHealth::Healthy);
    }

    #[test]
    fn update_health_in_place() {
        let store = HostCatalogDb::open_in_memory().unwrap();
        store.create(&test_host("host-1")).unwrap();

        store.update_health("host-1", HostHealth::Unhealthy).unwrap();

        let host = store.get_by_id("host-1").unwrap();
        assert_eq!(host.health, HostHealth::Unhealthy);
        assert_eq!(host.state, HostState::Ready);
    }

    #[test]
    fn update_missing_host_is_not_found() {
        let store = HostCatalogDb::open_in_memory().unwrap();

        assert!(
            store
                .update_state("nope", HostState::Ready)
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            store
                .update_health("nope", HostHealth::Healthy)
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn list_hosts_returns_snapshot() {
        let store = HostCatalogDb::open_in_memory().unwrap();
        assert!(store.list_hosts().unwrap().is_empty());

        store.create(&test_host("a")).unwrap();
        store.create(&test_host("b")).unwrap();
        store
            .create(&test_host("c").with_state(HostState::Terminated))
            .unwrap();

        let hosts = store.list_hosts().unwrap();
        assert_eq!(hosts.len(), 3);
        assert!(hosts.iter().any(|h| h.state == HostState::Terminated));
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.redb");

        {
            let store = HostCatalogDb::open(&path).unwrap();
            store.create(&test_host("host-1")).unwrap();
            store.update_state("host-1", HostState::Draining).unwrap();
        }

        let store = HostCatalogDb::open(&path).unwrap();
        let host = store.get_by_id("host-1").unwrap();
        assert_eq!(host.state, HostState::Draining);
    }
}
