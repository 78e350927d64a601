//! `ActionQueueDb`: redb-backed durable action queue.
//!
//! # Claiming
//!
//! `next()` pops the first entry of the `pending_actions` index and flips
//! the matching record to `running` inside one write transaction. redb
//! admits a single write transaction at a time, so two concurrent callers
//! can never observe the same pending entry: the second one starts after
//! the first has committed and sees the index without it. Readers are never
//! blocked by a claim in progress.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table};
use tracing::{debug, info, trace};

use crane_api::{Action, ActionRecord, ActionStatus};

use crate::db::{decode, encode, map_err, open_file, open_memory};
use crate::error::{StoreError, StoreResult};
use crate::tables::{ACTIONS, PENDING_ACTIONS};
use crate::traits::ActionStore;

type ActionsTable<'txn> = Table<'txn, u64, &'static [u8]>;

fn pending_key(created_at: DateTime<Utc>, id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    let ms = created_at.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key[8..].copy_from_slice(&id.to_be_bytes());
    key
}

fn read_record(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StoreResult<ActionRecord> {
    match table.get(id).map_err(map_err!(Read))? {
        Some(guard) => decode(guard.value()),
        None => Err(StoreError::NotFound(format!("action {id}"))),
    }
}

fn write_record(table: &mut ActionsTable<'_>, record: &ActionRecord) -> StoreResult<()> {
    let value = encode(record)?;
    table
        .insert(record.id, value.as_slice())
        .map_err(map_err!(Write))?;
    Ok(())
}

/// Thread-safe action queue backed by redb.
#[derive(Clone)]
pub struct ActionQueueDb {
    db: Arc<Database>,
}

impl ActionQueueDb {
    /// Open (or create) a persistent queue at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let store = Self {
            db: Arc::new(open_file(path)?),
        };
        store.ensure_tables()?;
        debug!(?path, "action queue opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory queue (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self {
            db: Arc::new(open_memory()?),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(ACTIONS).map_err(map_err!(Table))?;
        txn.open_table(PENDING_ACTIONS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Move a running record to a terminal status.
    fn finish(&self, id: u64, outcome: ActionStatus) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let previous = {
            let mut actions = txn.open_table(ACTIONS).map_err(map_err!(Table))?;
            let mut record = read_record(&actions, id)?;
            let previous = record.status;
            match previous {
                ActionStatus::Pending => return Err(StoreError::NotRunning(id)),
                ActionStatus::Running => {
                    record.status = outcome;
                    record.updated_at = Utc::now();
                    write_record(&mut actions, &record)?;
                }
                ActionStatus::Done | ActionStatus::Failed => {}
            }
            previous
        };

        if previous.is_terminal() {
            txn.abort().map_err(map_err!(Transaction))?;
            debug!(action_id = id, status = %previous, "action already terminal");
        } else {
            txn.commit().map_err(map_err!(Transaction))?;
            debug!(action_id = id, status = %outcome, "action finished");
        }
        Ok(())
    }
}

impl ActionStore for ActionQueueDb {
    fn enqueue(&self, action: &Action) -> StoreResult<u64> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id = {
            let mut actions = txn.open_table(ACTIONS).map_err(map_err!(Table))?;
            let id = actions
                .last()
                .map_err(map_err!(Read))?
                .map_or(1, |(key, _)| key.value() + 1);

            let now = Utc::now();
            let record = ActionRecord {
                id,
                host_id: action.host_id.clone(),
                action_type: action.action_type,
                status: ActionStatus::Pending,
                attempts: 0,
                created_at: now,
                updated_at: now,
            };
            write_record(&mut actions, &record)?;

            let mut pending = txn.open_table(PENDING_ACTIONS).map_err(map_err!(Table))?;
            let key = pending_key(now, id);
            pending
                .insert(key.as_slice(), id)
                .map_err(map_err!(Write))?;
            id
        };
        txn.commit().map_err(map_err!(Transaction))?;

        info!(
            action_id = id,
            host = %action.host_id,
            action = %action.action_type,
            "action enqueued"
        );
        Ok(id)
    }

    fn next(&self) -> StoreResult<ActionRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let claimed = {
            let mut pending = txn.open_table(PENDING_ACTIONS).map_err(map_err!(Table))?;
            let head = pending
                .first()
                .map_err(map_err!(Read))?
                .map(|(key, id)| (key.value().to_vec(), id.value()));

            match head {
                Some((key, id)) => {
                    pending
                        .remove(key.as_slice())
                        .map_err(map_err!(Write))?;

                    let mut actions = txn.open_table(ACTIONS).map_err(map_err!(Table))?;
                    let mut record = read_record(&actions, id)?;
                    record.status = ActionStatus::Running;
                    record.attempts += 1;
                    record.updated_at = Utc::now();
                    write_record(&mut actions, &record)?;
                    Some(record)
                }
                None => None,
            }
        };

        let Some(record) = claimed else {
            txn.abort().map_err(map_err!(Transaction))?;
            trace!("no pending actions");
            return Err(StoreError::NotFound("pending action".to_string()));
        };
        txn.commit().map_err(map_err!(Transaction))?;

        debug!(
            action_id = record.id,
            host = %record.host_id,
            attempts = record.attempts,
            "action claimed"
        );
        Ok(record)
    }

    fn mark_done(&self, id: u64) -> StoreResult<()> {
        self.finish(id, ActionStatus::Done)
    }

    fn mark_failed(&self, id: u64) -> StoreResult<()> {
        self.finish(id, ActionStatus::Failed)
    }

    fn get(&self, id: u64) -> StoreResult<ActionRecord> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ACTIONS).map_err(map_err!(Table))?;
        read_record(&table, id)
    }

    fn list(&self, status: Option<ActionStatus>) -> StoreResult<Vec<ActionRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ACTIONS).map_err(map_err!(Table))?;
        let mut records = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: ActionRecord = decode(value.value())?;
            if status.is_none_or(|s| s == record.status) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn recover_stale(&self, max_age: Duration) -> StoreResult<u32> {
        let Some(cutoff) = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(0);
        };

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let recovered = {
            let mut actions = txn.open_table(ACTIONS).map_err(map_err!(Table))?;
            let mut stale = Vec::new();
            for entry in actions.iter().map_err(map_err!(Read))? {
                let (_, value) = entry.map_err(map_err!(Read))?;
                let record: ActionRecord = decode(value.value())?;
                if record.status == ActionStatus::Running && record.updated_at < cutoff {
                    stale.push(record);
                }
            }

            let now = Utc::now();
            for mut record in stale.iter().cloned() {
                record.status = ActionStatus::Failed;
                record.updated_at = now;
                write_record(&mut actions, &record)?;
                info!(
                    action_id = record.id,
                    host = %record.host_id,
                    attempts = record.attempts,
                    "stale running action marked failed"
                );
            }
            u32::try_from(stale.len()).unwrap_or(u32::MAX)
        };
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use chrono::Duration as CDur;
    use crane_api::ActionType;

    use super::*;

    fn drain(host: &str) -> Action {
        Action::new(host, ActionType::Drain)
    }

    /// Overwrite a stored record, bypassing the queue operations.
    fn force_record(store: &ActionQueueDb, record: &ActionRecord) {
        let txn = store.db.begin_write().unwrap();
        {
            let mut table = txn.open_table(ACTIONS).unwrap();
            write_record(&mut table, record).unwrap();
        }
        txn.commit().unwrap();
    }

    #[test]
    fn enqueue_assigns_increasing_ids() {
        let store = ActionQueueDb::open_in_memory().unwrap();

        let first = store.enqueue(&drain("h1")).unwrap();
        let second = store.enqueue(&drain("h2")).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let record = store.get(first).unwrap();
        assert_eq!(record.status, ActionStatus::Pending);
        assert_eq!(record.attempts, 0);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn next_on_empty_queue_is_not_found() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        let err = store.next().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn enqueue_then_next_returns_running_record() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        let action = Action::new("h1", ActionType::Replace);
        let id = store.enqueue(&action).unwrap();

        let record = store.next().unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.action(), action);
        assert_eq!(record.status, ActionStatus::Running);
        assert_eq!(record.attempts, 1);
        assert_eq!(store.get(id).unwrap(), record);
    }

    #[test]
    fn next_claims_in_creation_order() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        for host in ["a", "b", "c"] {
            store.enqueue(&drain(host)).unwrap();
        }

        let claimed: Vec<String> = (0..3).map(|_| store.next().unwrap().host_id).collect();

        assert_eq!(claimed, vec!["a", "b", "c"]);
        assert!(store.next().unwrap_err().is_not_found());
    }

    #[test]
    fn pending_key_orders_by_time_then_id() {
        let now = Utc::now();
        let earlier = now - CDur::milliseconds(5);

        assert!(pending_key(earlier, 9) < pending_key(now, 1));
        assert!(pending_key(now, 1) < pending_key(now, 2));
    }

    #[test]
    fn concurrent_next_hands_each_record_to_one_caller() {
        const PENDING: usize = 5;
        const CALLERS: usize = 16;

        let store = ActionQueueDb::open_in_memory().unwrap();
        for i in 0..PENDING {
            store.enqueue(&drain(&format!("h{i}"))).unwrap();
        }

        let results: Vec<StoreResult<ActionRecord>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    let store = store.clone();
                    scope.spawn(move || store.next())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let claimed: Vec<ActionRecord> = results
            .iter()
            .filter_map(|r| r.as_ref().ok().cloned())
            .collect();
        let empty = results
            .iter()
            .filter(|r| r.as_ref().is_err_and(StoreError::is_not_found))
            .count();

        assert_eq!(claimed.len(), PENDING);
        assert_eq!(empty, CALLERS - PENDING);

        let ids: HashSet<u64> = claimed.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), PENDING, "a record was handed out twice");
        assert!(claimed.iter().all(|r| r.status == ActionStatus::Running));
        assert!(claimed.iter().all(|r| r.attempts == 1));
    }

    #[test]
    fn mark_done_is_idempotent_and_keeps_attempts() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        let id = store.enqueue(&drain("h1")).unwrap();
        store.next().unwrap();

        store.mark_done(id).unwrap();
        let done = store.get(id).unwrap();
        assert_eq!(done.status, ActionStatus::Done);
        assert_eq!(done.attempts, 1);

        store.mark_done(id).unwrap();
        assert_eq!(store.get(id).unwrap(), done);
    }

    #[test]
    fn mark_failed_does_not_requeue() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        let id = store.enqueue(&drain("h1")).unwrap();
        store.next().unwrap();

        store.mark_failed(id).unwrap();

        let record = store.get(id).unwrap();
        assert_eq!(record.status, ActionStatus::Failed);
        assert_eq!(record.attempts, 1);
        assert!(store.next().unwrap_err().is_not_found());
    }

    #[test]
    fn terminal_records_are_never_overwritten() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        let id = store.enqueue(&drain("h1")).unwrap();
        store.next().unwrap();
        store.mark_done(id).unwrap();

        store.mark_failed(id).unwrap();

        assert_eq!(store.get(id).unwrap().status, ActionStatus::Done);
    }

    #[test]
    fn finishing_a_pending_record_is_rejected() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        let id = store.enqueue(&drain("h1")).unwrap();

        let err = store.mark_done(id).unwrap_err();
        assert!(matches!(err, StoreError::NotRunning(n) if n == id));
        assert_eq!(store.get(id).unwrap().status, ActionStatus::Pending);
    }

    #[test]
    fn finishing_a_missing_record_is_not_found() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        assert!(store.mark_done(42).unwrap_err().is_not_found());
        assert!(store.mark_failed(42).unwrap_err().is_not_found());
    }

    #[test]
    fn list_filters_by_status() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        store.enqueue(&drain("a")).unwrap();
        store.enqueue(&drain("b")).unwrap();
        store.enqueue(&drain("c")).unwrap();
        let claimed = store.next().unwrap();
        store.mark_done(claimed.id).unwrap();

        assert_eq!(store.list(None).unwrap().len(), 3);
        let pending = store.list(Some(ActionStatus::Pending)).unwrap();
        assert_eq!(
            pending.iter().map(|r| r.host_id.as_str()).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
        assert_eq!(store.list(Some(ActionStatus::Done)).unwrap().len(), 1);
        assert!(store.list(Some(ActionStatus::Running)).unwrap().is_empty());
    }

    #[test]
    fn recover_stale_fails_only_old_running_records() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        store.enqueue(&drain("stale")).unwrap();
        store.enqueue(&drain("fresh")).unwrap();
        store.enqueue(&drain("waiting")).unwrap();

        let mut stale = store.next().unwrap();
        let fresh = store.next().unwrap();
        stale.updated_at = Utc::now() - CDur::minutes(30);
        force_record(&store, &stale);

        let recovered = store.recover_stale(Duration::from_secs(600)).unwrap();
        assert_eq!(recovered, 1);

        let stale = store.get(stale.id).unwrap();
        assert_eq!(stale.status, ActionStatus::Failed);
        assert_eq!(stale.attempts, 1);
        assert_eq!(store.get(fresh.id).unwrap().status, ActionStatus::Running);
        assert_eq!(store.next().unwrap().host_id, "waiting");
    }

    #[test]
    fn recover_stale_on_empty_queue_returns_zero() {
        let store = ActionQueueDb::open_in_memory().unwrap();
        assert_eq!(store.recover_stale(Duration::from_secs(60)).unwrap(), 0);
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.redb");

        {
            let store = ActionQueueDb::open(&path).unwrap();
            store.enqueue(&drain("h1")).unwrap();
            store.enqueue(&drain("h2")).unwrap();
            store.next().unwrap();
        }

        let store = ActionQueueDb::open(&path).unwrap();
        assert_eq!(store.get(1).unwrap().status, ActionStatus::Running);
        let record = store.next().unwrap();
        assert_eq!(record.host_id, "h2");
        assert_eq!(store.enqueue(&drain("h3")).unwrap(), 3);
    }

    #[test]
    fn second_open_of_same_file_is_locked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.redb");

        let _owner = ActionQueueDb::open(&path).unwrap();
        let err = ActionQueueDb::open(&path).err().unwrap();

        assert!(matches!(err, StoreError::Locked(p) if p == path.display().to_string()));
    }
}
