//! Cubby storage on redb.
//!
//! Each cubby is its own redb table (`cubby:{name}`) mapping encoded message
//! keys to message text. redb iterates keys in byte order, which the key
//! codec makes equal to time order.
//!
//! redb admits a single write transaction at a time and gives readers a
//! consistent snapshot, so every operation here is atomic and writers are
//! serialized across the whole database.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, TableDefinition, TableError};
use thiserror::Error;

use super::keys::{KeyError, MessageKey};
use crate::models::Message;

const TABLE_PREFIX: &str = "cubby:";

/// How long to wait between attempts while another process holds the file.
const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] redb::Error),

    #[error("malformed key in cubby {cubby:?}: {source}")]
    MalformedKey {
        cubby: String,
        #[source]
        source: KeyError,
    },

    #[error("cannot store message: {0}")]
    Unencodable(#[source] KeyError),

    #[error("storage task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

macro_rules! storage_unavailable_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for StoreError {
                fn from(err: $err) -> Self {
                    Self::StorageUnavailable(err.into())
                }
            }
        )*
    };
}

storage_unavailable_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Store for cubby messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CubbyStore: Send + Sync {
    /// Append a message stamped with the current time. Returns the instant
    /// it was stored under.
    async fn insert(&self, cubby: &str, content: &str) -> Result<DateTime<Utc>, StoreError>;

    /// All messages in the cubby, oldest first. Unknown cubbies are empty.
    async fn retrieve(&self, cubby: &str) -> Result<Vec<Message>, StoreError>;

    /// Delete every message in the cubby.
    async fn clear(&self, cubby: &str) -> Result<(), StoreError>;

    /// Delete every message stored at or before `not_after`.
    async fn prune_before(&self, cubby: &str, not_after: DateTime<Utc>) -> Result<(), StoreError>;
}

/// redb implementation of CubbyStore.
#[derive(Clone)]
pub struct RedbCubbyStore {
    db: Arc<redb::Database>,
}

fn table_name(cubby: &str) -> String {
    format!("{TABLE_PREFIX}{cubby}")
}

impl RedbCubbyStore {
    /// Creates or opens the database at `path`.
    ///
    /// If another process has the file open, retries until `timeout` has
    /// passed before giving up.
    pub fn open(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::StorageUnavailable(redb::Error::Io(e)))?;
        }

        let deadline = Instant::now() + timeout;
        loop {
            match redb::Database::create(path) {
                Ok(db) => return Ok(Self { db: Arc::new(db) }),
                Err(redb::DatabaseError::DatabaseAlreadyOpen) if Instant::now() < deadline => {
                    std::thread::sleep(OPEN_RETRY_INTERVAL);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Stores `content` at the time the write transaction is acquired.
    pub fn insert_now(&self, cubby: &str, content: &str) -> Result<DateTime<Utc>, StoreError> {
        self.append(cubby, content, Utc::now)
    }

    /// Stores `content` at `at`.
    #[cfg(test)]
    pub fn insert_at(
        &self,
        cubby: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, StoreError> {
        self.append(cubby, content, || at)
    }

    // The timestamp is taken once the write lock is held, so keys follow
    // commit order. A taken key moves the message forward one nanosecond at
    // a time until it lands on a free one.
    fn append(
        &self,
        cubby: &str,
        content: &str,
        clock: impl FnOnce() -> DateTime<Utc>,
    ) -> Result<DateTime<Utc>, StoreError> {
        let name = table_name(cubby);
        let definition: TableDefinition<&str, &str> = TableDefinition::new(&name);

        let write_txn = self.db.begin_write()?;
        let stored_at = {
            let mut table = write_txn.open_table(definition)?;

            let mut at = clock();
            let mut key = MessageKey::encode(at).map_err(StoreError::Unencodable)?;
            while table.get(key.as_str())?.is_some() {
                at += chrono::Duration::nanoseconds(1);
                key = MessageKey::encode(at).map_err(StoreError::Unencodable)?;
            }

            table.insert(key.as_str(), content)?;
            at
        };
        write_txn.commit()?;

        Ok(stored_at)
    }

    pub fn list(&self, cubby: &str) -> Result<Vec<Message>, StoreError> {
        let name = table_name(cubby);
        let definition: TableDefinition<&str, &str> = TableDefinition::new(&name);

        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(definition) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut messages = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let time = MessageKey::decode(key.value()).map_err(|source| StoreError::MalformedKey {
                cubby: cubby.to_string(),
                source,
            })?;

            messages.push(Message {
                time,
                content: value.value().to_string(),
            });
        }

        Ok(messages)
    }

    /// Drops the cubby's table. Returns whether it existed.
    pub fn delete_all(&self, cubby: &str) -> Result<bool, StoreError> {
        let name = table_name(cubby);
        let definition: TableDefinition<&str, &str> = TableDefinition::new(&name);

        let write_txn = self.db.begin_write()?;
        let existed = write_txn.delete_table(definition)?;
        write_txn.commit()?;

        Ok(existed)
    }

    /// Removes every message at or before `not_after`. Returns how many were
    /// removed.
    pub fn delete_through(&self, cubby: &str, not_after: DateTime<Utc>) -> Result<usize, StoreError> {
        let name = table_name(cubby);
        let definition: TableDefinition<&str, &str> = TableDefinition::new(&name);
        let cutoff = MessageKey::prefix_for(not_after);

        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(definition)?;

            let doomed = table
                .range::<&str>(..=cutoff.as_str())?
                .map(|entry| entry.map(|(key, _)| key.value().to_string()))
                .collect::<Result<Vec<_>, _>>()?;

            for key in &doomed {
                table.remove(key.as_str())?;
            }
            doomed.len()
        };

        if removed == 0 {
            // Nothing to delete; don't leave behind a table for a cubby that
            // never existed.
            write_txn.abort()?;
        } else {
            write_txn.commit()?;
        }

        Ok(removed)
    }
}

#[async_trait]
impl CubbyStore for RedbCubbyStore {
    async fn insert(&self, cubby: &str, content: &str) -> Result<DateTime<Utc>, StoreError> {
        let store = self.clone();
        let cubby = cubby.to_string();
        let content = content.to_string();

        tokio::task::spawn_blocking(move || store.insert_now(&cubby, &content)).await?
    }

    async fn retrieve(&self, cubby: &str) -> Result<Vec<Message>, StoreError> {
        let store = self.clone();
        let cubby = cubby.to_string();

        tokio::task::spawn_blocking(move || store.list(&cubby)).await?
    }

    async fn clear(&self, cubby: &str) -> Result<(), StoreError> {
        let store = self.clone();
        let cubby = cubby.to_string();

        tokio::task::spawn_blocking(move || store.delete_all(&cubby).map(|_| ())).await?
    }

    async fn prune_before(&self, cubby: &str, not_after: DateTime<Utc>) -> Result<(), StoreError> {
        let store = self.clone();
        let cubby = cubby.to_string();

        tokio::task::spawn_blocking(move || store.delete_through(&cubby, not_after).map(|_| ()))
            .await?
    }
}
