//! Async adapter over [`Storage`].
//!
//! Every call moves onto tokio's blocking pool, so a slow statement never stalls the
//! runtime's worker threads. Semantics and errors are exactly those of the blocking facade.

use std::sync::Arc;

use tokio::task::{JoinError, spawn_blocking};

use crate::backend::StorageConnection;
use crate::error::{DriverError, Result, StorageError};
use crate::storage::Storage;
use crate::types::{ParamValue, Row};

fn join_error(e: &JoinError) -> DriverError {
    DriverError::Other(format!("storage task join error: {e}"))
}

/// Cloneable async handle; clones share one [`Storage`].
pub struct AsyncStorage<C: StorageConnection> {
    inner: Arc<Storage<C>>,
}

impl<C: StorageConnection> Clone for AsyncStorage<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> AsyncStorage<C>
where
    C: StorageConnection + 'static,
    C::Statement: 'static,
{
    #[must_use]
    pub fn new(storage: Storage<C>) -> Self {
        Self {
            inner: Arc::new(storage),
        }
    }

    /// The shared blocking facade.
    #[must_use]
    pub fn blocking(&self) -> &Storage<C> {
        &self.inner
    }

    /// # Errors
    /// See [`Storage::write`].
    pub async fn write(&self, name: &str, params: Vec<ParamValue>) -> Result<usize> {
        let inner = Arc::clone(&self.inner);
        let owned = name.to_owned();
        spawn_blocking(move || inner.write(&owned, &params))
            .await
            .map_err(|e| StorageError::execution(name, join_error(&e)))?
    }

    /// # Errors
    /// See [`Storage::write_batched`].
    pub async fn write_batched(
        &self,
        name: &str,
        params: Vec<ParamValue>,
        batch_size: usize,
    ) -> Result<usize> {
        let inner = Arc::clone(&self.inner);
        let owned = name.to_owned();
        spawn_blocking(move || inner.write_batched(&owned, &params, batch_size))
            .await
            .map_err(|e| StorageError::execution(name, join_error(&e)))?
    }

    /// # Errors
    /// See [`Storage::read`].
    pub async fn read(&self, name: &str, params: Vec<ParamValue>) -> Result<Vec<Row>> {
        let inner = Arc::clone(&self.inner);
        let owned = name.to_owned();
        spawn_blocking(move || inner.read(&owned, &params))
            .await
            .map_err(|e| StorageError::execution(name, join_error(&e)))?
    }

    /// # Errors
    /// See [`Storage::flush`].
    pub async fn flush(&self, name: &str) -> Result<usize> {
        let inner = Arc::clone(&self.inner);
        let owned = name.to_owned();
        spawn_blocking(move || inner.flush(&owned))
            .await
            .map_err(|e| StorageError::execution(name, join_error(&e)))?
    }

    /// # Errors
    /// See [`Storage::commit`].
    pub async fn commit(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        spawn_blocking(move || inner.commit())
            .await
            .map_err(|e| StorageError::Commit(join_error(&e)))?
    }

    /// # Errors
    /// See [`Storage::rollback`].
    pub async fn rollback(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        spawn_blocking(move || inner.rollback())
            .await
            .map_err(|e| StorageError::Rollback(join_error(&e)))?
    }

    pub async fn close(&self) {
        let inner = Arc::clone(&self.inner);
        if let Err(e) = spawn_blocking(move || inner.close()).await {
            tracing::debug!(error = %e, "ignoring close task failure");
        }
    }
}

impl<C: StorageConnection> From<Storage<C>> for AsyncStorage<C> {
    fn from(storage: Storage<C>) -> Self {
        Self {
            inner: Arc::new(storage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::test_utils::RecordingConnection;

    fn storage(conn: &RecordingConnection, auto_commit: bool) -> AsyncStorage<RecordingConnection> {
        let config = StorageConfig::builder()
            .auto_commit(auto_commit)
            .build()
            .unwrap();
        let storage = Storage::builder()
            .connection(conn.clone())
            .add_query("users.insert", "insert into users values (?)")
            .config(config)
            .build()
            .unwrap();
        AsyncStorage::new(storage)
    }

    #[tokio::test]
    async fn manual_commit_runs_on_the_blocking_pool() {
        let conn = RecordingConnection::new();
        let store = storage(&conn, false);
        assert_eq!(store.write("users.insert", vec![ParamValue::Int(1)]).await.unwrap(), 1);
        store.commit().await.unwrap();
        store.rollback().await.unwrap();
        let calls = conn.calls();
        assert_eq!((calls.commits, calls.rollbacks), (1, 1));
    }

    #[tokio::test]
    async fn concurrent_batched_writes_fire_once_per_batch() {
        let conn = RecordingConnection::new();
        let store = storage(&conn, true);
        let mut handles = Vec::new();
        for i in 0..12 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .write_batched("users.insert", vec![ParamValue::Int(i)], 4)
                    .await
            }));
        }
        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().unwrap();
        }
        assert_eq!(total, 12);
        assert_eq!(conn.calls().executed_batches, vec![4, 4, 4]);
    }

    #[tokio::test]
    async fn errors_pass_through_unchanged() {
        let conn = RecordingConnection::new();
        let store = storage(&conn, true);
        let err = store.read("users.none", vec![]).await.unwrap_err();
        assert_eq!(err.code(), "QUERY_NOT_FOUND");
        store.close().await;
        assert!(store.blocking().query_names().is_empty());
    }
}
