//! The storage facade: named queries over one connection.

use std::fmt;
use std::sync::Mutex;

use crate::backend::StorageConnection;
use crate::batch::BatchCounters;
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::queries::QuerySet;
use crate::registry::{QueryRegistry, lock};

mod dml;
mod select;
mod tx;

/// Executes pre-registered SQL statements by name against a single connection.
///
/// # Locking
///
/// * Every write (and [`Storage::flush`]) holds the facade-wide batch lock for its whole
///   duration, so at most one write runs at a time and batch counters change atomically
///   with batch execution.
/// * Each compiled statement has its own lock, taken by reads and writes alike while they
///   rebind and execute it. Reads of different queries run in parallel; a read never sees
///   another thread's bindings.
/// * Commit and rollback lock only the connection.
///
/// Lock order is batch lock, then statement lock; the connection lock is never held
/// together with either.
pub struct Storage<C: StorageConnection> {
    connection: Mutex<C>,
    config: StorageConfig,
    registry: QueryRegistry<C::Statement>,
    batches: Mutex<BatchCounters>,
}

impl<C: StorageConnection> Storage<C> {
    /// Prepare every query in `queries` against `connection`.
    ///
    /// When `config` disables auto-commit the connection is switched to manual-commit mode
    /// before any statement is prepared, and switched back if preparation fails.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the connection is closed or `queries` is
    /// empty, and `StorageError::Init` if the connection cannot be configured or any
    /// statement fails to prepare. No facade is created in either case.
    pub fn new(mut connection: C, queries: &QuerySet, config: StorageConfig) -> Result<Self> {
        if connection.is_closed() {
            return Err(StorageError::invalid_parameter("Invalid connection", "connection"));
        }
        if queries.is_empty() {
            return Err(StorageError::invalid_parameter("Invalid queries", "queries"));
        }
        if !config.auto_commit() {
            connection
                .set_auto_commit(false)
                .map_err(StorageError::Init)?;
        }
        let registry = match QueryRegistry::prepare(&mut connection, queries) {
            Ok(registry) => registry,
            Err(err) => {
                if !config.auto_commit() {
                    if let Err(restore) = connection.set_auto_commit(true) {
                        tracing::debug!(error = %restore, "ignoring auto-commit restore failure");
                    }
                }
                return Err(StorageError::Init(err));
            }
        };
        tracing::debug!(
            queries = queries.len(),
            auto_commit = config.auto_commit(),
            "prepared named queries"
        );
        Ok(Self {
            connection: Mutex::new(connection),
            config,
            registry,
            batches: Mutex::new(BatchCounters::new()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Registered query names, sorted. Empty after [`Storage::close`].
    #[must_use]
    pub fn query_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Writes queued for `name` that have not been executed yet.
    #[must_use]
    pub fn pending_batch(&self, name: &str) -> usize {
        lock(&self.batches).pending(name)
    }

    /// Best-effort teardown: forget pending batches, close and unregister every statement.
    ///
    /// Statement close failures are logged at debug level and otherwise ignored; this never
    /// fails. Queued batch entries that never reached their batch size are discarded. The
    /// connection itself stays open. Calling `close` twice is harmless, and dropping the
    /// facade closes it.
    ///
    /// The connection's commit mode is left as it is. A facade built with auto-commit
    /// disabled leaves a shared connection in manual-commit mode with any uncommitted
    /// transaction still open; its owner must commit, roll back, or call
    /// `set_auto_commit(true)` before relying on it.
    pub fn close(&self) {
        let mut batches = lock(&self.batches);
        batches.clear();
        for (name, err) in self.registry.close_all() {
            tracing::debug!(query = %name, error = %err, "ignoring statement close failure");
        }
    }
}

impl<C: StorageConnection> Drop for Storage<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: StorageConnection> fmt::Debug for Storage<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("config", &self.config)
            .field("queries", &self.registry.names())
            .finish_non_exhaustive()
    }
}

pub(crate) fn validate_query_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StorageError::invalid_parameter("Invalid query name", "queryName"));
    }
    Ok(())
}
