use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::backend::StorageConnection;
use crate::error::DriverError;
use crate::registry::lock;

use super::prepared::SqliteStatement;

// rusqlite's default statement cache size; grown as more queries are registered.
const MIN_STATEMENT_CACHE: usize = 16;

struct ConnectionState {
    conn: Option<rusqlite::Connection>,
    auto_commit: bool,
    prepared: usize,
}

/// Shared handle to one `SQLite` connection.
///
/// Clones refer to the same connection, so a caller can keep a handle for schema setup or
/// inspection while a [`crate::Storage`] owns another.
///
/// `SQLite` has no connection-level manual-commit switch. In manual-commit mode a `BEGIN`
/// is issued before the first statement that runs outside a transaction, and
/// commit/rollback end it; the next statement opens a new one.
#[derive(Clone)]
pub struct SqliteConnection {
    state: Arc<Mutex<ConnectionState>>,
}

impl SqliteConnection {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns `DriverError::Sqlite` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        Ok(Self::from_connection(rusqlite::Connection::open(path)?))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `DriverError::Sqlite` if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, DriverError> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }

    #[must_use]
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConnectionState {
                conn: Some(conn),
                auto_commit: true,
                prepared: 0,
            })),
        }
    }

    /// Run a SQL script (several `;`-separated statements, no parameters).
    ///
    /// # Errors
    /// Returns `DriverError` if the connection is closed or any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DriverError> {
        self.run(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Run `func` directly against the underlying rusqlite connection.
    ///
    /// # Errors
    /// Returns `DriverError::Closed` if the connection was closed, or whatever `func` returns.
    pub fn with_connection<F, R>(&self, func: F) -> Result<R, DriverError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<R, DriverError>,
    {
        let state = lock(&self.state);
        let conn = state.conn.as_ref().ok_or(DriverError::Closed)?;
        func(conn)
    }

    #[must_use]
    pub fn is_auto_commit(&self) -> bool {
        lock(&self.state).auto_commit
    }

    /// Whether a transaction is currently open on the connection.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        lock(&self.state)
            .conn
            .as_ref()
            .is_some_and(|conn| !conn.is_autocommit())
    }

    // Statement entry point: opens the implicit transaction in manual-commit mode.
    pub(crate) fn run<F, R>(&self, func: F) -> Result<R, DriverError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<R, DriverError>,
    {
        let state = lock(&self.state);
        let conn = state.conn.as_ref().ok_or(DriverError::Closed)?;
        if !state.auto_commit && conn.is_autocommit() {
            conn.execute_batch("BEGIN")?;
        }
        func(conn)
    }

    fn end_transaction(&self, sql: &str) -> Result<(), DriverError> {
        let state = lock(&self.state);
        let conn = state.conn.as_ref().ok_or(DriverError::Closed)?;
        // Nothing ran since the last commit/rollback.
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch(sql)?;
        Ok(())
    }
}

impl StorageConnection for SqliteConnection {
    type Statement = SqliteStatement;

    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, DriverError> {
        {
            let mut state = lock(&self.state);
            state.prepared += 1;
            let capacity = state.prepared.max(MIN_STATEMENT_CACHE);
            let conn = state.conn.as_ref().ok_or(DriverError::Closed)?;
            conn.set_prepared_statement_cache_capacity(capacity);
            // Compiles the SQL now and leaves it in the statement cache.
            conn.prepare_cached(sql)?;
        }
        Ok(SqliteStatement::new(self.clone(), sql))
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        if auto_commit && !state.auto_commit {
            if let Some(conn) = state.conn.as_ref() {
                if !conn.is_autocommit() {
                    conn.execute_batch("COMMIT")?;
                }
            }
        }
        state.auto_commit = auto_commit;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.end_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.end_transaction("ROLLBACK")
    }

    fn is_closed(&self) -> bool {
        lock(&self.state).conn.is_none()
    }

    fn close(&mut self) -> Result<(), DriverError> {
        let conn = lock(&self.state).conn.take();
        match conn {
            Some(conn) => conn.close().map_err(|(_, e)| DriverError::Sqlite(e)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("SqliteConnection")
            .field("open", &state.conn.is_some())
            .field("auto_commit", &state.auto_commit)
            .field("prepared", &state.prepared)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_commit_opens_transactions_lazily() -> Result<(), DriverError> {
        let mut conn = SqliteConnection::open_in_memory()?;
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")?;
        assert!(!conn.in_transaction());

        conn.set_auto_commit(false)?;
        assert!(!conn.in_transaction());
        conn.run(|c| Ok(c.execute("INSERT INTO t (id) VALUES (1)", [])?))?;
        assert!(conn.in_transaction());

        conn.rollback()?;
        assert!(!conn.in_transaction());
        let count: i64 =
            conn.with_connection(|c| Ok(c.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?))?;
        assert_eq!(count, 0);

        // commit with nothing pending is a no-op
        conn.commit()?;
        Ok(())
    }

    #[test]
    fn returning_to_auto_commit_commits_open_work() -> Result<(), DriverError> {
        let mut conn = SqliteConnection::open_in_memory()?;
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")?;
        conn.set_auto_commit(false)?;
        conn.run(|c| Ok(c.execute("INSERT INTO t (id) VALUES (1)", [])?))?;
        conn.set_auto_commit(true)?;
        assert!(!conn.in_transaction());
        assert!(conn.is_auto_commit());
        Ok(())
    }

    #[test]
    fn prepare_rejects_bad_sql() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        assert!(conn.prepare("SELEC nonsense").is_err());
        assert!(conn.prepare("SELECT * FROM missing_table").is_err());
        assert!(conn.prepare("SELECT 1").is_ok());
    }

    #[test]
    fn close_is_observable_through_clones() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        let other = conn.clone();
        assert!(!other.is_closed());
        conn.close().unwrap();
        assert!(other.is_closed());
        assert!(matches!(other.execute_batch("SELECT 1"), Err(DriverError::Closed)));
        // closing twice is fine
        conn.close().unwrap();
    }
}
