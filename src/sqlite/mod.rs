// SQLite backend - implements the connection and statement seams on top of rusqlite
//
// - connection: the shared connection handle and its commit-mode handling
// - prepared: compiled statements with bindings and a batch buffer
// - params: parameter conversion into SQLite values
// - query: result extraction and building

pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;

use std::path::Path;

use crate::builder::StorageBuilder;
use crate::error::{Result, StorageError};
use crate::storage::Storage;

// Re-export the public API
pub use connection::SqliteConnection;
pub use params::param_to_sqlite_value;
pub use prepared::SqliteStatement;
pub use query::build_result_set;

impl Storage<SqliteConnection> {
    #[must_use]
    pub fn sqlite_builder() -> StorageBuilder<SqliteConnection> {
        StorageBuilder::new()
    }
}

impl StorageBuilder<SqliteConnection> {
    /// Open (or create) the database file at `path` and use it as the connection.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the database cannot be opened.
    pub fn connection_from_path(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = SqliteConnection::open(path).map_err(|_| {
            StorageError::invalid_parameter(
                format!("Failed to create connection from path: {}", path.display()),
                "path",
            )
        })?;
        Ok(self.connection(conn))
    }

    /// Use a fresh private in-memory database as the connection.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the database cannot be opened.
    pub fn in_memory(self) -> Result<Self> {
        let conn = SqliteConnection::open_in_memory().map_err(|e| {
            StorageError::invalid_parameter(
                format!("Failed to create in-memory connection: {e}"),
                "path",
            )
        })?;
        Ok(self.connection(conn))
    }
}
