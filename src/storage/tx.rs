use crate::backend::StorageConnection;
use crate::error::{Result, StorageError};
use crate::registry::lock;

use super::Storage;

impl<C: StorageConnection> Storage<C> {
    /// Commit all pending work on the connection, across every query.
    ///
    /// Does nothing when the facade was configured with auto-commit. Queued batch entries
    /// that have not fired yet are not executed by a commit.
    ///
    /// # Errors
    /// Returns `StorageError::Commit` if the connection fails to commit.
    pub fn commit(&self) -> Result<()> {
        if self.config.auto_commit() {
            return Ok(());
        }
        lock(&self.connection)
            .commit()
            .map_err(StorageError::Commit)?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// Discard all pending work on the connection, across every query.
    ///
    /// Does nothing when the facade was configured with auto-commit.
    ///
    /// # Errors
    /// Returns `StorageError::Rollback` if the connection fails to roll back.
    pub fn rollback(&self) -> Result<()> {
        if self.config.auto_commit() {
            return Ok(());
        }
        lock(&self.connection)
            .rollback()
            .map_err(StorageError::Rollback)?;
        tracing::debug!("transaction rolled back");
        Ok(())
    }
}
