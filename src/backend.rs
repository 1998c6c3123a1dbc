//! Seams between the storage facade and a concrete database driver.
//!
//! The facade never talks to a driver directly: it prepares statements through a
//! [`StorageConnection`] and drives each one through [`CompiledStatement`].

use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::ParamValue;

/// A single live database connection.
pub trait StorageConnection: Send {
    type Statement: CompiledStatement;

    /// Compile `sql` into a reusable statement bound to this connection.
    ///
    /// # Errors
    /// Returns `DriverError` if the SQL is malformed or the connection is unusable.
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, DriverError>;

    /// Switch between auto-commit and manual-commit mode.
    ///
    /// # Errors
    /// Returns `DriverError` if the mode cannot be changed.
    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), DriverError>;

    /// Commit all pending work on the connection.
    ///
    /// # Errors
    /// Returns `DriverError` if the commit fails.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// Discard all pending work on the connection.
    ///
    /// # Errors
    /// Returns `DriverError` if the rollback fails.
    fn rollback(&mut self) -> Result<(), DriverError>;

    fn is_closed(&self) -> bool;

    /// Release the connection.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver reports a failure while closing.
    fn close(&mut self) -> Result<(), DriverError>;
}

/// A compiled statement with positional (1-based) parameters and a batch buffer.
pub trait CompiledStatement: Send {
    /// Drop every bound parameter.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver rejects the reset.
    fn clear_parameters(&mut self) -> Result<(), DriverError>;

    /// Bind `value` at the 1-based position `index`.
    ///
    /// # Errors
    /// Returns `DriverError` if the position or value is rejected.
    fn bind(&mut self, index: usize, value: &ParamValue) -> Result<(), DriverError>;

    /// Execute with the current bindings and report the affected row count.
    ///
    /// # Errors
    /// Returns `DriverError` if execution fails.
    fn execute_update(&mut self) -> Result<usize, DriverError>;

    /// Execute with the current bindings and materialize every result row.
    ///
    /// # Errors
    /// Returns `DriverError` if execution or row extraction fails.
    fn execute_query(&mut self) -> Result<ResultSet, DriverError>;

    /// Queue the current bindings as one batch entry.
    ///
    /// # Errors
    /// Returns `DriverError` if the entry cannot be queued.
    fn add_batch(&mut self) -> Result<(), DriverError>;

    /// Execute every queued entry, returning one affected count per entry.
    ///
    /// # Errors
    /// Returns `DriverError` if any entry fails.
    fn execute_batch(&mut self) -> Result<Vec<usize>, DriverError>;

    /// Drop every queued entry.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver rejects the reset.
    fn clear_batch(&mut self) -> Result<(), DriverError>;

    /// Release the statement.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver reports a failure while closing.
    fn close(&mut self) -> Result<(), DriverError>;
}
