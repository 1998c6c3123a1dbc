use crate::backend::{CompiledStatement, StorageConnection};
use crate::batch::BatchCounters;
use crate::binder::bind_params;
use crate::error::{Result, StorageError};
use crate::registry::lock;
use crate::types::ParamValue;

use super::{Storage, validate_query_name};

impl<C: StorageConnection> Storage<C> {
    /// Execute the named write immediately, without batching.
    ///
    /// Pass `&[]` for a statement without parameters. The configured
    /// [`StorageConfig::batch_size`](crate::config::StorageConfig::batch_size) is not consulted.
    ///
    /// # Errors
    /// See [`Storage::write_batched`].
    pub fn write(&self, name: &str, params: &[ParamValue]) -> Result<usize> {
        self.write_batched(name, params, 1)
    }

    /// Execute the named write, or queue it when `batch_size > 1`.
    ///
    /// With `batch_size == 1` the statement runs immediately and the affected row count is
    /// returned. Otherwise the bindings are queued and 0 is returned until `batch_size`
    /// writes for `name` are pending; that write executes the whole batch and returns the sum
    /// of its affected row counts.
    ///
    /// # Errors
    /// * `StorageError::InvalidParameter` for a blank name, a zero batch size or a rejected
    ///   parameter value.
    /// * `StorageError::QueryNotFound` if `name` is not registered.
    /// * `StorageError::QueryExecution` if the driver fails. A failed bind or enqueue leaves
    ///   earlier queued entries untouched; a failed batch execution discards the whole batch.
    pub fn write_batched(&self, name: &str, params: &[ParamValue], batch_size: usize) -> Result<usize> {
        validate_query_name(name)?;
        if batch_size == 0 {
            return Err(StorageError::invalid_parameter(
                "Batch size must be positive",
                "batchSize",
            ));
        }

        let mut batches = lock(&self.batches);
        let shared = self.registry.lookup(name)?;
        let mut stmt = lock(&shared);

        stmt.clear_parameters()
            .map_err(|e| StorageError::execution(name, e))?;
        bind_params(&mut *stmt, name, params, self.config.max_string_param_length())?;

        if batch_size == 1 {
            return stmt
                .execute_update()
                .map_err(|e| StorageError::execution(name, e));
        }

        stmt.add_batch().map_err(|e| StorageError::execution(name, e))?;
        let pending = batches.increment(name);
        tracing::trace!(query = name, pending, batch_size, "write queued");
        if batches.is_full(name, batch_size) {
            fire_batch(&mut batches, &mut *stmt, name)
        } else {
            Ok(0)
        }
    }

    /// Execute whatever is queued for `name` without waiting for the batch to fill.
    ///
    /// Returns the summed affected row count, or 0 when nothing is pending.
    ///
    /// # Errors
    /// Same lookup and execution errors as [`Storage::write_batched`].
    pub fn flush(&self, name: &str) -> Result<usize> {
        validate_query_name(name)?;
        let mut batches = lock(&self.batches);
        let shared = self.registry.lookup(name)?;
        if batches.pending(name) == 0 {
            return Ok(0);
        }
        let mut stmt = lock(&shared);
        fire_batch(&mut batches, &mut *stmt, name)
    }
}

// Caller holds the batch lock. The counter goes away whatever the outcome, and the
// statement's batch buffer is cleared even when execution fails.
fn fire_batch<S: CompiledStatement + ?Sized>(
    batches: &mut BatchCounters,
    stmt: &mut S,
    name: &str,
) -> Result<usize> {
    let entries = batches.take(name);
    let executed = stmt.execute_batch();
    let cleared = stmt.clear_batch();
    let counts = executed.map_err(|e| StorageError::execution(name, e))?;
    cleared.map_err(|e| StorageError::execution(name, e))?;
    let total: usize = counts.iter().sum();
    tracing::debug!(query = name, entries, total, "batch executed");
    Ok(total)
}
