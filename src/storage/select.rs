use crate::backend::{CompiledStatement, StorageConnection};
use crate::binder::bind_params;
use crate::error::{Result, StorageError};
use crate::registry::lock;
use crate::results::ResultSet;
use crate::types::{ParamValue, Row};

use super::{Storage, validate_query_name};

impl<C: StorageConnection> Storage<C> {
    /// Run the named query and return every row.
    ///
    /// A query that matches nothing yields an empty vector.
    ///
    /// # Errors
    /// * `StorageError::InvalidParameter` for a blank name or a rejected parameter value.
    /// * `StorageError::QueryNotFound` if `name` is not registered.
    /// * `StorageError::QueryExecution` if the driver fails.
    pub fn read(&self, name: &str, params: &[ParamValue]) -> Result<Vec<Row>> {
        Ok(self.read_result_set(name, params)?.into_rows())
    }

    /// Like [`Storage::read`] but keeps the column names.
    ///
    /// # Errors
    /// Same as [`Storage::read`].
    pub fn read_result_set(&self, name: &str, params: &[ParamValue]) -> Result<ResultSet> {
        validate_query_name(name)?;
        let shared = self.registry.lookup(name)?;
        let mut stmt = lock(&shared);

        stmt.clear_parameters()
            .map_err(|e| StorageError::execution(name, e))?;
        bind_params(&mut *stmt, name, params, self.config.max_string_param_length())?;
        let result = stmt
            .execute_query()
            .map_err(|e| StorageError::execution(name, e))?;
        tracing::trace!(query = name, rows = result.len(), "query executed");
        Ok(result)
    }
}
