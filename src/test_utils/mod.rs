//! In-memory backend that records every call the facade makes.
//!
//! Used by unit and integration tests to assert how often the driver entry points are hit
//! and to inject driver failures. Enabled for `cfg(test)` and by the `test-utils` feature.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::{CompiledStatement, StorageConnection};
use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::ParamValue;

pub mod test_helpers;

/// Snapshot of the calls observed by a [`RecordingConnection`] and its statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    pub prepared: Vec<String>,
    pub auto_commit_changes: Vec<bool>,
    pub commits: usize,
    pub rollbacks: usize,
    pub clear_parameters: usize,
    pub execute_updates: usize,
    pub execute_queries: usize,
    pub add_batches: usize,
    /// Number of entries in each executed batch, in firing order
    pub executed_batches: Vec<usize>,
    pub clear_batches: usize,
    pub statement_closes: usize,
    pub connection_closes: usize,
}

#[derive(Debug, Default)]
struct Behavior {
    fail_prepare_containing: Option<String>,
    fail_commit: Option<String>,
    fail_rollback: Option<String>,
    fail_bind_at: Option<usize>,
    fail_execute_batch: Option<String>,
    fail_statement_close: bool,
    update_count: usize,
    query_results: HashMap<String, ResultSet>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Mutex<CallLog>,
    behavior: Mutex<Behavior>,
}

impl Shared {
    fn calls(&self) -> MutexGuard<'_, CallLog> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn behavior(&self) -> MutexGuard<'_, Behavior> {
        self.behavior
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Recording connection; clones share the same log and behavior.
#[derive(Debug, Clone)]
pub struct RecordingConnection {
    shared: Arc<Shared>,
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingConnection {
    /// Open connection whose updates report one affected row.
    #[must_use]
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        shared.behavior().update_count = 1;
        Self { shared }
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.shared.calls().clone()
    }

    /// Affected row count reported by every update and every batch entry.
    pub fn set_update_count(&self, count: usize) {
        self.shared.behavior().update_count = count;
    }

    /// Rows returned when a statement prepared from `sql` is queried.
    pub fn set_query_result(&self, sql: &str, result: ResultSet) {
        self.shared
            .behavior()
            .query_results
            .insert(sql.to_string(), result);
    }

    /// Fail `prepare` for any SQL containing `pattern`.
    pub fn fail_prepare_containing(&self, pattern: &str) {
        self.shared.behavior().fail_prepare_containing = Some(pattern.to_string());
    }

    pub fn fail_commit(&self, message: &str) {
        self.shared.behavior().fail_commit = Some(message.to_string());
    }

    pub fn fail_rollback(&self, message: &str) {
        self.shared.behavior().fail_rollback = Some(message.to_string());
    }

    /// Fail binding at the 1-based position `index`.
    pub fn fail_bind_at(&self, index: usize) {
        self.shared.behavior().fail_bind_at = Some(index);
    }

    pub fn fail_execute_batch(&self, message: &str) {
        self.shared.behavior().fail_execute_batch = Some(message.to_string());
    }

    pub fn fail_statement_close(&self) {
        self.shared.behavior().fail_statement_close = true;
    }

    /// Report the connection as closed without recording a close call.
    pub fn mark_closed(&self) {
        self.shared.behavior().closed = true;
    }
}

impl StorageConnection for RecordingConnection {
    type Statement = RecordingStatement;

    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, DriverError> {
        if let Some(pattern) = &self.shared.behavior().fail_prepare_containing {
            if sql.contains(pattern.as_str()) {
                return Err(DriverError::Other(format!("syntax error near \"{pattern}\"")));
            }
        }
        self.shared.calls().prepared.push(sql.to_string());
        Ok(RecordingStatement {
            sql: sql.to_string(),
            shared: Arc::clone(&self.shared),
            bound: Vec::new(),
            batch: Vec::new(),
        })
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), DriverError> {
        self.shared.calls().auto_commit_changes.push(auto_commit);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.shared.calls().commits += 1;
        match &self.shared.behavior().fail_commit {
            Some(message) => Err(DriverError::Other(message.clone())),
            None => Ok(()),
        }
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.shared.calls().rollbacks += 1;
        match &self.shared.behavior().fail_rollback {
            Some(message) => Err(DriverError::Other(message.clone())),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.shared.behavior().closed
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.shared.calls().connection_closes += 1;
        self.shared.behavior().closed = true;
        Ok(())
    }
}

/// Statement handed out by [`RecordingConnection::prepare`].
#[derive(Debug)]
pub struct RecordingStatement {
    sql: String,
    shared: Arc<Shared>,
    bound: Vec<ParamValue>,
    batch: Vec<Vec<ParamValue>>,
}

impl RecordingStatement {
    /// Currently bound parameters in position order (unbound gaps are NULL).
    #[must_use]
    pub fn bound(&self) -> Vec<ParamValue> {
        self.bound.clone()
    }

    /// Number of queued batch entries.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.batch.len()
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl CompiledStatement for RecordingStatement {
    fn clear_parameters(&mut self) -> Result<(), DriverError> {
        self.shared.calls().clear_parameters += 1;
        self.bound.clear();
        Ok(())
    }

    fn bind(&mut self, index: usize, value: &ParamValue) -> Result<(), DriverError> {
        if self.shared.behavior().fail_bind_at == Some(index) {
            return Err(DriverError::Other(format!("cannot bind parameter {index}")));
        }
        if index == 0 {
            return Err(DriverError::Other("parameter index out of range: 0".into()));
        }
        if self.bound.len() < index {
            self.bound.resize(index, ParamValue::Null);
        }
        self.bound[index - 1] = value.clone();
        Ok(())
    }

    fn execute_update(&mut self) -> Result<usize, DriverError> {
        self.shared.calls().execute_updates += 1;
        Ok(self.shared.behavior().update_count)
    }

    fn execute_query(&mut self) -> Result<ResultSet, DriverError> {
        self.shared.calls().execute_queries += 1;
        Ok(self
            .shared
            .behavior()
            .query_results
            .get(&self.sql)
            .cloned()
            .unwrap_or_default())
    }

    fn add_batch(&mut self) -> Result<(), DriverError> {
        self.shared.calls().add_batches += 1;
        self.batch.push(self.bound.clone());
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<usize>, DriverError> {
        self.shared.calls().executed_batches.push(self.batch.len());
        let behavior = self.shared.behavior();
        if let Some(message) = &behavior.fail_execute_batch {
            return Err(DriverError::Other(message.clone()));
        }
        Ok(vec![behavior.update_count; self.batch.len()])
    }

    fn clear_batch(&mut self) -> Result<(), DriverError> {
        self.shared.calls().clear_batches += 1;
        self.batch.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.shared.calls().statement_closes += 1;
        if self.shared.behavior().fail_statement_close {
            return Err(DriverError::Other("statement close failed".into()));
        }
        Ok(())
    }
}
