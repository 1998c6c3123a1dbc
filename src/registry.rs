use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::backend::{CompiledStatement, StorageConnection};
use crate::error::{DriverError, Result, StorageError};
use crate::queries::QuerySet;

/// A compiled statement together with the lock that guards its bindings and batch buffer.
pub(crate) type SharedStatement<S> = Arc<Mutex<S>>;

/// Lock a mutex, recovering the data if another thread panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Compiled statements by query name, fixed at construction.
pub(crate) struct QueryRegistry<S> {
    statements: RwLock<HashMap<String, SharedStatement<S>>>,
}

impl<S: CompiledStatement> QueryRegistry<S> {
    /// Prepare one statement per query. On failure every statement prepared so far is
    /// closed and nothing is returned.
    pub(crate) fn prepare<C>(conn: &mut C, queries: &QuerySet) -> Result<Self, DriverError>
    where
        C: StorageConnection<Statement = S>,
    {
        let mut statements = HashMap::with_capacity(queries.len());
        for (name, sql) in queries.iter() {
            match conn.prepare(sql) {
                Ok(stmt) => {
                    statements.insert(name.to_string(), Arc::new(Mutex::new(stmt)));
                }
                Err(e) => {
                    for stmt in statements.values() {
                        let _ = lock(stmt).close();
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self {
            statements: RwLock::new(statements),
        })
    }

    /// Statement registered under `name`.
    pub(crate) fn lookup(&self, name: &str) -> Result<SharedStatement<S>> {
        let statements = self.statements.read().unwrap_or_else(PoisonError::into_inner);
        statements
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::QueryNotFound(name.to_string()))
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let statements = self.statements.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = statements.keys().cloned().collect();
        names.sort();
        names
    }

    /// Close and forget every statement, returning the errors met along the way.
    pub(crate) fn close_all(&self) -> Vec<(String, DriverError)> {
        let drained: Vec<(String, SharedStatement<S>)> = {
            let mut statements = self.statements.write().unwrap_or_else(PoisonError::into_inner);
            statements.drain().collect()
        };
        let mut errors = Vec::new();
        for (name, stmt) in drained {
            if let Err(e) = lock(&stmt).close() {
                errors.push((name, e));
            }
        }
        errors
    }
}
