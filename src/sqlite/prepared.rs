use std::fmt;
use std::sync::Arc;

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::backend::CompiledStatement;
use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::ParamValue;

use super::connection::SqliteConnection;
use super::params::param_to_sqlite_value;
use super::query::build_result_set;

/// A statement registered on a [`SqliteConnection`].
///
/// The handle keeps the SQL text and its own bindings; the compiled statement itself lives
/// in the connection's statement cache and is fetched with `prepare_cached` for every
/// execution. Batch entries are bound snapshots replayed in order by
/// [`CompiledStatement::execute_batch`].
pub struct SqliteStatement {
    connection: SqliteConnection,
    sql: Arc<str>,
    bound: Vec<Value>,
    batch: Vec<Vec<Value>>,
    closed: bool,
}

impl SqliteStatement {
    pub(crate) fn new(connection: SqliteConnection, sql: &str) -> Self {
        Self {
            connection,
            sql: Arc::from(sql),
            bound: Vec::new(),
            batch: Vec::new(),
            closed: false,
        }
    }

    /// Access the raw SQL string of the prepared statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of queued batch entries.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.batch.len()
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Other("Statement is closed".to_string()));
        }
        Ok(())
    }
}

impl CompiledStatement for SqliteStatement {
    fn clear_parameters(&mut self) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.bound.clear();
        Ok(())
    }

    fn bind(&mut self, index: usize, value: &ParamValue) -> Result<(), DriverError> {
        self.ensure_open()?;
        if index == 0 {
            return Err(DriverError::Other(
                "Parameter index out of range: 0".to_string(),
            ));
        }
        if self.bound.len() < index {
            self.bound.resize(index, Value::Null);
        }
        self.bound[index - 1] = param_to_sqlite_value(value);
        Ok(())
    }

    fn execute_update(&mut self) -> Result<usize, DriverError> {
        self.ensure_open()?;
        let sql = Arc::clone(&self.sql);
        let bound = &self.bound;
        self.connection.run(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            Ok(stmt.execute(params_from_iter(bound.iter()))?)
        })
    }

    fn execute_query(&mut self) -> Result<ResultSet, DriverError> {
        self.ensure_open()?;
        let sql = Arc::clone(&self.sql);
        let bound = &self.bound;
        self.connection.run(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            build_result_set(&mut stmt, bound)
        })
    }

    fn add_batch(&mut self) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.batch.push(self.bound.clone());
        Ok(())
    }

    // Entries run in order; a failure stops the batch and earlier entries stay applied.
    fn execute_batch(&mut self) -> Result<Vec<usize>, DriverError> {
        self.ensure_open()?;
        let sql = Arc::clone(&self.sql);
        let batch = &self.batch;
        self.connection.run(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let mut counts = Vec::with_capacity(batch.len());
            for entry in batch {
                counts.push(stmt.execute(params_from_iter(entry.iter()))?);
            }
            Ok(counts)
        })
    }

    fn clear_batch(&mut self) -> Result<(), DriverError> {
        self.batch.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.closed = true;
        self.bound.clear();
        self.batch.clear();
        Ok(())
    }
}

impl fmt::Debug for SqliteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStatement")
            .field("sql", &self.sql)
            .field("bound", &self.bound.len())
            .field("queued", &self.batch.len())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StorageConnection;
    use crate::types::RowValues;

    fn users() -> Result<SqliteConnection, DriverError> {
        let conn = SqliteConnection::open_in_memory()?;
        conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
        Ok(conn)
    }

    #[test]
    fn rebinding_replaces_previous_values() -> Result<(), DriverError> {
        let mut conn = users()?;
        let mut insert = conn.prepare("INSERT INTO users (id, name) VALUES (?, ?)")?;
        insert.bind(1, &ParamValue::Int(1))?;
        insert.bind(2, &ParamValue::from("ann"))?;
        assert_eq!(insert.execute_update()?, 1);

        insert.clear_parameters()?;
        insert.bind(1, &ParamValue::Int(2))?;
        insert.bind(2, &ParamValue::Null)?;
        assert_eq!(insert.execute_update()?, 1);

        let mut select = conn.prepare("SELECT name FROM users ORDER BY id")?;
        let rs = select.execute_query()?;
        assert_eq!(
            rs.into_rows(),
            vec![vec![RowValues::Text("ann".into())], vec![RowValues::Null]]
        );
        Ok(())
    }

    #[test]
    fn missing_parameter_fails_execution() -> Result<(), DriverError> {
        let mut conn = users()?;
        let mut insert = conn.prepare("INSERT INTO users (id, name) VALUES (?, ?)")?;
        insert.bind(1, &ParamValue::Int(1))?;
        assert!(insert.execute_update().is_err());
        assert!(insert.bind(0, &ParamValue::Null).is_err());
        Ok(())
    }

    #[test]
    fn batch_replays_snapshots_in_order() -> Result<(), DriverError> {
        let mut conn = users()?;
        let mut insert = conn.prepare("INSERT INTO users (id, name) VALUES (?, ?)")?;
        for id in 1..=3 {
            insert.clear_parameters()?;
            insert.bind(1, &ParamValue::Int(id))?;
            insert.bind(2, &ParamValue::from(format!("user{id}")))?;
            insert.add_batch()?;
        }
        assert_eq!(insert.queued(), 3);
        assert_eq!(insert.execute_batch()?, vec![1, 1, 1]);
        insert.clear_batch()?;
        assert_eq!(insert.queued(), 0);

        let count: i64 =
            conn.with_connection(|c| Ok(c.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))?;
        assert_eq!(count, 3);
        Ok(())
    }

    #[test]
    fn closed_statement_rejects_work() -> Result<(), DriverError> {
        let mut conn = users()?;
        let mut select = conn.prepare("SELECT 1")?;
        select.close()?;
        assert!(select.execute_query().is_err());
        assert!(select.bind(1, &ParamValue::Null).is_err());
        Ok(())
    }
}
