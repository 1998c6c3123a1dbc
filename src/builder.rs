use std::io::Read;
use std::path::Path;

use crate::backend::StorageConnection;
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::queries::QuerySet;
use crate::storage::Storage;

/// Fluent builder for [`Storage`].
///
/// Query sources can be combined; a name defined more than once keeps its last definition.
/// ```rust,no_run
/// use sqlrunner::prelude::*;
///
/// # fn main() -> Result<(), StorageError> {
/// let storage = Storage::sqlite_builder()
///     .connection_from_path("app.db")?
///     .queries_from_file("sql/queries.properties")?
///     .add_query("users.count", "SELECT COUNT(*) FROM users")
///     .config(StorageConfig::builder().auto_commit(false).build()?)
///     .build()?;
/// # let _ = storage;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StorageBuilder<C> {
    pub(crate) connection: Option<C>,
    queries: Option<QuerySet>,
    config: StorageConfig,
}

impl<C> Default for StorageBuilder<C> {
    fn default() -> Self {
        Self {
            connection: None,
            queries: None,
            config: StorageConfig::default(),
        }
    }
}

impl<C: StorageConnection> StorageBuilder<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn connection(mut self, connection: C) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Use `queries` as the query definitions, replacing any added so far.
    #[must_use]
    pub fn queries(mut self, queries: QuerySet) -> Self {
        self.queries = Some(queries);
        self
    }

    /// Add (or replace) a single query.
    #[must_use]
    pub fn add_query(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.queries
            .get_or_insert_with(QuerySet::new)
            .insert(name, sql);
        self
    }

    /// Load definitions from a properties or `.json` file and merge them in.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the file is missing or malformed.
    pub fn queries_from_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let loaded = QuerySet::from_file(path)?;
        self.queries.get_or_insert_with(QuerySet::new).extend(loaded);
        Ok(self)
    }

    /// Load properties-format definitions from a stream and merge them in.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the stream cannot be read.
    pub fn queries_from_reader<R: Read>(mut self, reader: R) -> Result<Self> {
        let loaded = QuerySet::from_reader(reader)?;
        self.queries.get_or_insert_with(QuerySet::new).extend(loaded);
        Ok(self)
    }

    #[must_use]
    pub fn config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the facade.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if no connection or no queries were given,
    /// plus everything [`Storage::new`] can return.
    pub fn build(self) -> Result<Storage<C>> {
        let Some(connection) = self.connection else {
            return Err(StorageError::invalid_parameter(
                "Connection is required",
                "connection",
            ));
        };
        let queries = match self.queries {
            Some(queries) if !queries.is_empty() => queries,
            _ => {
                return Err(StorageError::invalid_parameter(
                    "Queries are required",
                    "queries",
                ));
            }
        };
        Storage::new(connection, &queries, self.config)
    }
}

impl<C: StorageConnection> Storage<C> {
    #[must_use]
    pub fn builder() -> StorageBuilder<C> {
        StorageBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingConnection;

    #[test]
    fn requires_connection_and_queries() {
        let err = StorageBuilder::<RecordingConnection>::new()
            .add_query("q", "select 1")
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Connection is required");
        assert_eq!(err.parameter_name(), Some("connection"));

        let err = Storage::builder()
            .connection(RecordingConnection::new())
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Queries are required");

        let err = Storage::builder()
            .connection(RecordingConnection::new())
            .queries(QuerySet::new())
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Queries are required");
    }

    #[test]
    fn combines_query_sources() {
        let storage = Storage::builder()
            .connection(RecordingConnection::new())
            .queries_from_reader("a=select 1\nb=select 2\n".as_bytes())
            .unwrap()
            .add_query("b", "select 3")
            .add_query("c", "select 4")
            .build()
            .unwrap();
        assert_eq!(storage.query_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn default_config_is_used() {
        let storage = Storage::builder()
            .connection(RecordingConnection::new())
            .add_query("q", "select 1")
            .build()
            .unwrap();
        assert_eq!(*storage.config(), StorageConfig::default());
    }
}
