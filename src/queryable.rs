use crate::backend::StorageConnection;
use crate::error::Result;
use crate::storage::Storage;
use crate::types::{ParamValue, Row, RowValues};

/// Operations offered by a named-query store.
///
/// Only the core operations are required; the single-row, single-value, column and
/// iterator helpers are all expressed through [`QueryableStorage::read`].
pub trait QueryableStorage {
    /// Execute a write with the default batch size.
    ///
    /// # Errors
    /// Returns a `StorageError` if validation, lookup or execution fails.
    fn write(&self, name: &str, params: &[ParamValue]) -> Result<usize>;

    /// Execute or queue a write; see [`Storage::write_batched`].
    ///
    /// # Errors
    /// Returns a `StorageError` if validation, lookup or execution fails.
    fn write_batched(&self, name: &str, params: &[ParamValue], batch_size: usize) -> Result<usize>;

    /// Run a query and return every row.
    ///
    /// # Errors
    /// Returns a `StorageError` if validation, lookup or execution fails.
    fn read(&self, name: &str, params: &[ParamValue]) -> Result<Vec<Row>>;

    /// # Errors
    /// Returns `StorageError::Commit` if the connection fails to commit.
    fn commit(&self) -> Result<()>;

    /// # Errors
    /// Returns `StorageError::Rollback` if the connection fails to roll back.
    fn rollback(&self) -> Result<()>;

    fn close(&self);

    /// First row of the result, if any.
    ///
    /// # Errors
    /// Same as [`QueryableStorage::read`].
    fn read_single(&self, name: &str, params: &[ParamValue]) -> Result<Option<Row>> {
        Ok(self.read(name, params)?.into_iter().next())
    }

    /// First column of the first row, if any.
    ///
    /// # Errors
    /// Same as [`QueryableStorage::read`].
    fn read_single_value(&self, name: &str, params: &[ParamValue]) -> Result<Option<RowValues>> {
        Ok(self
            .read_single(name, params)?
            .and_then(|row| row.into_iter().next()))
    }

    /// First column of every row.
    ///
    /// # Errors
    /// Same as [`QueryableStorage::read`].
    fn read_column_values(&self, name: &str, params: &[ParamValue]) -> Result<Vec<RowValues>> {
        Ok(self
            .read(name, params)?
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }

    /// Rows as an iterator. The rows are fully read before the iterator is returned.
    ///
    /// # Errors
    /// Same as [`QueryableStorage::read`].
    fn read_as_stream(&self, name: &str, params: &[ParamValue]) -> Result<std::vec::IntoIter<Row>> {
        Ok(self.read(name, params)?.into_iter())
    }
}

impl<C: StorageConnection> QueryableStorage for Storage<C> {
    fn write(&self, name: &str, params: &[ParamValue]) -> Result<usize> {
        Storage::write(self, name, params)
    }

    fn write_batched(&self, name: &str, params: &[ParamValue], batch_size: usize) -> Result<usize> {
        Storage::write_batched(self, name, params, batch_size)
    }

    fn read(&self, name: &str, params: &[ParamValue]) -> Result<Vec<Row>> {
        Storage::read(self, name, params)
    }

    fn commit(&self) -> Result<()> {
        Storage::commit(self)
    }

    fn rollback(&self) -> Result<()> {
        Storage::rollback(self)
    }

    fn close(&self) {
        Storage::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::queries::QuerySet;
    use crate::test_utils::RecordingConnection;
    use crate::test_utils::test_helpers::create_result_set;

    fn storage_with_rows(rows: Vec<Row>) -> Storage<RecordingConnection> {
        let conn = RecordingConnection::new();
        conn.set_query_result(
            "select id, name from users",
            create_result_set(&["id", "name"], rows),
        );
        let queries: QuerySet = [("users.all", "select id, name from users")]
            .into_iter()
            .collect();
        Storage::new(conn, &queries, StorageConfig::default()).unwrap()
    }

    #[test]
    fn convenience_reads_on_empty_results() {
        let storage = storage_with_rows(vec![]);
        let store: &dyn QueryableStorage = &storage;
        assert!(store.read("users.all", &[]).unwrap().is_empty());
        assert_eq!(store.read_single("users.all", &[]).unwrap(), None);
        assert_eq!(store.read_single_value("users.all", &[]).unwrap(), None);
        assert!(store.read_column_values("users.all", &[]).unwrap().is_empty());
        assert_eq!(store.read_as_stream("users.all", &[]).unwrap().count(), 0);
    }

    #[test]
    fn convenience_reads_project_rows() {
        let storage = storage_with_rows(vec![
            vec![RowValues::Int(1), RowValues::Text("ann".into())],
            vec![RowValues::Int(2), RowValues::Text("bob".into())],
        ]);
        let store: &dyn QueryableStorage = &storage;
        assert_eq!(
            store.read_single("users.all", &[]).unwrap(),
            Some(vec![RowValues::Int(1), RowValues::Text("ann".into())])
        );
        assert_eq!(
            store.read_single_value("users.all", &[]).unwrap(),
            Some(RowValues::Int(1))
        );
        assert_eq!(
            store.read_column_values("users.all", &[]).unwrap(),
            vec![RowValues::Int(1), RowValues::Int(2)]
        );
        let names: Vec<String> = store
            .read_as_stream("users.all", &[])
            .unwrap()
            .filter_map(|row| row[1].as_text().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["ann", "bob"]);
    }

    #[test]
    fn convenience_reads_propagate_lookup_errors() {
        let storage = storage_with_rows(vec![]);
        let err = storage.read_single("users.none", &[]).unwrap_err();
        assert_eq!(err.code(), "QUERY_NOT_FOUND");
    }
}
