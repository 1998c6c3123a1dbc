use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `DriverError::Sqlite` if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, DriverError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run `stmt` with `params` and materialize every row.
///
/// A DML statement is executed too and yields an empty result.
///
/// # Errors
/// Returns `DriverError::Sqlite` if binding, stepping or value extraction fails.
pub fn build_result_set(stmt: &mut Statement<'_>, params: &[Value]) -> Result<ResultSet, DriverError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();
    let mut result_set = ResultSet::with_columns(column_names);

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value(row, i)?);
        }
        result_set.push_row(row_values);
    }

    Ok(result_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_rows_with_column_names() -> Result<(), DriverError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, name TEXT, score REAL, data BLOB);
             INSERT INTO t VALUES (1, 'ann', 1.5, x'0102');
             INSERT INTO t VALUES (2, NULL, NULL, NULL);",
        )?;
        let mut stmt = conn.prepare("SELECT id, name, score, data FROM t WHERE id >= ? ORDER BY id")?;
        let rs = build_result_set(&mut stmt, &[Value::Integer(1)])?;

        assert_eq!(rs.column_names(), ["id", "name", "score", "data"]);
        assert_eq!(rs.len(), 2);
        assert_eq!(
            rs.rows()[0],
            vec![
                RowValues::Int(1),
                RowValues::Text("ann".into()),
                RowValues::Float(1.5),
                RowValues::Blob(vec![1, 2]),
            ]
        );
        assert!(rs.rows()[1][1..].iter().all(RowValues::is_null));
        Ok(())
    }

    #[test]
    fn empty_match_keeps_columns() -> Result<(), DriverError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        let mut stmt = conn.prepare("SELECT 1 AS one WHERE 0")?;
        let rs = build_result_set(&mut stmt, &[])?;
        assert!(rs.is_empty());
        assert_eq!(rs.column_index("one"), Some(0));
        Ok(())
    }
}
