use std::sync::Arc;

use crate::types::{Row, RowValues};

/// Rows produced by a query, with the column names reported by the driver.
///
/// Every row holds exactly [`ResultSet::column_count`] values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    column_names: Arc<Vec<String>>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Create an empty result set for the given columns
    #[must_use]
    pub fn with_columns(column_names: Vec<String>) -> Self {
        Self {
            column_names: Arc::new(column_names),
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Index of a column by name
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Append a row. Missing trailing values are filled with NULL and extra values dropped,
    /// so the row always matches the column count.
    pub fn push_row(&mut self, mut values: Row) {
        values.resize(self.column_count(), RowValues::Null);
        self.rows.push(values);
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Value at `row` for the named column
    #[must_use]
    pub fn get(&self, row: usize, column_name: &str) -> Option<&RowValues> {
        let idx = self.column_index(column_name)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_shaped_to_the_columns() {
        let mut rs = ResultSet::with_columns(vec!["id".into(), "name".into()]);
        rs.push_row(vec![RowValues::Int(1)]);
        rs.push_row(vec![
            RowValues::Int(2),
            RowValues::Text("b".into()),
            RowValues::Int(99),
        ]);
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.rows()[0], vec![RowValues::Int(1), RowValues::Null]);
        assert_eq!(rs.rows()[1].len(), 2);
        assert_eq!(rs.get(1, "name"), Some(&RowValues::Text("b".into())));
        assert_eq!(rs.get(0, "missing"), None);
    }
}
