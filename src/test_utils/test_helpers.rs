//! Helper utilities for testing and development.

use crate::results::ResultSet;
use crate::types::{Row, RowValues};

/// Build a result set from column names and rows.
#[must_use]
pub fn create_result_set(column_names: &[&str], rows: Vec<Row>) -> ResultSet {
    let mut rs = ResultSet::with_columns(column_names.iter().map(|c| (*c).to_string()).collect());
    for row in rows {
        rs.push_row(row);
    }
    rs
}

/// Single-column rows of integers, handy for count/sum style queries.
#[must_use]
pub fn int_rows(column: &str, values: &[i64]) -> ResultSet {
    create_result_set(
        &[column],
        values.iter().map(|v| vec![RowValues::Int(*v)]).collect(),
    )
}
