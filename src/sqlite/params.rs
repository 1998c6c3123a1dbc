use rusqlite::types::Value;

use crate::types::ParamValue;

/// Convert a single `ParamValue` to a rusqlite `Value`.
///
/// `SQLite` has no date or decimal storage class: dates, timestamps and decimals are stored
/// as text in a form that sorts correctly and round-trips through [`crate::RowValues`].
#[must_use]
pub fn param_to_sqlite_value(value: &ParamValue) -> Value {
    match value {
        ParamValue::Null => Value::Null,
        ParamValue::Text(s) | ParamValue::Decimal(s) => Value::Text(s.clone()),
        ParamValue::Int(i) => Value::Integer(i64::from(*i)),
        ParamValue::Long(i) => Value::Integer(*i),
        ParamValue::Date(d) => Value::Text(d.format("%F").to_string()),
        ParamValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        ParamValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}
