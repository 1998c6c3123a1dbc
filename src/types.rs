use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::StorageError;

/// Values that can be bound to a registered query as positional parameters.
///
/// The set of kinds is closed; anything else must be converted by the caller first.
/// ```rust
/// use sqlrunner::prelude::*;
///
/// let params = vec![
///     ParamValue::Long(1),
///     ParamValue::from("alice"),
///     ParamValue::Null,
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// SQL NULL
    Null,
    /// Text, subject to the configured maximum length
    Text(String),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// Calendar date
    Date(NaiveDate),
    /// Exact decimal, kept in its textual form so no precision is lost
    Decimal(String),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Binary data, bound with its exact length
    Blob(Vec<u8>),
}

impl ParamValue {
    /// Short name of the value kind, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Text(_) => "text",
            ParamValue::Int(_) => "int",
            ParamValue::Long(_) => "long",
            ParamValue::Date(_) => "date",
            ParamValue::Decimal(_) => "decimal",
            ParamValue::Timestamp(_) => "timestamp",
            ParamValue::Blob(_) => "blob",
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Long(value)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        ParamValue::Date(value)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(value: NaiveDateTime) -> Self {
        ParamValue::Timestamp(value)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        ParamValue::Blob(value)
    }
}

impl From<&[u8]> for ParamValue {
    fn from(value: &[u8]) -> Self {
        ParamValue::Blob(value.to_vec())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParamValue::Null, Into::into)
    }
}

/// Convert a JSON literal into a parameter.
///
/// Only `null`, integers and strings have a parameter kind; everything else is
/// rejected as an unsupported data type.
impl TryFrom<JsonValue> for ParamValue {
    type Error = StorageError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        let kind = match value {
            JsonValue::Null => return Ok(ParamValue::Null),
            JsonValue::String(s) => return Ok(ParamValue::Text(s)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => {
                    return Ok(i32::try_from(i).map_or(ParamValue::Long(i), ParamValue::Int));
                }
                None => "float",
            },
            JsonValue::Bool(_) => "boolean",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        };
        Err(StorageError::invalid_parameter(
            format!("Unsupported data type for query parameter: {kind}"),
            "param",
        ))
    }
}

/// A single column value read back from a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// NULL value
    Null,
    /// Binary data
    Blob(Vec<u8>),
}

/// One result record: column values in select-list order.
pub type Row = Vec<RowValues>;

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Interpret a textual column as a date (`YYYY-MM-DD`).
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        let s = self.as_text()?;
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        let s = self.as_text()?;
        // Try "YYYY-MM-DD HH:MM:SS"
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Some(dt);
        }
        // Fractional seconds of any precision
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_literals_convert_to_params() {
        assert_eq!(ParamValue::try_from(json!(null)).unwrap(), ParamValue::Null);
        assert_eq!(ParamValue::try_from(json!(7)).unwrap(), ParamValue::Int(7));
        assert_eq!(
            ParamValue::try_from(json!(5_000_000_000_i64)).unwrap(),
            ParamValue::Long(5_000_000_000)
        );
        assert_eq!(
            ParamValue::try_from(json!("abc")).unwrap(),
            ParamValue::Text("abc".into())
        );
    }

    #[test]
    fn unsupported_json_kinds_are_rejected() {
        for (value, kind) in [
            (json!(1.5), "float"),
            (json!(true), "boolean"),
            (json!([1, 2]), "array"),
            (json!({"a": 1}), "object"),
        ] {
            let err = ParamValue::try_from(value).unwrap_err();
            assert_eq!(err.code(), "INVALID_PARAMETER");
            assert_eq!(err.parameter_name(), Some("param"));
            assert_eq!(
                err.to_string(),
                format!("Unsupported data type for query parameter: {kind}")
            );
        }
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(ParamValue::from(None::<i64>), ParamValue::Null);
        assert_eq!(ParamValue::from(Some("x")), ParamValue::Text("x".into()));
    }

    #[test]
    fn row_value_accessors() {
        let ts = RowValues::Text("2024-01-01 08:00:01.250".into());
        assert_eq!(
            ts.as_timestamp().unwrap(),
            NaiveDateTime::parse_from_str("2024-01-01 08:00:01.250", "%Y-%m-%d %H:%M:%S%.f")
                .unwrap()
        );
        assert_eq!(
            RowValues::Text("2024-02-29".into()).as_date(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(RowValues::Int(3).as_float(), Some(3.0));
        assert!(RowValues::Null.is_null());
        assert_eq!(RowValues::Blob(vec![1, 2]).as_blob(), Some(&[1u8, 2][..]));
        assert_eq!(
            serde_json::to_string(&vec![RowValues::Int(1), RowValues::Null]).unwrap(),
            "[1,null]"
        );
    }
}
