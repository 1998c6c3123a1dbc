use thiserror::Error;

/// Failure reported by a backend connection or compiled statement.
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the storage facade.
///
/// Every variant maps to a stable machine-readable code (see [`StorageError::code`]);
/// execution, commit and rollback errors embed the driver's message text.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Bad or missing argument; always detected before any I/O.
    #[error("{message}")]
    InvalidParameter {
        message: String,
        parameter: Option<String>,
    },

    #[error("Query {0} not found")]
    QueryNotFound(String),

    #[error("Query {query} failed: {source}")]
    QueryExecution {
        query: String,
        #[source]
        source: DriverError,
    },

    #[error("Init error: {0}")]
    Init(#[source] DriverError),

    #[error("Commit failed: {0}")]
    Commit(#[source] DriverError),

    #[error("Rollback failed: {0}")]
    Rollback(#[source] DriverError),
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

impl StorageError {
    pub(crate) fn invalid_parameter(message: impl Into<String>, parameter: &str) -> Self {
        StorageError::InvalidParameter {
            message: message.into(),
            parameter: Some(parameter.to_string()),
        }
    }

    pub(crate) fn execution(query: &str, source: DriverError) -> Self {
        StorageError::QueryExecution {
            query: query.to_string(),
            source,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::InvalidParameter { .. } => "INVALID_PARAMETER",
            StorageError::QueryNotFound(_) => "QUERY_NOT_FOUND",
            StorageError::QueryExecution { .. } => "QUERY_EXECUTION_ERROR",
            StorageError::Init(_) => "INIT_ERROR",
            StorageError::Commit(_) => "COMMIT_ERROR",
            StorageError::Rollback(_) => "ROLLBACK_ERROR",
        }
    }

    /// Name of the offending argument for `INVALID_PARAMETER` errors.
    #[must_use]
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            StorageError::InvalidParameter { parameter, .. } => parameter.as_deref(),
            _ => None,
        }
    }

    /// Query name carried by not-found and execution errors.
    #[must_use]
    pub fn query_name(&self) -> Option<&str> {
        match self {
            StorageError::QueryNotFound(query) | StorageError::QueryExecution { query, .. } => {
                Some(query)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_messages() {
        let err = StorageError::Commit(DriverError::Other("disk full".into()));
        assert_eq!(err.code(), "COMMIT_ERROR");
        assert_eq!(err.to_string(), "Commit failed: disk full");

        let err = StorageError::Rollback(DriverError::Closed);
        assert_eq!(err.code(), "ROLLBACK_ERROR");
        assert_eq!(err.to_string(), "Rollback failed: Connection is closed");

        let err = StorageError::execution("notes.insert", DriverError::Other("boom".into()));
        assert_eq!(err.code(), "QUERY_EXECUTION_ERROR");
        assert_eq!(err.to_string(), "Query notes.insert failed: boom");
        assert_eq!(err.query_name(), Some("notes.insert"));

        let err = StorageError::QueryNotFound("missing".into());
        assert_eq!(err.to_string(), "Query missing not found");
        assert_eq!(err.query_name(), Some("missing"));

        let err = StorageError::invalid_parameter("Invalid query name", "queryName");
        assert_eq!(err.code(), "INVALID_PARAMETER");
        assert_eq!(err.parameter_name(), Some("queryName"));
        assert_eq!(err.query_name(), None);

        let err = StorageError::Init(DriverError::Other("no such table: foo".into()));
        assert_eq!(err.code(), "INIT_ERROR");
        assert!(err.to_string().starts_with("Init error: "));
    }
}
