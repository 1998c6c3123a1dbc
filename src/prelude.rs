//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types
//! to make it easier to get started with the library.

pub use crate::backend::{CompiledStatement, StorageConnection};
pub use crate::builder::StorageBuilder;
pub use crate::config::StorageConfig;
pub use crate::error::{DriverError, StorageError};
pub use crate::nonblocking::AsyncStorage;
pub use crate::queries::QuerySet;
pub use crate::queryable::QueryableStorage;
pub use crate::results::ResultSet;
pub use crate::storage::Storage;
pub use crate::types::{ParamValue, Row, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteStatement};
