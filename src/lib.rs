//! Named-query storage over a single SQL connection.
//!
//! SQL statements are registered under names once, compiled up front, and executed by name
//! with positional parameters. Writes can be grouped into batches per query, and the
//! facade can run in auto-commit or manual-commit mode.
//!
//! ```rust,no_run
//! use sqlrunner::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let conn = SqliteConnection::open_in_memory()?;
//! conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let storage = Storage::builder()
//!     .connection(conn)
//!     .add_query("users.insert", "INSERT INTO users (id, name) VALUES (?, ?)")
//!     .add_query("users.by_id", "SELECT name FROM users WHERE id = ?")
//!     .build()?;
//!
//! storage.write(
//!     "users.insert",
//!     &[ParamValue::Int(1), ParamValue::from("ann")],
//! )?;
//! let rows = storage.read("users.by_id", &[ParamValue::Int(1)])?;
//! assert_eq!(rows[0][0].as_text(), Some("ann"));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod error;
pub mod nonblocking;
pub mod prelude;
pub mod queries;
pub mod queryable;
pub mod results;
pub mod types;

mod batch;
mod binder;
mod registry;
mod storage;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use backend::{CompiledStatement, StorageConnection};
pub use builder::StorageBuilder;
pub use config::StorageConfig;
pub use error::{DriverError, StorageError};
pub use nonblocking::AsyncStorage;
pub use queries::QuerySet;
pub use queryable::QueryableStorage;
pub use results::ResultSet;
pub use storage::Storage;
pub use types::{ParamValue, Row, RowValues};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteStatement};
