//! Type-safe SQLite database layer for the Cellar storefront.
//!
//! Wraps a single `rusqlite` connection with a small, ergonomic API:
//! positional parameters built with [`params!`], rows deserialized through
//! serde, closures run inside transactions, and forward-only migrations.
//!
//! # Example
//!
//! ```rust,ignore
//! use cellar_db::{Db, Executor, params};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Item {
//!     id: i64,
//!     name: String,
//!     stock: i64,
//! }
//!
//! let db = Db::open("cellar.db")?;
//!
//! db.execute(
//!     "INSERT INTO items (name, stock) VALUES (?, ?)",
//!     params!["Chianti Classico", 24]
//! )?;
//!
//! let low: Vec<Item> = db.query_as(
//!     "SELECT id, name, stock FROM items WHERE stock < ?",
//!     params![5]
//! )?;
//! ```

mod db;
mod error;
mod migrate;
mod types;

pub use db::{Db, Executor, Tx};
pub use error::DbError;
pub use migrate::Migration;
pub use types::{QueryResult, Row, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{params, Db, DbError, Executor, Migration, QueryResult, Row, Tx, Value};
}

/// Create a parameter list for SQL queries.
///
/// # Example
///
/// ```rust,ignore
/// use cellar_db::params;
///
/// let params = params!["value1", 42, 3.14];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[]
    };
    ($($param:expr),+ $(,)?) => {
        &[$($crate::Value::from($param)),+]
    };
}
