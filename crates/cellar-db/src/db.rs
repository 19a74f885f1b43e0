//! Database connection and query execution.

use crate::{DbError, QueryResult, Value};
use rusqlite::{params_from_iter, Connection, TransactionBehavior};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite database connection.
///
/// Provides type-safe query execution with automatic result deserialization.
/// The connection is guarded by a mutex so a single `Db` can be shared
/// across threads; async callers should reach it from a blocking task.
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Open (or create) a database file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let db = Db::open("cellar.db")?;
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| DbError::Open(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DbError::Open(e.to_string()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| DbError::Open(e.to_string()))?;
        tracing::debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Open(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DbError::Open(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Run `f` inside an immediate transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back on `Err`.
    /// `BEGIN IMMEDIATE` takes the write lock up front, so two transactions
    /// never interleave their reads and writes.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// db.transaction(|tx| {
    ///     tx.execute("UPDATE items SET stock = stock - ? WHERE id = ?", params![1, 7])?;
    ///     tx.execute("DELETE FROM cart_lines WHERE user_id = ?", params![3])?;
    ///     Ok::<_, DbError>(())
    /// })?;
    /// ```
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Tx<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let out = f(&Tx { conn: &tx })?;
        tx.commit().map_err(DbError::from)?;
        Ok(out)
    }
}

/// A handle to an open transaction.
///
/// Offers the same [`Executor`] surface as [`Db`]; every statement runs
/// inside the enclosing transaction.
pub struct Tx<'c> {
    conn: &'c Connection,
}

/// Anything that can run statements: a [`Db`] or an open [`Tx`].
///
/// Store types are generic over this trait so the same code runs either
/// standalone or as part of a larger transaction.
pub trait Executor {
    /// Execute a SQL statement that doesn't return rows.
    ///
    /// Use this for INSERT, UPDATE, DELETE, CREATE TABLE, etc. Returns the
    /// number of rows changed.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// db.execute(
    ///     "INSERT INTO items (name, price) VALUES (?, ?)",
    ///     params!["Malbec Reserva", 450000]
    /// )?;
    /// ```
    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize, DbError>;

    /// Execute several semicolon-separated statements without parameters.
    fn execute_batch(&self, sql: &str) -> Result<(), DbError>;

    /// Execute a SQL query and return raw results.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let result = db.query("SELECT * FROM items WHERE price < ?", params![500000])?;
    /// for row in result.iter() {
    ///     let name = row.get("name").and_then(|v| v.as_text());
    ///     println!("Item: {:?}", name);
    /// }
    /// ```
    fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult, DbError>;

    /// Execute a SQL query and deserialize results into a vector.
    fn query_as<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>, DbError> {
        self.query(sql, params)?.deserialize_all()
    }

    /// Execute a SQL query and return exactly one row.
    ///
    /// Returns `DbError::NotFound` if no rows are returned.
    fn query_one<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> Result<T, DbError> {
        self.query_optional(sql, params)?.ok_or(DbError::NotFound)
    }

    /// Execute a SQL query and return at most one row.
    fn query_optional<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<T>, DbError> {
        match self.query(sql, params)?.first() {
            Some(row) => row.deserialize().map(Some),
            None => Ok(None),
        }
    }
}

impl Executor for Db {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize, DbError> {
        let conn = self.lock()?;
        execute(&conn, sql, params)
    }

    fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult, DbError> {
        let conn = self.lock()?;
        query(&conn, sql, params)
    }
}

impl Executor for Tx<'_> {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize, DbError> {
        execute(self.conn, sql, params)
    }

    fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult, DbError> {
        query(self.conn, sql, params)
    }
}

fn execute(conn: &Connection, sql: &str, params: &[Value]) -> Result<usize, DbError> {
    let changed = conn.execute(sql, params_from_iter(params.iter()))?;
    Ok(changed)
}

fn query(conn: &Connection, sql: &str, params: &[Value]) -> Result<QueryResult, DbError> {
    let mut stmt = conn.prepare(sql)?;
    QueryResult::read(&mut stmt, params)
}
