//! Database error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// The database file could not be opened or configured.
    #[error("Cannot open database: {0}")]
    Open(String),

    /// A statement failed inside SQLite.
    #[error("SQLite error: {0}")]
    Sqlite(String),

    /// A column could not be read as the requested type.
    #[error("Column type mismatch: {0}")]
    ColumnType(String),

    /// A row did not match the shape of the target struct.
    #[error("Cannot decode row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Database connection poisoned")]
    LockPoisoned,

    /// `query_one` matched nothing.
    #[error("No rows returned")]
    NotFound,
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound,
            rusqlite::Error::FromSqlConversionFailure(index, ty, inner) => {
                DbError::ColumnType(format!("column {index} ({ty}): {inner}"))
            }
            rusqlite::Error::InvalidColumnType(index, name, ty) => {
                DbError::ColumnType(format!("column {index} `{name}` is {ty}"))
            }
            other => DbError::Sqlite(other.to_string()),
        }
    }
}
