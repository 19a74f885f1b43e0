//! SQLite-backed stores.
//!
//! Each store borrows an [`Executor`](cellar_db::Executor), so it can run
//! against the shared [`Db`] or inside a transaction opened with
//! [`Db::transaction`].

mod carts;
mod items;
mod orders;
mod schema;

pub use carts::CartStore;
pub use items::ItemStore;
pub use orders::OrderStore;
pub use schema::MIGRATIONS;

use crate::error::CommerceError;
use cellar_db::Db;

/// Apply the storefront migrations. Returns how many were newly applied.
pub fn migrate(db: &Db) -> Result<usize, CommerceError> {
    let applied = db.migrate(MIGRATIONS)?;
    let refolded = ItemStore::new(db).refold_names()?;
    if refolded > 0 {
        tracing::info!(refolded, "backfilled folded item names");
    }
    Ok(applied)
}

#[cfg(test)]
pub(crate) fn test_db() -> Db {
    let db = Db::open_in_memory().unwrap();
    migrate(&db).unwrap();
    db
}
