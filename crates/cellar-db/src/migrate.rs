//! Forward-only schema migrations.

use crate::{params, Db, DbError, Executor};

/// A single schema change, applied at most once per database.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Stable identifier, e.g. `commerce/001_catalog`.
    pub id: &'static str,
    /// Statements executed as one batch.
    pub sql: &'static str,
}

const BOOKKEEPING: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    id TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
)";

impl Db {
    /// Apply every migration in `migrations` that has not run yet.
    ///
    /// Each migration runs in its own transaction together with its
    /// bookkeeping row. Returns how many were applied.
    pub fn migrate(&self, migrations: &[Migration]) -> Result<usize, DbError> {
        self.execute_batch(BOOKKEEPING)?;

        let mut applied = 0;
        for migration in migrations {
            let ran = self.transaction(|tx| {
                let seen = tx
                    .query("SELECT id FROM schema_migrations WHERE id = ?", params![migration.id])?;
                if !seen.is_empty() {
                    return Ok::<_, DbError>(false);
                }
                tx.execute_batch(migration.sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (id, applied_at) VALUES (?, strftime('%s','now'))",
                    params![migration.id],
                )?;
                Ok(true)
            })?;

            if ran {
                tracing::info!(migration = migration.id, "applied migration");
                applied += 1;
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: &[Migration] = &[
        Migration {
            id: "test/001_items",
            sql: "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)",
        },
        Migration {
            id: "test/002_stock",
            sql: "ALTER TABLE items ADD COLUMN stock INTEGER NOT NULL DEFAULT 0",
        },
    ];

    #[test]
    fn test_migrations_apply_once() {
        let db = Db::open_in_memory().unwrap();
        assert_eq!(db.migrate(SET).unwrap(), 2);
        assert_eq!(db.migrate(SET).unwrap(), 0);
        db.execute("INSERT INTO items (name, stock) VALUES (?, ?)", params!["Cava", 3])
            .unwrap();
    }

    #[test]
    fn test_failed_migration_is_not_recorded() {
        let db = Db::open_in_memory().unwrap();
        let broken = [Migration {
            id: "test/001_broken",
            sql: "CREATE TABLE oops (",
        }];
        assert!(db.migrate(&broken).is_err());
        let rows = db
            .query("SELECT id FROM schema_migrations", params![])
            .unwrap();
        assert!(rows.is_empty());
    }
}
