//! User persistence.

use crate::otp::EmailVerification;
use crate::user::{Role, User};
use crate::AuthError;
use cellar_commerce::ids::UserId;
use cellar_db::{params, Executor, Migration};
use serde::Deserialize;

/// Migrations owned by the auth crate.
pub const MIGRATIONS: &[Migration] = &[Migration {
    id: "auth/001_users",
    sql: "
        CREATE TABLE users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'customer' CHECK (role IN ('customer', 'admin')),
            verified INTEGER NOT NULL DEFAULT 0,
            verification_code TEXT,
            verification_expires_at INTEGER,
            created_at INTEGER NOT NULL
        );
    ",
}];

const USER_COLUMNS: &str = "id, email, password_hash, role, verified, verification_code, \
     verification_expires_at, created_at";

#[derive(Deserialize)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    role: String,
    verified: i64,
    verification_code: Option<String>,
    verification_expires_at: Option<i64>,
    created_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let verification = match (row.verification_code, row.verification_expires_at) {
            (Some(code), Some(expires_at)) => Some(EmailVerification { code, expires_at }),
            _ => None,
        };
        Ok(User {
            id: UserId::new(row.id),
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            verified: row.verified != 0,
            verification,
            created_at: row.created_at,
        })
    }
}

pub struct UserStore<'a, E: Executor> {
    exec: &'a E,
}

impl<'a, E: Executor> UserStore<'a, E> {
    pub fn new(exec: &'a E) -> Self {
        Self { exec }
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row: Option<UserRow> = self.exec.query_optional(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"),
            params![email],
        )?;
        row.map(User::try_from).transpose()
    }

    pub fn get(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        let row: Option<UserRow> = self.exec.query_optional(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            params![id],
        )?;
        row.map(User::try_from).transpose()
    }

    /// Insert a new user or overwrite an existing one with the same id.
    pub fn save(&self, user: &User) -> Result<(), AuthError> {
        let (code, expires_at) = match &user.verification {
            Some(v) => (Some(v.code.clone()), Some(v.expires_at)),
            None => (None, None),
        };
        self.exec.execute(
            &format!(
                "INSERT INTO users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    email = excluded.email, password_hash = excluded.password_hash,
                    role = excluded.role, verified = excluded.verified,
                    verification_code = excluded.verification_code,
                    verification_expires_at = excluded.verification_expires_at"
            ),
            params![
                &user.id,
                &user.email,
                &user.password_hash,
                user.role.as_str(),
                user.verified,
                code,
                expires_at,
                user.created_at
            ],
        )?;
        Ok(())
    }

    /// Change a user's role. Returns false when no user has that email.
    pub fn set_role(&self, email: &str, role: Role) -> Result<bool, AuthError> {
        let changed = self.exec.execute(
            "UPDATE users SET role = ? WHERE email = ?",
            params![role.as_str(), email],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_db::Db;

    fn db() -> Db {
        let db = Db::open_in_memory().unwrap();
        db.migrate(MIGRATIONS).unwrap();
        db
    }

    fn user(email: &str) -> User {
        User {
            id: UserId::generate(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            role: Role::Customer,
            verified: false,
            verification: Some(EmailVerification {
                code: "123456".into(),
                expires_at: 600,
            }),
            created_at: 0,
        }
    }

    #[test]
    fn test_save_and_find() {
        let db = db();
        let store = UserStore::new(&db);
        let mut u = user("hai@example.vn");
        store.save(&u).unwrap();
        assert_eq!(store.find_by_email("hai@example.vn").unwrap(), Some(u.clone()));

        u.verified = true;
        u.verification = None;
        store.save(&u).unwrap();
        let loaded = store.get(&u.id).unwrap().unwrap();
        assert!(loaded.verified);
        assert!(loaded.verification.is_none());
    }

    #[test]
    fn test_email_is_unique() {
        let db = db();
        let store = UserStore::new(&db);
        store.save(&user("dup@example.vn")).unwrap();
        assert!(store.save(&user("dup@example.vn")).is_err());
    }

    #[test]
    fn test_set_role() {
        let db = db();
        let store = UserStore::new(&db);
        store.save(&user("boss@example.vn")).unwrap();
        assert!(store.set_role("boss@example.vn", Role::Admin).unwrap());
        assert!(!store.set_role("nobody@example.vn", Role::Admin).unwrap());
        assert!(store.find_by_email("boss@example.vn").unwrap().unwrap().is_admin());
    }
}
