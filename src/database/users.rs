//! Typed access to the `users` table (spec §3).
//!
//! Grounded in the teacher's `database/users.rs`, generalized from a
//! client-visible UUID to this spec's opaque `r` + 14 hex character id,
//! generated here at insert time rather than accepted from the caller.

use chrono::Utc;
use rand::RngCore;
use sqlx::{Pool, Row, Sqlite};

use crate::constants::user_id::{HEX_LEN, LOW_56_BITS_MASK, PREFIX};
use crate::models::User;

/// Typed accessor for user rows. Cheap to construct; holds only a pool
/// handle clone.
pub struct Users {
    pool: Pool<Sqlite>,
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, sqlx::Error> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        verified: row.try_get("verified")?,
        oauth2: row.try_get("oauth2")?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "created_at".into(),
                source: Box::new(e),
            })?,
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "updated_at".into(),
                source: Box::new(e),
            })?,
    })
}

/// Generates an opaque id of the shape `r` + 14 lowercase hex characters
/// from the low 56 bits of a cryptographically random `u64`.
fn generate_user_id() -> String {
    let raw = rand::rngs::OsRng.next_u64() & LOW_56_BITS_MASK;
    format!("{PREFIX}{raw:0width$x}", width = HEX_LEN)
}

impl Users {
    pub(crate) const fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Inserts a new user, retrying on the astronomically unlikely case of
    /// an id collision. `email` may be empty only for callers that will set
    /// it in the same logical operation (not used by any handler today).
    ///
    /// # Errors
    /// Returns [`sqlx::Error::Database`] (unique violation) if `email` is
    /// non-empty and already registered.
    pub async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
        verified: bool,
        oauth2: bool,
    ) -> Result<User, sqlx::Error> {
        let now = Utc::now();
        for _ in 0..5 {
            let id = generate_user_id();
            let result = sqlx::query(
                r"
                INSERT INTO users (id, email, name, password_hash, verified, oauth2, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(&id)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .bind(verified)
            .bind(oauth2)
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {
                    return Ok(User {
                        id,
                        email: email.to_string(),
                        name: name.map(str::to_string),
                        password_hash: password_hash.to_string(),
                        verified,
                        oauth2,
                        created_at: now,
                        updated_at: now,
                    })
                }
                Err(sqlx::Error::Database(db_err))
                    if db_err.is_unique_violation()
                        && db_err.message().contains("users.id") =>
                {
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        Err(sqlx::Error::RowNotFound)
    }

    /// Inserts a new user, or — if `email` is already registered — leaves
    /// the existing row untouched and returns it instead (spec §4.4
    /// `register-with-password`: "ON CONFLICT leaves existing password
    /// untouched"). The boolean return distinguishes the two cases by
    /// comparing the returned row's `password_hash` to the one just
    /// submitted: only a genuinely fresh insert can have produced an exact
    /// match, since every hash carries its own bcrypt salt.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure other than the
    /// benign id-collision retried internally.
    pub async fn create_or_get_existing(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<(User, bool), sqlx::Error> {
        let now = Utc::now();
        for _ in 0..5 {
            let id = generate_user_id();
            let result = sqlx::query(
                r"
                INSERT INTO users (id, email, name, password_hash, verified, oauth2, created_at, updated_at)
                VALUES (?, ?, ?, ?, 0, 0, ?, ?)
                ON CONFLICT(email) DO UPDATE SET updated_at = users.updated_at
                RETURNING *
                ",
            )
            .bind(&id)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(row) => {
                    let user = row_to_user(&row)?;
                    let is_new = user.id == id && user.password_hash == password_hash;
                    return Ok((user, is_new));
                }
                Err(sqlx::Error::Database(db_err))
                    if db_err.is_unique_violation() && db_err.message().contains("users.id") =>
                {
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        Err(sqlx::Error::RowNotFound)
    }

    /// Fetches a user by id.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure (not found is `Ok(None)`).
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Fetches a user by email.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure (not found is `Ok(None)`).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Sets `verified = true`. A no-op if already verified (the invariant
    /// is one-directional: `false -> true` only).
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn mark_verified(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET verified = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replaces the password hash, invalidating every session token
    /// derived from the old one (GLOSSARY: per-user signing key).
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replaces the email address, invalidating every session token
    /// derived from the old one.
    ///
    /// # Errors
    /// Returns [`sqlx::Error::Database`] (unique violation) if `new_email`
    /// is already registered to another user.
    pub async fn update_email(&self, id: &str, new_email: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET email = ?, updated_at = ? WHERE id = ?")
            .bind(new_email)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Pool<Sqlite> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::query(
            r"
            CREATE TABLE users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE,
                name TEXT,
                password_hash TEXT NOT NULL DEFAULT '',
                verified BOOLEAN NOT NULL DEFAULT 0,
                oauth2 BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&pool)
        .await
        .expect("create users table");
        pool
    }

    #[tokio::test]
    async fn create_then_fetch_by_email() {
        let users = Users::new(test_db().await);
        let created = users
            .create("a@b.co", None, "hash", false, false)
            .await
            .expect("create");
        assert!(created.id.starts_with('r'));
        assert_eq!(created.id.len(), 15);

        let fetched = users
            .get_by_email("a@b.co")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(fetched.id, created.id);
        assert!(!fetched.verified);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let users = Users::new(test_db().await);
        users
            .create("dup@b.co", None, "hash", false, false)
            .await
            .expect("first insert");
        let second = users.create("dup@b.co", None, "hash2", false, false).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn create_or_get_existing_detects_fresh_insert() {
        let users = Users::new(test_db().await);
        let (user, is_new) = users
            .create_or_get_existing("fresh@b.co", None, "hash-1")
            .await
            .expect("insert");
        assert!(is_new);
        assert_eq!(user.password_hash, "hash-1");
    }

    #[tokio::test]
    async fn create_or_get_existing_detects_conflict() {
        let users = Users::new(test_db().await);
        let (first, _) = users
            .create_or_get_existing("again@b.co", None, "hash-1")
            .await
            .expect("first insert");

        let (second, is_new) = users
            .create_or_get_existing("again@b.co", None, "hash-2")
            .await
            .expect("second insert");

        assert!(!is_new);
        assert_eq!(second.id, first.id);
        assert_eq!(second.password_hash, "hash-1");
    }
}
