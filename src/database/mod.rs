//! SQLite data layer (spec §3, §4.5 row layout; "SQLite data layer" in
//! the budget table of spec §2).
//!
//! Grounded in the teacher's `database.rs`: a single `Database` struct
//! wrapping a `Pool<Sqlite>`, a `migrate()` that issues sequential
//! `CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT EXISTS` raw-SQL
//! statements (no `sqlx::migrate!` macro, no compile-time `query!` macros),
//! and per-domain typed accessor structs (`fitness_configurations()` in the
//! teacher, `users()`/`jobs()`/`config_blobs()`/`acme()` here).

/// ACME certificate storage (consumed, never issued, by this core).
pub mod acme;
/// Config blob storage backing [`crate::crypto::SecureStore`].
pub mod config_blobs;
/// Job queue row storage (spec §4.5).
pub mod jobs;
/// User row storage (spec §3).
pub mod users;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

use self::acme::AcmeCertificates;
use self::config_blobs::ConfigBlobs;
use self::jobs::JobQueue;
use self::users::Users;

/// Owns the single SQLite connection pool and exposes a typed accessor per
/// table. Handlers never hold a connection across a request boundary —
/// they call through one of these accessors and let it go out of scope.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Opens (creating if necessary) the SQLite file at `database_url` and
    /// runs all migrations.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established or any
    /// migration statement fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            format!("sqlite:{database_url}?mode=rwc")
        };
        let pool = SqlitePool::connect(&connection_options).await?;
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout=5000").execute(&pool).await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Exposes the raw pool for collaborators (e.g. the `/healthz` check)
    /// that need to confirm reachability without going through a typed
    /// accessor.
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Runs every table/index migration. Idempotent: every statement is
    /// `IF NOT EXISTS`.
    ///
    /// # Errors
    /// Returns an error if any underlying statement fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_jobs().await?;
        self.migrate_config_blobs().await?;
        self.migrate_acme_certificates().await?;
        Ok(())
    }

    async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
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
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn migrate_jobs(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_type TEXT NOT NULL,
                payload BLOB NOT NULL,
                payload_extra BLOB NOT NULL DEFAULT x'',
                status TEXT NOT NULL DEFAULT 'pending',
                attempts INTEGER NOT NULL DEFAULT 0,
                max_attempts INTEGER NOT NULL,
                scheduled_for TEXT NOT NULL,
                recurrent BOOLEAN NOT NULL DEFAULT 0,
                interval_secs INTEGER,
                last_error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(job_type, payload)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_jobs_claimable ON jobs(status, scheduled_for, created_at, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_config_blobs(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS config_blobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scope TEXT NOT NULL,
                generation INTEGER NOT NULL,
                ciphertext BLOB NOT NULL,
                format TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                UNIQUE(scope, generation)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_config_blobs_scope_gen ON config_blobs(scope, generation)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_acme_certificates(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS acme_certificates (
                identifier TEXT NOT NULL,
                certificate BLOB NOT NULL,
                private_key BLOB NOT NULL,
                issued_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_acme_identifier_issued ON acme_certificates(identifier, issued_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Typed accessor for the `users` table.
    #[must_use]
    pub fn users(&self) -> Users {
        Users::new(self.pool.clone())
    }

    /// Typed accessor for the `jobs` table.
    #[must_use]
    pub fn jobs(&self) -> JobQueue {
        JobQueue::new(self.pool.clone())
    }

    /// Typed accessor for the `config_blobs` table.
    #[must_use]
    pub fn config_blobs(&self) -> ConfigBlobs {
        ConfigBlobs::new(self.pool.clone())
    }

    /// Typed accessor for the `acme_certificates` table.
    #[must_use]
    pub fn acme(&self) -> AcmeCertificates {
        AcmeCertificates::new(self.pool.clone())
    }
}
