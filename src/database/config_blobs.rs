//! Typed access to the `config_blobs` table (spec §4.8, §3).
//!
//! Only [`crate::crypto::SecureStore`] reads or writes ciphertext through
//! this accessor; no other component is meant to see these rows.

use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};

use crate::models::ConfigBlob;

/// Typed accessor for config blob rows.
pub struct ConfigBlobs {
    pool: Pool<Sqlite>,
}

fn row_to_blob(row: &sqlx::sqlite::SqliteRow) -> Result<ConfigBlob, sqlx::Error> {
    let created_at: String = row.try_get("created_at")?;
    Ok(ConfigBlob {
        id: row.try_get("id")?,
        scope: row.try_get("scope")?,
        generation: row.try_get("generation")?,
        ciphertext: row.try_get("ciphertext")?,
        format: row.try_get("format")?,
        description: row.try_get("description")?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "created_at".into(),
                source: Box::new(e),
            })?,
    })
}

impl ConfigBlobs {
    pub(crate) const fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Fetches the highest-generation blob for `scope`.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn get_latest(&self, scope: &str) -> Result<Option<ConfigBlob>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT * FROM config_blobs WHERE scope = ? ORDER BY generation DESC LIMIT 1",
        )
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_blob).transpose()
    }

    /// Fetches an exact `(scope, generation)` blob.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn get(&self, scope: &str, generation: i64) -> Result<Option<ConfigBlob>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM config_blobs WHERE scope = ? AND generation = ?")
            .bind(scope)
            .bind(generation)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_blob).transpose()
    }

    /// Inserts `ciphertext` as the next generation for `scope`, preserving
    /// the strictly-increasing generation invariant (spec §3).
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn insert_next_generation(
        &self,
        scope: &str,
        ciphertext: &[u8],
        format: &str,
        description: &str,
    ) -> Result<i64, sqlx::Error> {
        let current = self.get_latest(scope).await?;
        let next_generation = current.map_or(1, |blob| blob.generation + 1);
        let result = sqlx::query(
            r"
            INSERT INTO config_blobs (scope, generation, ciphertext, format, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(scope)
        .bind(next_generation)
        .bind(ciphertext)
        .bind(format)
        .bind(description)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}
