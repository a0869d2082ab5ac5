//! Typed access to the `acme_certificates` table.
//!
//! Out-of-scope per spec §1 ("ACME certificate acquisition" is an external
//! collaborator) — this accessor only stores and retrieves rows for an
//! out-of-process TLS terminator; the core never requests or renews a
//! certificate itself.

use sqlx::{Pool, Row, Sqlite};

use crate::models::AcmeCertificate;

/// Typed accessor for ACME certificate rows.
pub struct AcmeCertificates {
    pool: Pool<Sqlite>,
}

impl AcmeCertificates {
    pub(crate) const fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Returns the most recently issued certificate for `identifier`, if any.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn active(&self, identifier: &str) -> Result<Option<AcmeCertificate>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT * FROM acme_certificates WHERE identifier = ? ORDER BY issued_at DESC LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            let issued_at: String = row.try_get("issued_at")?;
            Ok(AcmeCertificate {
                identifier: row.try_get("identifier")?,
                certificate: row.try_get("certificate")?,
                private_key: row.try_get("private_key")?,
                issued_at: chrono::DateTime::parse_from_rfc3339(&issued_at)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .map_err(|e| sqlx::Error::ColumnDecode {
                        index: "issued_at".into(),
                        source: Box::new(e),
                    })?,
            })
        })
        .transpose()
    }

    /// Stores a newly issued certificate.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn store(&self, cert: &AcmeCertificate) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO acme_certificates (identifier, certificate, private_key, issued_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&cert.identifier)
        .bind(&cert.certificate)
        .bind(&cert.private_key)
        .bind(cert.issued_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
