//! Core data model: `User`, `Job`, `ConfigBlob`, `AcmeCertificate`.
//!
//! These mirror the `users`, `jobs`, `config_blobs` and `acme_certificates`
//! tables created by [`crate::database::Database::migrate`]. Timestamps are
//! stored as RFC3339 UTC text columns and round-tripped through `chrono`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user, authenticated by password and/or OAuth2.
///
/// *Invariants* (enforced by the database layer, not this type): at most one
/// row per non-empty email; `verified` transitions only `false -> true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier of the shape `r` + 14 lowercase hex characters.
    pub id: String,
    /// Unique when non-empty; empty is permitted only transiently.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
    /// bcrypt hash; empty for OAuth2-only users that never set a password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the current email address has completed verification.
    pub verified: bool,
    /// Whether this user has ever authenticated via OAuth2.
    pub oauth2: bool,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last row mutation time.
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a queued [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Not yet claimed by any scheduler tick.
    Pending,
    /// Claimed and currently owned by an executor task.
    Processing,
    /// Ran to completion; terminal.
    Completed,
    /// Exhausted retries, or the most recent attempt errored; retryable
    /// until `attempts >= max_attempts`, then terminal.
    Failed,
}

impl JobStatus {
    /// The textual form stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a row's `status` column back into a [`JobStatus`].
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A unit of deferred work consumed by the executor/scheduler.
///
/// *Invariant:* `(job_type, payload)` is unique — this is how cooldown-bucket
/// deduplication is implemented, not a separate mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Monotonically increasing row id.
    pub id: i64,
    /// Handler dispatch tag, e.g. `email_verification`.
    pub job_type: String,
    /// Opaque bytes included in the uniqueness fingerprint.
    pub payload: Vec<u8>,
    /// Opaque bytes never used for deduplication (e.g. a new email address).
    pub payload_extra: Vec<u8>,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Number of completed attempts so far.
    pub attempts: i64,
    /// Attempts after which the job is terminally failed.
    pub max_attempts: i64,
    /// Earliest time at which this job may be claimed.
    pub scheduled_for: DateTime<Utc>,
    /// Whether completing this job schedules its next occurrence.
    pub recurrent: bool,
    /// Recurrence interval in seconds, meaningful only when `recurrent`.
    pub interval_secs: Option<i64>,
    /// Most recent handler error, truncated; operator visibility only.
    pub last_error: Option<String>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last row mutation time.
    pub updated_at: DateTime<Utc>,
}

/// An age-encrypted, versioned configuration blob.
///
/// *Invariant:* for a given `scope`, `generation` is strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigBlob {
    /// Row id.
    pub id: i64,
    /// Named configuration scope, e.g. `app`.
    pub scope: String,
    /// Strictly increasing per-scope version number.
    pub generation: i64,
    /// Age ciphertext; plaintext never touches disk outside this column.
    pub ciphertext: Vec<u8>,
    /// Format of the decrypted plaintext, e.g. `toml`.
    pub format: String,
    /// Human-readable note recorded at install time.
    pub description: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

/// An ACME certificate row. Consumed by the out-of-scope TLS terminator;
/// the core never issues or renews certificates itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcmeCertificate {
    /// Domain or identifier this certificate covers.
    pub identifier: String,
    /// PEM-encoded certificate chain.
    pub certificate: Vec<u8>,
    /// PEM-encoded private key.
    pub private_key: Vec<u8>,
    /// When this certificate was issued; the most recent row per
    /// `identifier` is the active one.
    pub issued_at: DateTime<Utc>,
}
