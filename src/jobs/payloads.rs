//! Typed job payloads and the cooldown-bucket helper (spec §4.5, §3
//! "Cooldown bucket").
//!
//! Each job type uses a different payload shape (spec §4.4's endpoint
//! table names the shape per handler); these structs are the fingerprint
//! that backs the `(job_type, payload)` uniqueness constraint, so field
//! order and presence matter — changing one changes what counts as a
//! duplicate request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `floor(t.unix_seconds / period_secs)` (GLOSSARY: "Cooldown bucket").
#[must_use]
pub fn cooldown_bucket(period_secs: i64, at: DateTime<Utc>) -> i64 {
    at.timestamp() / period_secs.max(1)
}

/// Fingerprint payload for an `email_verification` job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailVerificationPayload {
    /// The email address to verify.
    pub email: String,
    /// Cooldown bucket at enqueue time.
    pub cooldown_bucket: i64,
}

/// Fingerprint payload for a `password_reset` job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetPayload {
    /// The account's email address.
    pub email: String,
    /// Cooldown bucket at enqueue time.
    pub cooldown_bucket: i64,
}

/// Fingerprint payload for an `email_change` job (spec §4.4: "payload
/// `{user_id, cooldown_bucket}`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailChangePayload {
    /// The requesting user's id.
    pub user_id: String,
    /// Cooldown bucket at enqueue time.
    pub cooldown_bucket: i64,
}

/// Non-fingerprint payload for an `email_change` job (spec §4.4: "payload-
/// extra `{new_email}`" — kept out of the unique index so repeated
/// requests in the same bucket dedupe regardless of which address the
/// user typed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailChangeExtra {
    /// The address the user wants to change to.
    pub new_email: String,
}
