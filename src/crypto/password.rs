//! Salted, tunable-cost password hashing (spec §4.1).

use crate::constants::password::BCRYPT_COST;
use crate::errors::{AppError, ErrorCode};

/// Hashes `plaintext` with bcrypt at the configured cost factor.
///
/// # Errors
/// Returns [`AppError`] when the underlying bcrypt call fails (this only
/// happens for pathological inputs, e.g. an embedded NUL byte).
pub fn generate_hash(plaintext: &str) -> Result<String, AppError> {
    bcrypt::hash(plaintext, BCRYPT_COST)
        .map_err(|e| AppError::new(ErrorCode::InternalError, format!("bcrypt hash: {e}")))
}

/// Checks `plaintext` against a previously generated `hash`.
///
/// bcrypt's own comparison is constant-time with respect to the hash; an
/// empty hash (an OAuth2-only user who never set a password) always fails.
#[must_use]
pub fn check_password(plaintext: &str, hash: &str) -> bool {
    if hash.is_empty() {
        return false;
    }
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let hash = generate_hash("pw_12345").expect("hash");
        assert!(check_password("pw_12345", &hash));
        assert!(!check_password("wrong", &hash));
    }

    #[test]
    fn empty_hash_never_matches() {
        assert!(!check_password("anything", ""));
    }
}
