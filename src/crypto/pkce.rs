//! PKCE code verifier/challenge generation (spec §4.1), grounded in the
//! teacher's `oauth2_client::client::PkceParams::generate` (same charset
//! and length range, same `rand`+`sha2`+base64url-no-pad recipe).

use base64::Engine as _;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::constants::crypto::{PKCE_CHARSET, PKCE_VERIFIER_MAX_LEN, PKCE_VERIFIER_MIN_LEN};

/// Generates a cryptographically random 43-128 character URL-safe code
/// verifier per RFC 7636.
#[must_use]
pub fn oauth2_code_verifier() -> String {
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(PKCE_VERIFIER_MIN_LEN..=PKCE_VERIFIER_MAX_LEN);
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..PKCE_CHARSET.len());
            PKCE_CHARSET[idx] as char
        })
        .collect()
}

/// Computes the S256 code challenge for `verifier`: base64url (no padding)
/// of its SHA-256 digest.
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_length_in_range() {
        for _ in 0..20 {
            let v = oauth2_code_verifier();
            assert!(v.len() >= PKCE_VERIFIER_MIN_LEN && v.len() <= PKCE_VERIFIER_MAX_LEN);
        }
    }

    #[test]
    fn challenge_is_deterministic() {
        let verifier = "a".repeat(43);
        assert_eq!(s256_challenge(&verifier), s256_challenge(&verifier));
    }
}
