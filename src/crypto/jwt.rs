//! Per-user signing-key derivation and JWT mint/verify (spec §4.1, §4.3).
//!
//! Grounded in the teacher's `auth::AuthManager` (HS256 mint/validate with
//! an `iat`/`exp`/`sub` claim set) but with the key material swapped for a
//! derived, credential-bound key instead of one process-wide secret: this
//! is what lets the system revoke a session without a revocation list
//! (GLOSSARY: "per-user signing key").

use std::sync::OnceLock;

use base64::Engine as _;
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::constants::crypto::{MIN_DOMAIN_SECRET_LEN, SIGNING_KEY_LEN};
use crate::errors::{AppError, ErrorCode};

type HmacSha256 = Hmac<Sha256>;

/// 32-byte symmetric key derived from a user's current credentials.
///
/// Zeroized on drop: this is session key material, not a value to leave
/// lying around in a core dump.
pub struct SigningKey([u8; SIGNING_KEY_LEN]);

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl SigningKey {
    /// Derives a per-user signing key from `(email, password_hash,
    /// domain_secret)` by concatenating the three with a fixed separator
    /// and taking the HMAC-SHA256 of the result, keyed by `domain_secret`.
    ///
    /// # Errors
    /// Returns [`ErrorCode::TokenGeneration`] when `domain_secret` is
    /// shorter than [`MIN_DOMAIN_SECRET_LEN`] bytes (spec: `err_short_secret`,
    /// folded into the catalog's `token_generation` outcome).
    pub fn derive(email: &str, password_hash: &str, domain_secret: &[u8]) -> Result<Self, AppError> {
        if domain_secret.len() < MIN_DOMAIN_SECRET_LEN {
            return Err(AppError::new(
                ErrorCode::TokenGeneration,
                format!(
                    "domain secret is {} bytes, need at least {MIN_DOMAIN_SECRET_LEN}",
                    domain_secret.len()
                ),
            ));
        }
        let mut mac = HmacSha256::new_from_slice(domain_secret)
            .map_err(|e| AppError::new(ErrorCode::TokenGeneration, e.to_string()))?;
        mac.update(email.as_bytes());
        mac.update(b"|");
        mac.update(password_hash.as_bytes());
        mac.update(b"|");
        mac.update(domain_secret);
        let digest = mac.finalize().into_bytes();
        let mut key = [0_u8; SIGNING_KEY_LEN];
        key.copy_from_slice(&digest[..SIGNING_KEY_LEN]);
        Ok(Self(key))
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.0)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.0)
    }
}

/// Distinguishes the purpose of a token sharing the same claim shape
/// (spec §6: `type` in `{session, email_verification, password_reset,
/// email_change}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Session token, minted on login/refresh.
    Session,
    /// Confirms a new or re-requested email address.
    EmailVerification,
    /// Authorizes a single password change.
    PasswordReset,
    /// Authorizes a single email-address change.
    EmailChange,
}

/// Standard claims carried by every token this backend mints (spec §6).
///
/// A typed enum-per-purpose would split `new_email` into its own variant;
/// this backend keeps one struct with an `Option` field instead, since the
/// fast unverified path only ever touches the raw payload bytes and the
/// verified path validates `token_type` explicitly at each call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
    /// Subject user id.
    pub user_id: String,
    /// Email the token was minted against.
    pub email: String,
    /// Token purpose.
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Present only on `email_change` tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_email: Option<String>,
}

/// Mints a signed JWT for `claims_base`, stamping `iat`/`exp` from `ttl`.
///
/// # Errors
/// Returns [`ErrorCode::TokenGeneration`] if the encoder rejects the claims
/// (never expected in practice with a well-formed [`Claims`] value).
pub fn new_jwt(mut claims: Claims, key: &SigningKey, ttl: chrono::Duration) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    claims.iat = now.timestamp();
    claims.exp = (now + ttl).timestamp();
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key.encoding_key())
        .map_err(|e| AppError::new(ErrorCode::TokenGeneration, e.to_string()))
}

/// Verifies `token`'s signature and standard claims against `key`.
///
/// # Errors
/// Maps every failure onto the catalog codes spec'd in §4.3 step 6: an
/// expired `exp` claim becomes [`ErrorCode::TokenExpired`], a non-HS256
/// algorithm becomes [`ErrorCode::InvalidSignMethod`], anything else
/// becomes [`ErrorCode::InvalidToken`].
pub fn parse_jwt(token: &str, key: &SigningKey) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256];
    validation.validate_exp = true;
    match jsonwebtoken::decode::<Claims>(token, &key.decoding_key(), &validation) {
        Ok(data) => Ok(data.claims),
        Err(err) => Err(match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ErrorCode::TokenExpired.into(),
            jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                ErrorCode::InvalidSignMethod.into()
            }
            _ => AppError::new(ErrorCode::InvalidToken, err.to_string()),
        }),
    }
}

/// Decodes `token`'s claims without verifying the signature.
///
/// Used only by endpoints that must read `type`/`user_id` *before* the
/// per-user signing key can be derived (spec §4.4: confirm-email-
/// verification, confirm-password-reset, confirm-email-change). The
/// signature is always verified afterwards via [`parse_jwt`] once the key
/// is known.
///
/// # Errors
/// Returns [`ErrorCode::InvalidToken`] if the token is malformed or its
/// payload segment is not valid JSON.
pub fn parse_jwt_unverified(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    let dummy_key = DecodingKey::from_secret(b"");
    jsonwebtoken::decode::<Claims>(token, &dummy_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AppError::new(ErrorCode::InvalidToken, e.to_string()))
}

fn user_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"r[0-9a-f]{14}").unwrap_or_else(|e| panic!("static regex: {e}")))
}

/// Cheaply recovers the subject user id from a JWT without parsing JSON or
/// verifying the signature (spec §4.1 `parseJwtUserID`).
///
/// Splits on `.`, base64url-decodes the middle (payload) segment, and
/// applies the `r[0-9a-f]{14}` pattern directly to the decoded bytes,
/// allocating at most once. The signature is verified afterwards by
/// [`parse_jwt`]; this path only determines which user row to load.
#[must_use]
pub fn parse_jwt_user_id(token: &str) -> Option<String> {
    let payload_segment = token.split('.').nth(1)?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload_segment)
        .ok()?;
    let matched = user_id_regex().find(&decoded)?;
    Some(String::from_utf8_lossy(matched.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> Vec<u8> {
        b"0123456789abcdef0123456789abcdef".to_vec()
    }

    #[test]
    fn short_secret_fails_derivation() {
        let err = SigningKey::derive("a@b.co", "hash", b"short").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenGeneration);
    }

    #[test]
    fn mint_then_verify_round_trips() {
        let key = SigningKey::derive("a@b.co", "hash", &secret()).expect("derive");
        let claims = Claims {
            iat: 0,
            exp: 0,
            user_id: "r00000000000001".into(),
            email: "a@b.co".into(),
            token_type: TokenType::Session,
            new_email: None,
        };
        let token = new_jwt(claims, &key, chrono::Duration::hours(1)).expect("mint");
        let parsed = parse_jwt(&token, &key).expect("verify");
        assert_eq!(parsed.user_id, "r00000000000001");
    }

    #[test]
    fn expired_token_is_rejected() {
        let key = SigningKey::derive("a@b.co", "hash", &secret()).expect("derive");
        let claims = Claims {
            iat: 0,
            exp: 0,
            user_id: "r00000000000001".into(),
            email: "a@b.co".into(),
            token_type: TokenType::Session,
            new_email: None,
        };
        let token = new_jwt(claims, &key, chrono::Duration::seconds(-1)).expect("mint");
        let err = parse_jwt(&token, &key).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn fast_path_extracts_user_id() {
        let key = SigningKey::derive("a@b.co", "hash", &secret()).expect("derive");
        let claims = Claims {
            iat: 0,
            exp: 0,
            user_id: "r0a1b2c3d4e5f67".into(),
            email: "a@b.co".into(),
            token_type: TokenType::Session,
            new_email: None,
        };
        let token = new_jwt(claims, &key, chrono::Duration::hours(1)).expect("mint");
        assert_eq!(parse_jwt_user_id(&token).as_deref(), Some("r0a1b2c3d4e5f67"));
    }
}
