//! The authenticator (spec §4.3).
//!
//! Grounded in the teacher's `middleware::auth::McpAuthMiddleware` for the
//! overall shape (parse header, extract id, load user, verify) and its
//! `auth::AuthManager` for JWT mechanics, but collapsed to a single opaque
//! [`AuthError`](crate::errors::AuthError) sentinel: the teacher's
//! middleware surfaces a rich `anyhow::Error` on failure; this backend
//! deliberately throws that detail away at the return boundary so a caller
//! can only branch on the catalog response (spec: "a deliberate security
//! property").

use crate::crypto::jwt::{parse_jwt, parse_jwt_unverified, parse_jwt_user_id};
use crate::crypto::{Claims, SigningKey, TokenType};
use crate::database::Database;
use crate::errors::{AppError, AuthError, ErrorCode};
use crate::models::User;

/// Outcome of a successful authentication: the loaded user and their
/// verified session claims.
pub struct Authenticated {
    /// The user row the token's subject resolved to.
    pub user: User,
    /// The verified claims carried by the presented token.
    pub claims: Claims,
}

/// Runs the spec §4.3 algorithm against a raw `Authorization` header value
/// and the `auth_secret` configured for session tokens.
///
/// On any failure, returns the single opaque [`AuthError`] sentinel; the
/// caller maps this straight onto `ErrorCode::InvalidToken` (or the
/// specific catalog entry named in the doc comment for each step below) —
/// never onto anything that would let a client distinguish *why* the
/// request failed.
///
/// # Errors
/// Returns [`AuthError`] for every failure mode; see module docs.
pub async fn authenticate(
    authorization_header: Option<&str>,
    auth_secret: &[u8],
    db: &Database,
) -> Result<Authenticated, AuthError> {
    // Step 1: empty/absent header -> err_no_auth_header.
    let header = authorization_header.filter(|h| !h.is_empty()).ok_or(AuthError)?;

    // Step 2: must carry the Bearer prefix -> err_invalid_token_format.
    let token = header.strip_prefix("Bearer ").ok_or(AuthError)?;
    if token.is_empty() {
        return Err(AuthError);
    }

    // Step 3: fast-path extraction, no signature check yet -> err_invalid_token.
    let user_id = parse_jwt_user_id(token).ok_or(AuthError)?;

    // Step 4: load by id; not found or DB error both collapse to the same
    // sentinel (never err_not_found, to avoid an oracle).
    let user = db
        .users()
        .get_by_id(&user_id)
        .await
        .map_err(|_| AuthError)?
        .ok_or(AuthError)?;

    // Step 5: derive the per-user key from the user's *current* credentials.
    let key = SigningKey::derive(&user.email, &user.password_hash, auth_secret)
        .map_err(|_| AuthError)?;

    // Step 6: verify signature and standard claims.
    let claims = parse_jwt(token, &key).map_err(|_| AuthError)?;

    // Step 7: session-specific claim validation.
    if claims.token_type != TokenType::Session || claims.user_id.is_empty() {
        return Err(AuthError);
    }

    Ok(Authenticated { user, claims })
}

/// Parses a token's claims without verifying its signature, for the
/// confirm-* endpoints that must read `type`/`user_id` before the
/// per-user key can even be derived (spec §4.4).
///
/// # Errors
/// Returns [`ErrorCode::InvalidToken`] if the token cannot be decoded.
pub fn unverified_claims(token: &str) -> Result<Claims, AppError> {
    parse_jwt_unverified(token).map_err(|_| ErrorCode::InvalidToken.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let db = Database::new("sqlite::memory:").await.expect("in-memory db");
        let result = authenticate(None, b"0123456789abcdef0123456789abcdef", &db).await;
        assert!(matches!(result, Err(AuthError)));
    }

    #[tokio::test]
    async fn non_bearer_header_is_rejected() {
        let db = Database::new("sqlite::memory:").await.expect("in-memory db");
        let result = authenticate(Some("Basic abc"), b"0123456789abcdef0123456789abcdef", &db).await;
        assert!(matches!(result, Err(AuthError)));
    }

    #[tokio::test]
    async fn full_round_trip_succeeds() {
        let db = Database::new("sqlite::memory:").await.expect("in-memory db");
        let secret = b"0123456789abcdef0123456789abcdef".to_vec();
        let user = db
            .users()
            .create("a@b.co", None, "hash", true, false)
            .await
            .expect("create user");
        let key = SigningKey::derive(&user.email, &user.password_hash, &secret).expect("derive");
        let claims = Claims {
            iat: 0,
            exp: 0,
            user_id: user.id.clone(),
            email: user.email.clone(),
            token_type: TokenType::Session,
            new_email: None,
        };
        let token = crate::crypto::jwt::new_jwt(claims, &key, chrono::Duration::hours(1))
            .expect("mint");

        let authorization = format!("Bearer {token}");
        let authed = authenticate(Some(&authorization), &secret, &db)
            .await
            .expect("authenticate");
        assert_eq!(authed.user.id, user.id);
    }

    #[tokio::test]
    async fn changed_password_invalidates_old_token() {
        let db = Database::new("sqlite::memory:").await.expect("in-memory db");
        let secret = b"0123456789abcdef0123456789abcdef".to_vec();
        let user = db
            .users()
            .create("a@b.co", None, "hash-old", true, false)
            .await
            .expect("create user");
        let key = SigningKey::derive(&user.email, &user.password_hash, &secret).expect("derive");
        let claims = Claims {
            iat: 0,
            exp: 0,
            user_id: user.id.clone(),
            email: user.email.clone(),
            token_type: TokenType::Session,
            new_email: None,
        };
        let token = crate::crypto::jwt::new_jwt(claims, &key, chrono::Duration::hours(1))
            .expect("mint");

        db.users()
            .update_password_hash(&user.id, "hash-new")
            .await
            .expect("update password");

        let authorization = format!("Bearer {token}");
        let result = authenticate(Some(&authorization), &secret, &db).await;
        assert!(matches!(result, Err(AuthError)));
    }
}
