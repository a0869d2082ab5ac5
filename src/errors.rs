//! Error taxonomy and the precomputed response catalog.
//!
//! Grounded in the teacher's `ErrorCode`/`AppError` split (status + code +
//! sanitized message vs. internal detail), repurposed from the teacher's
//! fitness-domain variants onto this backend's closed catalog of outcomes
//! (spec §4.2, §7). Every catalog entry is marshalled once, at startup, into
//! a `{status, body-bytes}` pair and reused for every occurrence of that
//! outcome — the hot failure path never allocates a new body.

use std::sync::OnceLock;

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Every outcome this backend can return to an HTTP client.
///
/// Variants map 1:1 onto the `snake_case` `code` strings in spec §4.2/§7;
/// `http_status` and `message` are fixed per variant and never depend on
/// request data, which is what makes the catalog precomputable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Request body was not `application/json`.
    InvalidContentType,
    /// Request body failed to deserialize into the expected shape.
    InvalidInput,
    /// `Authorization` header absent or empty.
    NoAuthHeader,
    /// `Authorization` header present but not `Bearer <token>`.
    InvalidTokenFormat,
    /// Token failed the fast user-id extraction, signature, or claim checks.
    InvalidToken,
    /// Token's `type` claim did not match the endpoint's expected purpose.
    InvalidVerificationToken,
    /// Token's standard `exp` claim is in the past.
    TokenExpired,
    /// Token's header names a signing algorithm other than HS256.
    InvalidSignMethod,
    /// Password or credential mismatch; also used for "user not found"
    /// on credential paths, to avoid an enumeration oracle.
    InvalidCredentials,
    /// Signing-key derivation failed (domain secret shorter than 32 bytes).
    TokenGeneration,
    /// A unique-constrained request (email, cooldown bucket) was repeated.
    DuplicateRequest,
    /// Registration or email-change target email is already in use.
    EmailConflict,
    /// Endpoint requires a verified email and the caller's is unverified.
    UnverifiedEmail,
    /// Endpoint requires an unverified email and the caller's is already verified.
    AlreadyVerified,
    /// Action requires a password and the account is OAuth2-only (empty hash).
    Oauth2OnlyAccount,
    /// Generic not-found, used only off credential paths.
    NotFound,
    /// Database unreachable or a non-constraint write failure.
    ServiceUnavailable,
    /// Catch-all for crypto/mailer/OAuth2-exchange infrastructure failure.
    InternalError,
}

impl ErrorCode {
    /// The wire `code` string, e.g. `"err_invalid_token"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidContentType => "err_invalid_content_type",
            Self::InvalidInput => "err_invalid_input",
            Self::NoAuthHeader => "err_no_auth_header",
            Self::InvalidTokenFormat => "err_invalid_token_format",
            Self::InvalidToken => "err_invalid_token",
            Self::InvalidVerificationToken => "err_invalid_verification_token",
            Self::TokenExpired => "err_token_expired",
            Self::InvalidSignMethod => "err_invalid_sign_method",
            Self::InvalidCredentials => "err_invalid_credentials",
            Self::TokenGeneration => "err_token_generation",
            Self::DuplicateRequest => "err_email_verification_already_requested",
            Self::EmailConflict => "err_email_conflict",
            Self::UnverifiedEmail => "err_unverified_email",
            Self::AlreadyVerified => "err_already_verified",
            Self::Oauth2OnlyAccount => "err_oauth2_only_account",
            Self::NotFound => "err_not_found",
            Self::ServiceUnavailable => "err_service_unavailable",
            Self::InternalError => "err_internal",
        }
    }

    /// The fixed HTTP status for this outcome (spec §6 status list).
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NoAuthHeader
            | Self::InvalidTokenFormat
            | Self::InvalidToken
            | Self::InvalidVerificationToken
            | Self::TokenExpired
            | Self::InvalidSignMethod
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::TokenGeneration | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DuplicateRequest | Self::EmailConflict | Self::AlreadyVerified => {
                StatusCode::CONFLICT
            }
            Self::UnverifiedEmail | Self::Oauth2OnlyAccount => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The fixed, user-facing message for this outcome.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidContentType => "Expected application/json",
            Self::InvalidInput => "Invalid request body",
            Self::NoAuthHeader => "Authorization header is required",
            Self::InvalidTokenFormat => "Authorization header must be a Bearer token",
            Self::InvalidToken | Self::InvalidCredentials => "Invalid credentials",
            Self::InvalidVerificationToken => "Token is not valid for this operation",
            Self::TokenExpired => "Token has expired",
            Self::InvalidSignMethod => "Token signing method is not supported",
            Self::TokenGeneration => "Unable to generate a signing key",
            Self::DuplicateRequest => "This request was already made recently",
            Self::EmailConflict => "Email address is already in use",
            Self::UnverifiedEmail => "Email address is not verified",
            Self::AlreadyVerified => "Email address is already verified",
            Self::Oauth2OnlyAccount => "This account has no password set",
            Self::NotFound => "Not found",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::InternalError => "Internal error",
        }
    }
}

impl std::hash::Hash for ErrorCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

/// A single opaque failure sentinel returned by the authenticator (spec
/// §4.3): callers branch on the catalog response, never on this error.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("Auth error")]
pub struct AuthError;

/// The application-wide error type carried through service code
/// (`anyhow::Result` collaborators convert into this at the HTTP boundary).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code:?}: {internal}")]
pub struct AppError {
    /// The catalog entry this error maps to.
    pub code: ErrorCode,
    /// Detail for logs only; never sent to the client.
    pub internal: String,
}

impl AppError {
    /// Builds an [`AppError`] carrying the given catalog code and internal
    /// detail, the latter logged but never serialized to the client.
    pub fn new(code: ErrorCode, internal: impl Into<String>) -> Self {
        Self {
            code,
            internal: internal.into(),
        }
    }
}

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code, code.message())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
            Self::new(ErrorCode::DuplicateRequest, err.to_string())
        } else {
            Self::new(ErrorCode::ServiceUnavailable, err.to_string())
        }
    }
}

/// Returned by [`crate::database::jobs::JobQueue::insert`] so callers can
/// distinguish "already queued this cooldown bucket" from any other
/// database failure, per spec §4.5/§4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertJobError {
    /// `(job_type, payload)` unique constraint was violated.
    ConstraintUnique,
    /// Any other database failure.
    Other,
}

/// Envelope shape shared by every response this backend emits (spec §6).
#[derive(Debug, Serialize)]
struct Envelope<'a, T: Serialize> {
    status: u16,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

/// A catalog entry: a status code and the bytes of its fully marshalled
/// JSON body, computed once and cloned (cheap, `Bytes`-backed) per response.
#[derive(Debug, Clone)]
pub struct CatalogResponse {
    status: StatusCode,
    body: axum::body::Bytes,
}

impl CatalogResponse {
    fn precompute(status: StatusCode, code: &str, message: &str) -> Self {
        let envelope = Envelope::<()> {
            status: status.as_u16(),
            code,
            message,
            data: None,
        };
        let body = serde_json::to_vec(&envelope).unwrap_or_default();
        Self {
            status,
            body: axum::body::Bytes::from(body),
        }
    }
}

fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers
}

impl IntoResponse for CatalogResponse {
    fn into_response(self) -> Response {
        (self.status, security_headers(), self.body).into_response()
    }
}

/// Hashable key wrapping [`ErrorCode`] so it can live inside [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCodeKey(pub ErrorCode);

/// A known, named outcome; indexes into the precomputed [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// `err_*` variants share their [`ErrorCode`] wire shape exactly.
    Error(ErrorCodeKey),
    /// `ok_email_verification_requested`.
    OkEmailVerificationRequested,
    /// `ok_password_reset_requested`.
    OkPasswordResetRequested,
    /// `ok_password_reset_not_needed`.
    OkPasswordResetNotNeeded,
    /// `ok_email_verified`.
    OkEmailVerified,
    /// `ok_email_change_requested`.
    OkEmailChangeRequested,
    /// `ok_email_changed`.
    OkEmailChanged,
    /// `ok_health`.
    OkHealth,
}

/// The full set of precomputed `{status, body}` pairs, built once at
/// process start and shared (read-only) for the life of the process.
pub struct Catalog {
    entries: std::collections::HashMap<Outcome, CatalogResponse>,
}

impl Catalog {
    /// Looks up the precomputed response for a known [`Outcome`].
    ///
    /// # Panics
    /// Panics if `outcome` was not registered at build time — this is a
    /// programming error (a missing catalog entry), not a runtime
    /// possibility once the catalog is fully populated.
    #[must_use]
    pub fn get(&self, outcome: Outcome) -> CatalogResponse {
        self.entries
            .get(&outcome)
            .cloned()
            .unwrap_or_else(|| panic!("missing catalog entry for {outcome:?}"))
    }

    /// Convenience accessor for error outcomes, built from an [`ErrorCode`].
    #[must_use]
    pub fn error(&self, code: ErrorCode) -> CatalogResponse {
        self.get(Outcome::Error(ErrorCodeKey(code)))
    }

    fn build() -> Self {
        let mut entries = std::collections::HashMap::new();
        for code in ALL_ERROR_CODES {
            entries.insert(
                Outcome::Error(ErrorCodeKey(*code)),
                CatalogResponse::precompute(code.http_status(), code.as_str(), code.message()),
            );
        }
        entries.insert(
            Outcome::OkEmailVerificationRequested,
            CatalogResponse::precompute(
                StatusCode::ACCEPTED,
                "ok_email_verification_requested",
                "Verification email sent",
            ),
        );
        entries.insert(
            Outcome::OkPasswordResetRequested,
            CatalogResponse::precompute(
                StatusCode::ACCEPTED,
                "ok_password_reset_requested",
                "If the account exists, a reset email has been sent",
            ),
        );
        entries.insert(
            Outcome::OkPasswordResetNotNeeded,
            CatalogResponse::precompute(
                StatusCode::OK,
                "ok_password_reset_not_needed",
                "Password already matches the requested value",
            ),
        );
        entries.insert(
            Outcome::OkEmailVerified,
            CatalogResponse::precompute(StatusCode::OK, "ok_email_verified", "Email verified"),
        );
        entries.insert(
            Outcome::OkEmailChangeRequested,
            CatalogResponse::precompute(
                StatusCode::ACCEPTED,
                "ok_email_change_requested",
                "Confirmation email sent to the new address",
            ),
        );
        entries.insert(
            Outcome::OkEmailChanged,
            CatalogResponse::precompute(
                StatusCode::OK,
                "ok_email_changed",
                "Email address updated",
            ),
        );
        entries.insert(
            Outcome::OkHealth,
            CatalogResponse::precompute(StatusCode::OK, "ok_health", "Service healthy"),
        );
        Self { entries }
    }
}

const ALL_ERROR_CODES: &[ErrorCode] = &[
    ErrorCode::InvalidContentType,
    ErrorCode::InvalidInput,
    ErrorCode::NoAuthHeader,
    ErrorCode::InvalidTokenFormat,
    ErrorCode::InvalidToken,
    ErrorCode::InvalidVerificationToken,
    ErrorCode::TokenExpired,
    ErrorCode::InvalidSignMethod,
    ErrorCode::InvalidCredentials,
    ErrorCode::TokenGeneration,
    ErrorCode::DuplicateRequest,
    ErrorCode::EmailConflict,
    ErrorCode::UnverifiedEmail,
    ErrorCode::AlreadyVerified,
    ErrorCode::Oauth2OnlyAccount,
    ErrorCode::NotFound,
    ErrorCode::ServiceUnavailable,
    ErrorCode::InternalError,
];

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Returns the process-wide response catalog, building it on first use.
pub fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(Catalog::build)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(code = self.code.as_str(), detail = %self.internal, "request failed");
        catalog().error(self.code).into_response()
    }
}

/// Builds a dynamic (per-request) envelope response, for the handful of
/// outcomes that carry request-specific `data` (spec §4.2: authentication
/// success, provider list, endpoint list).
pub fn dynamic_response<T: Serialize>(
    status: StatusCode,
    code: &str,
    message: &str,
    data: T,
) -> Response {
    let envelope = Envelope {
        status: status.as_u16(),
        code,
        message,
        data: Some(data),
    };
    let mut response = (status, axum::Json(envelope)).into_response();
    response.headers_mut().extend(security_headers());
    response
}
