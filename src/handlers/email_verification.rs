//! `request-email-verification`, `confirm-email-verification` (spec §4.4).

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use super::require_session;
use crate::constants::jobs::{DEFAULT_MAX_ATTEMPTS, TYPE_EMAIL_VERIFICATION};
use crate::crypto::jwt::{parse_jwt, parse_jwt_unverified};
use crate::crypto::SigningKey;
use crate::crypto::TokenType;
use crate::database::jobs::NewJob;
use crate::errors::{catalog, AppError, ErrorCode, InsertJobError, Outcome};
use crate::extract::ValidatedJson;
use crate::jobs::payloads::{cooldown_bucket, EmailVerificationPayload};
use crate::state::AppState;

/// Route group for the email-verification request/confirm pair.
pub struct EmailVerificationRoutes;

impl EmailVerificationRoutes {
    /// Builds the `/request-email-verification` and
    /// `/confirm-email-verification` routes.
    #[must_use]
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/request-email-verification", post(Self::request))
            .route("/confirm-email-verification", post(Self::confirm))
            .with_state(state)
    }

    async fn request(
        State(state): State<AppState>,
        headers: HeaderMap,
        ValidatedJson(body): ValidatedJson<RequestEmailVerification>,
    ) -> Result<Response, AppError> {
        let authed = require_session(&headers, &state).await?;
        if body.email != authed.user.email {
            return Err(ErrorCode::InvalidInput.into());
        }
        if authed.user.verified {
            return Err(ErrorCode::AlreadyVerified.into());
        }

        let config = state.config.get();
        let bucket = cooldown_bucket(config.cooldowns.email_verification_secs, chrono::Utc::now());
        let payload = EmailVerificationPayload {
            email: authed.user.email.clone(),
            cooldown_bucket: bucket,
        };
        let payload_bytes = serde_json::to_vec(&payload)
            .map_err(|e| AppError::new(ErrorCode::InternalError, e.to_string()))?;

        match state
            .db
            .jobs()
            .insert(NewJob {
                job_type: TYPE_EMAIL_VERIFICATION,
                payload: &payload_bytes,
                payload_extra: b"",
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                scheduled_for: chrono::Utc::now(),
            })
            .await
        {
            Ok(_) => Ok(catalog().get(Outcome::OkEmailVerificationRequested).into_response()),
            Err(InsertJobError::ConstraintUnique) => Err(ErrorCode::DuplicateRequest.into()),
            Err(InsertJobError::Other) => Err(ErrorCode::ServiceUnavailable.into()),
        }
    }

    async fn confirm(
        State(state): State<AppState>,
        ValidatedJson(body): ValidatedJson<ConfirmEmailVerification>,
    ) -> Result<Response, AppError> {
        let claims = parse_jwt_unverified(&body.token)?;
        if claims.token_type != TokenType::EmailVerification {
            return Err(ErrorCode::InvalidVerificationToken.into());
        }

        let user = state
            .db
            .users()
            .get_by_id(&claims.user_id)
            .await?
            .ok_or(ErrorCode::InvalidToken)?;

        let config = state.config.get();
        let key = SigningKey::derive(
            &claims.email,
            &user.password_hash,
            config.auth.verification_email_secret.as_bytes(),
        )?;
        parse_jwt(&body.token, &key)?;

        state.db.users().mark_verified(&user.id).await?;
        Ok(catalog().get(Outcome::OkEmailVerified).into_response())
    }
}

#[derive(Debug, Deserialize)]
struct RequestEmailVerification {
    email: String,
}

#[derive(Debug, Deserialize)]
struct ConfirmEmailVerification {
    token: String,
}
