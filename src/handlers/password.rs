//! `auth-with-password`, `register-with-password`, `auth-refresh` (spec §4.4).

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use super::{mint_session_response, require_session};
use crate::errors::{AppError, ErrorCode};
use crate::extract::ValidatedJson;
use crate::jobs::payloads::{cooldown_bucket, EmailVerificationPayload};
use crate::crypto::password::{check_password, generate_hash};
use crate::database::jobs::NewJob;
use crate::errors::InsertJobError;
use crate::state::AppState;
use crate::validation::{is_valid_email, is_valid_password};

/// Route group for the three password-based session endpoints.
pub struct PasswordRoutes;

impl PasswordRoutes {
    /// Builds the `/auth-with-password`, `/register-with-password`, and
    /// `/auth-refresh` routes.
    #[must_use]
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/auth-with-password", post(Self::auth_with_password))
            .route("/register-with-password", post(Self::register_with_password))
            .route("/auth-refresh", post(Self::auth_refresh))
            .with_state(state)
    }

    async fn auth_with_password(
        State(state): State<AppState>,
        ValidatedJson(body): ValidatedJson<AuthWithPasswordRequest>,
    ) -> Result<Response, AppError> {
        let user = state
            .db
            .users()
            .get_by_email(&body.identity)
            .await
            .ok()
            .flatten();

        let authenticated = user
            .as_ref()
            .is_some_and(|u| check_password(&body.password, &u.password_hash));
        let Some(user) = user.filter(|_| authenticated) else {
            crate::logging::log_auth_event(&body.identity, "password_login", false);
            return Err(ErrorCode::InvalidCredentials.into());
        };
        crate::logging::log_auth_event(&user.id, "password_login", true);

        let config = state.config.get();
        mint_session_response(&user, &config.auth)
    }

    async fn register_with_password(
        State(state): State<AppState>,
        ValidatedJson(body): ValidatedJson<RegisterWithPasswordRequest>,
    ) -> Result<Response, AppError> {
        if !is_valid_email(&body.identity) || !is_valid_password(&body.password) {
            return Err(ErrorCode::InvalidInput.into());
        }
        if body.password != body.password_confirm {
            return Err(ErrorCode::InvalidInput.into());
        }

        let password_hash = generate_hash(&body.password)?;
        let (user, _is_new) = state
            .db
            .users()
            .create_or_get_existing(&body.identity, None, &password_hash)
            .await
            .map_err(AppError::from)?;

        if !user.verified {
            let config = state.config.get();
            let bucket = cooldown_bucket(config.cooldowns.email_verification_secs, chrono::Utc::now());
            let payload = EmailVerificationPayload {
                email: user.email.clone(),
                cooldown_bucket: bucket,
            };
            let payload_bytes = serde_json::to_vec(&payload)
                .map_err(|e| AppError::new(ErrorCode::InternalError, e.to_string()))?;
            let insert = state
                .db
                .jobs()
                .insert(NewJob {
                    job_type: crate::constants::jobs::TYPE_EMAIL_VERIFICATION,
                    payload: &payload_bytes,
                    payload_extra: b"",
                    max_attempts: crate::constants::jobs::DEFAULT_MAX_ATTEMPTS,
                    scheduled_for: chrono::Utc::now(),
                })
                .await;
            // A duplicate here just means registration was replayed inside the
            // same cooldown bucket (spec §8 scenario 2): idempotent, not an error.
            if let Err(InsertJobError::Other) = insert {
                tracing::error!("failed to enqueue email_verification job for new registration");
            }
        }

        let config = state.config.get();
        mint_session_response(&user, &config.auth)
    }

    async fn auth_refresh(
        State(state): State<AppState>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let authed = require_session(&headers, &state).await?;
        let config = state.config.get();
        mint_session_response(&authed.user, &config.auth)
    }
}

#[derive(Debug, Deserialize)]
struct AuthWithPasswordRequest {
    identity: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RegisterWithPasswordRequest {
    identity: String,
    password: String,
    password_confirm: String,
}
