//! `request-email-change`, `confirm-email-change` (spec §4.4).

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use super::require_session;
use crate::constants::jobs::{DEFAULT_MAX_ATTEMPTS, TYPE_EMAIL_CHANGE};
use crate::crypto::jwt::{parse_jwt, parse_jwt_unverified};
use crate::crypto::password::check_password;
use crate::crypto::SigningKey;
use crate::crypto::TokenType;
use crate::database::jobs::NewJob;
use crate::errors::{catalog, AppError, ErrorCode, InsertJobError, Outcome};
use crate::extract::ValidatedJson;
use crate::jobs::payloads::{cooldown_bucket, EmailChangeExtra, EmailChangePayload};
use crate::state::AppState;
use crate::validation::is_valid_email;

/// Route group for the email-change request/confirm pair.
pub struct EmailChangeRoutes;

impl EmailChangeRoutes {
    /// Builds the `/request-email-change` and `/confirm-email-change` routes.
    #[must_use]
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/request-email-change", post(Self::request))
            .route("/confirm-email-change", post(Self::confirm))
            .with_state(state)
    }

    async fn request(
        State(state): State<AppState>,
        headers: HeaderMap,
        ValidatedJson(body): ValidatedJson<RequestEmailChange>,
    ) -> Result<Response, AppError> {
        let authed = require_session(&headers, &state).await?;
        if !authed.user.verified {
            return Err(ErrorCode::UnverifiedEmail.into());
        }
        if !is_valid_email(&body.new_email) {
            return Err(ErrorCode::InvalidInput.into());
        }
        if body.new_email == authed.user.email {
            return Err(ErrorCode::InvalidInput.into());
        }

        let config = state.config.get();
        let bucket = cooldown_bucket(config.cooldowns.email_change_secs, chrono::Utc::now());
        let payload = EmailChangePayload {
            user_id: authed.user.id.clone(),
            cooldown_bucket: bucket,
        };
        let payload_bytes = serde_json::to_vec(&payload)
            .map_err(|e| AppError::new(ErrorCode::InternalError, e.to_string()))?;
        let extra = EmailChangeExtra {
            new_email: body.new_email,
        };
        let extra_bytes = serde_json::to_vec(&extra)
            .map_err(|e| AppError::new(ErrorCode::InternalError, e.to_string()))?;

        match state
            .db
            .jobs()
            .insert(NewJob {
                job_type: TYPE_EMAIL_CHANGE,
                payload: &payload_bytes,
                payload_extra: &extra_bytes,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                scheduled_for: chrono::Utc::now(),
            })
            .await
        {
            Ok(_) | Err(InsertJobError::ConstraintUnique) => {
                Ok(catalog().get(Outcome::OkEmailChangeRequested).into_response())
            }
            Err(InsertJobError::Other) => Err(ErrorCode::ServiceUnavailable.into()),
        }
    }

    async fn confirm(
        State(state): State<AppState>,
        ValidatedJson(body): ValidatedJson<ConfirmEmailChange>,
    ) -> Result<Response, AppError> {
        let claims = parse_jwt_unverified(&body.token)?;
        if claims.token_type != TokenType::EmailChange {
            return Err(ErrorCode::InvalidVerificationToken.into());
        }

        let user = state
            .db
            .users()
            .get_by_id(&claims.user_id)
            .await?
            .ok_or(ErrorCode::InvalidToken)?;

        if !check_password(&body.password, &user.password_hash) {
            crate::logging::log_auth_event(&user.id, "email_change_confirm", false);
            return Err(ErrorCode::InvalidCredentials.into());
        }
        crate::logging::log_auth_event(&user.id, "email_change_confirm", true);

        let config = state.config.get();
        let key = SigningKey::derive(
            &claims.email,
            &user.password_hash,
            config.auth.email_change_secret.as_bytes(),
        )?;
        parse_jwt(&body.token, &key)?;

        let new_email = claims.new_email.ok_or(ErrorCode::InvalidToken)?;
        state
            .db
            .users()
            .update_email(&user.id, &new_email)
            .await
            .map_err(|err| {
                if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
                    AppError::from(ErrorCode::EmailConflict)
                } else {
                    AppError::from(err)
                }
            })?;

        Ok(catalog().get(Outcome::OkEmailChanged).into_response())
    }
}

#[derive(Debug, Deserialize)]
struct RequestEmailChange {
    new_email: String,
}

#[derive(Debug, Deserialize)]
struct ConfirmEmailChange {
    token: String,
    password: String,
}
