//! `auth-with-oauth2`, `list-oauth2-providers` (spec §4.4).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use super::mint_session_response;
use crate::crypto::pkce::{oauth2_code_verifier, s256_challenge};
use crate::errors::{dynamic_response, AppError, ErrorCode};
use crate::extract::ValidatedJson;
use crate::oauth2::{generate_state, OAuth2Client};
use crate::state::AppState;

/// Route group for the OAuth2 login and provider-discovery endpoints.
pub struct Oauth2Routes;

impl Oauth2Routes {
    /// Builds the `/auth-with-oauth2` and `/list-oauth2-providers` routes.
    #[must_use]
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/auth-with-oauth2", post(Self::auth_with_oauth2))
            .route("/list-oauth2-providers", get(Self::list_oauth2_providers))
            .with_state(state)
    }

    async fn auth_with_oauth2(
        State(state): State<AppState>,
        ValidatedJson(body): ValidatedJson<AuthWithOauth2Request>,
    ) -> Result<Response, AppError> {
        let config = state.config.get();
        let provider_config = config
            .oauth2_providers
            .iter()
            .find(|p| p.name == body.provider)
            .ok_or(ErrorCode::NotFound)?;

        let client = OAuth2Client::new(provider_config);
        let token = client
            .exchange_code(&body.code, body.code_verifier.as_deref())
            .await?;
        let user_info = client.fetch_user_info(&token.access_token).await?;

        let user = match state.db.users().get_by_email(&user_info.email).await? {
            Some(user) => user,
            None => {
                state
                    .db
                    .users()
                    .create(&user_info.email, None, "", true, true)
                    .await
                    .map_err(AppError::from)?
            }
        };

        crate::logging::log_auth_event(&user.id, "oauth2_login", true);
        mint_session_response(&user, &config.auth)
    }

    async fn list_oauth2_providers(State(state): State<AppState>) -> Result<Response, AppError> {
        let config = state.config.get();
        let providers = config
            .oauth2_providers
            .iter()
            .map(|provider_config| {
                let state_token = generate_state();
                let (code_verifier, code_challenge, code_challenge_method) = if provider_config.use_pkce {
                    let verifier = oauth2_code_verifier();
                    let challenge = s256_challenge(&verifier);
                    (Some(verifier), Some(challenge), Some("S256".to_string()))
                } else {
                    (None, None, None)
                };

                let client = OAuth2Client::new(provider_config);
                let auth_url = client.authorization_url(&state_token, code_challenge.as_deref())?;

                Ok(ProviderEntry {
                    name: provider_config.name.clone(),
                    display_name: provider_config.display_name.clone(),
                    state: state_token,
                    auth_url,
                    redirect_url: provider_config.redirect_uri.clone(),
                    code_verifier,
                    code_challenge,
                    code_challenge_method,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(dynamic_response(
            StatusCode::OK,
            "ok_oauth2_providers",
            "Configured OAuth2 providers",
            ProvidersData { providers },
        ))
    }
}

#[derive(Debug, Deserialize)]
struct AuthWithOauth2Request {
    provider: String,
    code: String,
    #[serde(default)]
    code_verifier: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProviderEntry {
    name: String,
    #[serde(rename = "displayName")]
    display_name: String,
    state: String,
    #[serde(rename = "authURL")]
    auth_url: String,
    #[serde(rename = "redirectURL")]
    redirect_url: String,
    #[serde(rename = "codeVerifier", skip_serializing_if = "Option::is_none")]
    code_verifier: Option<String>,
    #[serde(rename = "codeChallenge", skip_serializing_if = "Option::is_none")]
    code_challenge: Option<String>,
    #[serde(rename = "codeChallengeMethod", skip_serializing_if = "Option::is_none")]
    code_challenge_method: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProvidersData {
    providers: Vec<ProviderEntry>,
}
