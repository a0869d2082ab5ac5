//! OAuth2 client for `auth-with-oauth2` and `list-oauth2-providers`
//! (spec §4.4), grounded in the teacher's `oauth2_client.rs` — same
//! `OAuth2Config`/token-exchange shape, generalized from a single
//! fitness-platform integration to this backend's configurable provider
//! table (`config::OAuth2ProviderConfig`). PKCE verifier/challenge
//! generation is *not* duplicated here: it lives in [`crate::crypto::pkce`]
//! and is reused by both this module and any future direct caller.

use rand::Rng;
use serde::Deserialize;
use url::Url;

use crate::config::provider::OAuth2ProviderConfig;
use crate::constants::crypto::PKCE_CHARSET;
use crate::constants::timeouts::OAUTH2_EXCHANGE_SECS;
use crate::errors::{AppError, ErrorCode};

/// An opaque `state` value for the authorization-code flow, generated
/// fresh per `list-oauth2-providers` call (spec §4.4: "generate state").
#[must_use]
pub fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..PKCE_CHARSET.len());
            PKCE_CHARSET[idx] as char
        })
        .collect()
}

/// The access token and metadata returned by a provider's token endpoint.
pub struct OAuth2Token {
    /// Bearer token used against the provider's user-info endpoint.
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// The subset of a provider's user-info response this backend consumes.
#[derive(Debug, Deserialize)]
pub struct OAuth2UserInfo {
    /// The authenticated user's email address, as reported by the provider.
    pub email: String,
}

/// Talks to one configured OAuth2 provider's authorization, token, and
/// user-info endpoints.
pub struct OAuth2Client<'a> {
    config: &'a OAuth2ProviderConfig,
    client: reqwest::Client,
}

impl<'a> OAuth2Client<'a> {
    #[must_use]
    pub fn new(config: &'a OAuth2ProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Builds the provider's authorization URL, attaching a PKCE code
    /// challenge when the provider is configured to use one.
    ///
    /// # Errors
    /// Returns [`ErrorCode::InternalError`] if the provider's `auth_url`
    /// is malformed.
    pub fn authorization_url(
        &self,
        state: &str,
        code_challenge: Option<&str>,
    ) -> Result<String, AppError> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("invalid auth_url: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.config.scopes.join(" "))
                .append_pair("state", state);
            if let Some(challenge) = code_challenge {
                query
                    .append_pair("code_challenge", challenge)
                    .append_pair("code_challenge_method", "S256");
            }
        }
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for an access token (spec §4.4:
    /// "bounded 10 s context").
    ///
    /// # Errors
    /// Returns [`ErrorCode::ServiceUnavailable`] if the exchange times out,
    /// the HTTP call fails, or the response does not decode.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<OAuth2Token, AppError> {
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        if let Some(verifier) = code_verifier {
            params.push(("code_verifier", verifier));
        }

        let call = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send();
        let response = tokio::time::timeout(
            std::time::Duration::from_secs(OAUTH2_EXCHANGE_SECS),
            call,
        )
        .await
        .map_err(|_| AppError::new(ErrorCode::ServiceUnavailable, "oauth2 token exchange timed out"))?
        .map_err(|e| AppError::new(ErrorCode::ServiceUnavailable, format!("oauth2 token exchange failed: {e}")))?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::new(ErrorCode::ServiceUnavailable, format!("oauth2 token response: {e}")))?;
        Ok(OAuth2Token {
            access_token: token.access_token,
        })
    }

    /// Fetches the authenticated user's info from the provider, bounded by
    /// the same deadline as the token exchange.
    ///
    /// # Errors
    /// Returns [`ErrorCode::ServiceUnavailable`] if the call times out,
    /// fails, or the response does not decode.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<OAuth2UserInfo, AppError> {
        let call = self
            .client
            .get(&self.config.user_info_url)
            .bearer_auth(access_token)
            .send();
        let response = tokio::time::timeout(
            std::time::Duration::from_secs(OAUTH2_EXCHANGE_SECS),
            call,
        )
        .await
        .map_err(|_| AppError::new(ErrorCode::ServiceUnavailable, "oauth2 user-info fetch timed out"))?
        .map_err(|e| AppError::new(ErrorCode::ServiceUnavailable, format!("oauth2 user-info fetch failed: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AppError::new(ErrorCode::ServiceUnavailable, format!("oauth2 user-info response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::provider::OAuth2ProviderConfig;

    fn provider() -> OAuth2ProviderConfig {
        OAuth2ProviderConfig {
            name: "test".into(),
            display_name: "Test".into(),
            client_id: "client".into(),
            client_secret: "secret".into(),
            auth_url: "https://provider.example/authorize".into(),
            token_url: "https://provider.example/token".into(),
            user_info_url: "https://provider.example/userinfo".into(),
            redirect_uri: "https://backend.example/callback".into(),
            scopes: vec!["email".into()],
            use_pkce: true,
        }
    }

    #[test]
    fn authorization_url_carries_pkce_params() {
        let config = provider();
        let client = OAuth2Client::new(&config);
        let url = client
            .authorization_url("state123", Some("challenge456"))
            .expect("build url");
        assert!(url.contains("state=state123"));
        assert!(url.contains("code_challenge=challenge456"));
        assert!(url.contains("code_challenge_method=S256"));
    }

    #[test]
    fn authorization_url_omits_pkce_when_not_requested() {
        let config = provider();
        let client = OAuth2Client::new(&config);
        let url = client.authorization_url("state123", None).expect("build url");
        assert!(!url.contains("code_challenge"));
    }

    #[test]
    fn generate_state_is_nonempty_and_varies() {
        let a = generate_state();
        let b = generate_state();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }
}
