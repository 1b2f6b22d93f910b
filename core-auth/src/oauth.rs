//! OAuth 2.0 Authorization Code Flow with PKCE
//!
//! Implements RFC 6749 and RFC 7636 for the Dropbox and Google Drive
//! sign-in redirects.
//!
//! # Overview
//!
//! - [`OAuthFlow::authorization_url`] builds the provider authorize URL and a
//!   [`PendingAuthorization`] holding the CSRF state and PKCE verifier
//! - [`OAuthFlow::handle_callback`] parses the redirect the provider sends
//!   back, checks the state and exchanges the code for tokens
//!
//! The pending authorization must be kept by the host between the two calls.
//! Neither the verifier nor the code is ever logged.
//!
//! # Example
//!
//! ```no_run
//! use core_auth::{OAuthFlow, ProviderKind};
//! use core_runtime::config::ProviderSettings;
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let settings = ProviderSettings::new("app-key", "http://localhost:4200/dropbox-callback");
//! let flow = OAuthFlow::new(ProviderKind::Dropbox, settings, http_client);
//!
//! let (url, pending) = flow.authorization_url()?;
//! // Send the user to `url`; the provider redirects back to the host.
//! # let callback = String::new();
//! let tokens = flow.handle_callback(&callback, &pending).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{OAuthTokens, ProviderKind};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use core_runtime::config::ProviderSettings;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Authorize and token endpoints of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
}

impl OAuthEndpoints {
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Dropbox => Self {
                authorize_url: "https://www.dropbox.com/oauth2/authorize".to_string(),
                token_url: "https://api.dropboxapi.com/oauth2/token".to_string(),
            },
            ProviderKind::GoogleDrive => Self {
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
            },
        }
    }
}

/// State carried from the authorize redirect to the callback.
///
/// Holds the CSRF `state` and the PKCE code verifier. Only the challenge
/// derived from the verifier leaves the process before the token exchange.
#[derive(Clone)]
pub struct PendingAuthorization {
    verifier: String,
    state: String,
}

impl PendingAuthorization {
    /// Generate a 32-byte verifier and a 16-byte state, URL-safe base64.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);

        Self {
            verifier: URL_SAFE_NO_PAD.encode(verifier_bytes),
            state: URL_SAFE_NO_PAD.encode(state_bytes),
        }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// S256 challenge: BASE64URL(SHA256(verifier))
    pub fn challenge(&self) -> String {
        let hash = Sha256::digest(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }
}

impl fmt::Debug for PendingAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAuthorization")
            .field("verifier", &"[REDACTED]")
            .field("state", &self.state)
            .finish()
    }
}

/// Authorization code flow for one provider.
pub struct OAuthFlow {
    provider: ProviderKind,
    settings: ProviderSettings,
    endpoints: OAuthEndpoints,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthFlow {
    pub fn new(
        provider: ProviderKind,
        settings: ProviderSettings,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            provider,
            settings,
            endpoints: OAuthEndpoints::for_provider(provider),
            http_client,
        }
    }

    /// Override the provider endpoints (tests, proxies).
    pub fn with_endpoints(mut self, endpoints: OAuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Build the authorize URL the user is sent to.
    ///
    /// # Errors
    ///
    /// Fails only if the configured authorize endpoint is not a valid URL.
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub fn authorization_url(&self) -> Result<(String, PendingAuthorization)> {
        let pending = PendingAuthorization::generate();

        let mut url = Url::parse(&self.endpoints.authorize_url)
            .map_err(|e| AuthError::Other(format!("Invalid authorize URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.settings.client_id);
            query.append_pair("redirect_uri", &self.settings.redirect_uri);
            query.append_pair("response_type", "code");
            query.append_pair("state", pending.state());
            query.append_pair("code_challenge", &pending.challenge());
            query.append_pair("code_challenge_method", "S256");

            match self.provider {
                ProviderKind::Dropbox => {
                    query.append_pair("token_access_type", "offline");
                    if !self.settings.scopes.is_empty() {
                        query.append_pair("scope", &self.settings.scopes.join(" "));
                    }
                }
                ProviderKind::GoogleDrive => {
                    query.append_pair("access_type", "offline");
                    query.append_pair("scope", &self.settings.scopes.join(" "));
                }
            }
        }

        debug!("Built authorization URL");
        Ok((url.to_string(), pending))
    }

    /// Handle the redirect back from the provider.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthenticationFailed`] when the provider reports an
    ///   `error` (e.g. the user denied access)
    /// - [`AuthError::StateMismatch`] when `state` differs from the pending one
    /// - [`AuthError::InvalidCallback`] when the URL carries no code
    /// - token exchange errors from [`exchange_code`](Self::exchange_code)
    #[instrument(skip(self, callback_url, pending), fields(provider = %self.provider))]
    pub async fn handle_callback(
        &self,
        callback_url: &str,
        pending: &PendingAuthorization,
    ) -> Result<OAuthTokens> {
        let url = Url::parse(callback_url)
            .map_err(|e| AuthError::InvalidCallback(format!("Unparseable callback URL: {}", e)))?;

        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut error_description = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                "error_description" => error_description = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            let reason = match error_description {
                Some(description) => format!("{}: {}", error, description),
                None => error,
            };
            warn!(reason = %reason, "Provider returned an authorization error");
            return Err(AuthError::AuthenticationFailed {
                provider: self.provider.to_string(),
                reason,
            });
        }

        if state.as_deref() != Some(pending.state()) {
            warn!("OAuth state mismatch on callback");
            return Err(AuthError::StateMismatch);
        }

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::InvalidCallback("Missing authorization code".to_string()))?;

        self.exchange_code(&code, pending).await
    }

    /// Exchange an authorization code for tokens.
    #[instrument(skip(self, code, pending), fields(provider = %self.provider))]
    pub async fn exchange_code(
        &self,
        code: &str,
        pending: &PendingAuthorization,
    ) -> Result<OAuthTokens> {
        let mut params: Vec<(&str, &str)> = vec![
            ("code", code),
            ("grant_type", "authorization_code"),
            ("client_id", &self.settings.client_id),
            ("redirect_uri", &self.settings.redirect_uri),
            ("code_verifier", pending.verifier()),
        ];
        if let Some(secret) = self.settings.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let encoded_body = serde_urlencoded::to_string(&params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let request = HttpRequest::new(HttpMethod::Post, self.endpoints.token_url.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(encoded_body));

        debug!("Exchanging authorization code for tokens");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(status = status, "Token endpoint rejected the authorization code");
            return Err(AuthError::TokenExchange(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::TokenExchange(format!("Malformed token response: {}", e)))?;

        info!(
            expires_in = ?token_response.expires_in,
            "Exchanged authorization code for tokens"
        );

        Ok(OAuthTokens::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
        ))
    }
}

impl fmt::Debug for OAuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthFlow")
            .field("provider", &self.provider)
            .field("settings", &self.settings)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
