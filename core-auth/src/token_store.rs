//! Secure Token Storage
//!
//! Persists provider tokens through the host's [`SecureStore`] under each
//! provider's well-known key.
//!
//! ## Storage Format
//!
//! Tokens are written as JSON. A value that is not JSON is read back as a
//! bare access token, which is how earlier clients stored them.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{OAuthTokens, ProviderKind, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(secure_store);
//!
//! let tokens = OAuthTokens::access_only("sl.token");
//! token_store.store_tokens(ProviderKind::Dropbox, &tokens).await?;
//!
//! let retrieved = token_store.retrieve_tokens(ProviderKind::Dropbox).await?;
//! token_store.delete_tokens(ProviderKind::Dropbox).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{OAuthTokens, ProviderKind};
use bridge_traits::storage::SecureStore;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Secure storage for provider tokens
///
/// Token values are never logged; failures are reported without them.
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
}

/// Serializable wrapper for OAuth tokens
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        debug!("Initializing TokenStore");
        Self { secure_store }
    }

    /// Store tokens for a provider, overwriting any previous value.
    pub async fn store_tokens(&self, provider: ProviderKind, tokens: &OAuthTokens) -> Result<()> {
        let stored = StoredTokens {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at.map(|at| at.timestamp()),
        };

        let json = serde_json::to_vec(&stored).map_err(|e| {
            warn!(provider = %provider, "Failed to serialize tokens");
            AuthError::Other(format!("Token serialization failed: {}", e))
        })?;

        self.secure_store
            .set_secret(provider.token_key(), &json)
            .await
            .map_err(|e| {
                warn!(provider = %provider, error = %e, "Failed to store tokens");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(provider = %provider, "Stored provider tokens");
        Ok(())
    }

    /// Retrieve tokens for a provider, `None` when nothing is stored.
    pub async fn retrieve_tokens(&self, provider: ProviderKind) -> Result<Option<OAuthTokens>> {
        let raw = self
            .secure_store
            .get_secret(provider.token_key())
            .await
            .map_err(|e| {
                warn!(provider = %provider, error = %e, "Failed to read tokens");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        let Some(raw) = raw else {
            debug!(provider = %provider, "No stored tokens");
            return Ok(None);
        };

        if let Ok(stored) = serde_json::from_slice::<StoredTokens>(&raw) {
            let expires_at = stored
                .expires_at
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
            return Ok(Some(OAuthTokens {
                access_token: stored.access_token,
                refresh_token: stored.refresh_token,
                expires_at,
            }));
        }

        let bare = String::from_utf8(raw)
            .map_err(|_| AuthError::Other("Stored token is not valid UTF-8".to_string()))?;
        let bare = bare.trim();
        if bare.is_empty() {
            return Ok(None);
        }

        debug!(provider = %provider, "Loaded bare access token");
        Ok(Some(OAuthTokens::access_only(bare)))
    }

    pub async fn delete_tokens(&self, provider: ProviderKind) -> Result<()> {
        self.secure_store
            .delete_secret(provider.token_key())
            .await
            .map_err(|e| {
                warn!(provider = %provider, error = %e, "Failed to delete tokens");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(provider = %provider, "Deleted provider tokens");
        Ok(())
    }

    pub async fn has_tokens(&self, provider: ProviderKind) -> Result<bool> {
        Ok(self.retrieve_tokens(provider).await?.is_some())
    }
}
