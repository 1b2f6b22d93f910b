//! # Provider Auth Session
//!
//! One [`AuthSession`] per cloud provider, shared as `Arc<AuthSession>` with
//! every connector that makes authenticated calls.
//!
//! ## Overview
//!
//! The session owns the provider's access token and its lifecycle state.
//! Every change goes through an explicit transition method; a transition
//! that makes no sense from the current state fails with
//! [`AuthError::InvalidTransition`] instead of silently overwriting state.
//!
//! The current state is published on a `tokio::sync::watch` channel, so
//! callers waiting for an authorization flow to finish await the channel
//! rather than polling.
//!
//! ## Usage
//!
//! ```ignore
//! let session = Arc::new(AuthSession::new(ProviderKind::Dropbox, token_store));
//! session.restore().await?;
//!
//! if !session.is_authenticated() {
//!     session.begin_authentication().await?;
//!     // ... redirect, callback, token exchange ...
//!     session.complete(tokens).await?;
//! }
//!
//! let token = session.access_token().await?;
//! ```

use crate::error::{AuthError, Result};
use crate::token_store::TokenStore;
use crate::types::{AuthState, OAuthTokens, ProviderKind};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, instrument, warn};

/// Authentication state and token for a single provider.
pub struct AuthSession {
    provider: ProviderKind,
    token_store: TokenStore,
    state_tx: watch::Sender<AuthState>,
    // Also serializes transitions
    tokens: RwLock<Option<OAuthTokens>>,
    event_bus: Option<EventBus>,
}

impl AuthSession {
    pub fn new(provider: ProviderKind, token_store: TokenStore) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            provider,
            token_store,
            state_tx,
            tokens: RwLock::new(None),
            event_bus: None,
        }
    }

    /// Publish state changes and sign-outs on the given bus.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Current state.
    pub fn state(&self) -> AuthState {
        *self.state_tx.borrow()
    }

    /// Live authentication flag; a synchronous read of the current state.
    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Access token for an authenticated session.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] unless the session is `Authenticated`.
    pub async fn access_token(&self) -> Result<String> {
        let tokens = self.tokens.read().await;
        match (self.state(), tokens.as_ref()) {
            (AuthState::Authenticated, Some(tokens)) => Ok(tokens.access_token.clone()),
            _ => Err(AuthError::NotAuthenticated),
        }
    }

    /// Load a persisted token at start-up.
    ///
    /// Returns `true` when a token was found and the session is now
    /// `Authenticated`. Only valid from `Unauthenticated`.
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn restore(&self) -> Result<bool> {
        let mut tokens = self.tokens.write().await;
        self.ensure_from(&[AuthState::Unauthenticated], AuthState::Authenticated)?;

        match self.token_store.retrieve_tokens(self.provider).await? {
            Some(stored) => {
                *tokens = Some(stored);
                self.transition(AuthState::Authenticated);
                info!("Restored persisted session");
                Ok(true)
            }
            None => {
                debug!("No persisted session to restore");
                Ok(false)
            }
        }
    }

    /// Start an authorization flow.
    ///
    /// Allowed from `Unauthenticated`, `Expired`, and `Authenticating` (a
    /// restarted flow supersedes the pending one).
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn begin_authentication(&self) -> Result<()> {
        let _guard = self.tokens.write().await;
        self.ensure_from(
            &[
                AuthState::Unauthenticated,
                AuthState::Expired,
                AuthState::Authenticating,
            ],
            AuthState::Authenticating,
        )?;
        self.transition(AuthState::Authenticating);
        Ok(())
    }

    /// Finish a flow with the tokens returned by the provider.
    ///
    /// The token is persisted before the state flips, so a storage failure
    /// leaves the session `Authenticating` and the caller can `fail` it.
    #[instrument(skip(self, new_tokens), fields(provider = %self.provider))]
    pub async fn complete(&self, new_tokens: OAuthTokens) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        self.ensure_from(&[AuthState::Authenticating], AuthState::Authenticated)?;

        self.token_store
            .store_tokens(self.provider, &new_tokens)
            .await?;
        *tokens = Some(new_tokens);
        self.transition(AuthState::Authenticated);
        info!("Authentication completed");
        Ok(())
    }

    /// Abandon an in-flight flow.
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn fail(&self, reason: &str) -> Result<()> {
        let _guard = self.tokens.write().await;
        self.ensure_from(&[AuthState::Authenticating], AuthState::Unauthenticated)?;

        warn!(reason = %reason, "Authentication failed");
        self.transition(AuthState::Unauthenticated);
        self.publish(AuthEvent::AuthError {
            provider: self.provider.as_str().to_string(),
            message: reason.to_string(),
        });
        Ok(())
    }

    /// React to the provider rejecting the token (HTTP 401 or an
    /// invalid-token marker).
    ///
    /// Clears the token in memory and in the secure store so the next action
    /// prompts for re-authentication. Repeated calls on an already expired
    /// session are no-ops.
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn mark_expired(&self) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        if self.state() == AuthState::Expired {
            return Ok(());
        }
        self.ensure_from(&[AuthState::Authenticated], AuthState::Expired)?;

        *tokens = None;
        self.transition(AuthState::Expired);
        if let Err(e) = self.token_store.delete_tokens(self.provider).await {
            warn!(error = %e, "Failed to clear persisted token after expiry");
        }

        warn!("Provider rejected the access token; session expired");
        self.publish(AuthEvent::SessionExpired {
            provider: self.provider.as_str().to_string(),
        });
        Ok(())
    }

    /// Explicit sign-out; valid from any state.
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn sign_out(&self) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        *tokens = None;
        self.token_store.delete_tokens(self.provider).await?;
        self.transition(AuthState::Unauthenticated);

        info!("Signed out");
        self.publish(AuthEvent::SignedOut {
            provider: self.provider.as_str().to_string(),
        });
        Ok(())
    }

    /// Wait until no authorization flow is in flight and return the
    /// resulting state.
    ///
    /// # Errors
    ///
    /// [`AuthError::Timeout`] if the flow has not settled within `timeout`.
    pub async fn wait_until_settled(&self, timeout: Duration) -> Result<AuthState> {
        let mut receiver = self.state_tx.subscribe();
        let settled = tokio::time::timeout(
            timeout,
            receiver.wait_for(|state| !state.is_in_progress()),
        )
        .await
        .map_err(|_| AuthError::Timeout(self.provider.display_name().to_string()))?;

        match settled {
            Ok(state) => Ok(*state),
            Err(_) => Err(AuthError::Other("Session state channel closed".to_string())),
        }
    }

    fn ensure_from(&self, allowed: &[AuthState], to: AuthState) -> Result<()> {
        let from = self.state();
        if allowed.contains(&from) {
            Ok(())
        } else {
            Err(AuthError::InvalidTransition {
                provider: self.provider.as_str().to_string(),
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn transition(&self, to: AuthState) {
        let from = self.state_tx.send_replace(to);
        if from != to {
            debug!(from = %from, to = %to, "Session state changed");
            self.publish(AuthEvent::StateChanged {
                provider: self.provider.as_str().to_string(),
                state: to.to_string(),
            });
        }
    }

    fn publish(&self, event: AuthEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is fine
            let _ = bus.emit(CoreEvent::Auth(event));
        }
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("provider", &self.provider)
            .field("state", &self.state())
            .finish()
    }
}
