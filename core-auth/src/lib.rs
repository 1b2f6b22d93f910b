//! # Authentication Module
//!
//! Explicit per-provider auth sessions for Dropbox and Google Drive.
//!
//! ## Overview
//!
//! Each provider gets an [`AuthSession`] that owns its access token and
//! lifecycle state (`Unauthenticated`, `Authenticating`, `Authenticated`,
//! `Expired`). Sessions are passed to the connectors that need them; there
//! is no process-wide token state.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization code flow with PKCE and CSRF state ([`OAuthFlow`])
//! - Token persistence via the host secure store ([`TokenStore`])
//! - Auto sign-out when a provider rejects the token ([`AuthSession::mark_expired`])
//! - Awaitable state changes instead of polling ([`AuthSession::wait_until_settled`])

pub mod error;
pub mod oauth;
pub mod session;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use oauth::{OAuthEndpoints, OAuthFlow, PendingAuthorization};
pub use session::AuthSession;
pub use token_store::TokenStore;
pub use types::{AuthState, OAuthTokens, ProviderKind};
