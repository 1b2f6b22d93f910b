//! Core authentication types
//!
//! Provider identity, OAuth token material and the session state machine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cloud storage provider type
///
/// # Examples
///
/// ```
/// use core_auth::ProviderKind;
///
/// let provider = ProviderKind::Dropbox;
/// assert_eq!(provider.display_name(), "Dropbox");
/// assert_eq!(provider.token_key(), "dropbox_access_token");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Dropbox,
    GoogleDrive,
}

impl ProviderKind {
    /// Human-readable name of the provider
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Dropbox => "Dropbox",
            ProviderKind::GoogleDrive => "Google Drive",
        }
    }

    /// Identifier used in events and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Dropbox => "dropbox",
            ProviderKind::GoogleDrive => "google_drive",
        }
    }

    /// Secure-store key the provider's access token is persisted under.
    ///
    /// These names match what earlier clients wrote, so a token saved by
    /// them is picked up by [`AuthSession::restore`](crate::AuthSession::restore).
    pub fn token_key(&self) -> &'static str {
        match self {
            ProviderKind::Dropbox => "dropbox_access_token",
            ProviderKind::GoogleDrive => "googleDriveAccessToken",
        }
    }

    /// Parse a provider from a string (case-insensitive)
    ///
    /// ```
    /// use core_auth::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse("dropbox"), Some(ProviderKind::Dropbox));
    /// assert_eq!(ProviderKind::parse("google-drive"), Some(ProviderKind::GoogleDrive));
    /// assert_eq!(ProviderKind::parse("onedrive"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dropbox" => Some(ProviderKind::Dropbox),
            "googledrive" | "google_drive" | "google-drive" | "drive" => {
                Some(ProviderKind::GoogleDrive)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// OAuth 2.0 token material for one provider.
///
/// The `Debug` implementation never prints token values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Absent when the provider issued a non-expiring token
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuthTokens {
    /// Create tokens from a token endpoint response.
    ///
    /// ```
    /// use core_auth::OAuthTokens;
    ///
    /// let tokens = OAuthTokens::new("sl.access".to_string(), None, Some(14400));
    /// assert!(!tokens.is_expired());
    /// ```
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: Option<i64>) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    /// Wrap a bare access token with no expiry information.
    pub fn access_only(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Check if the access token is expired or will expire within 5 minutes
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(300)
    }

    /// Check if the access token is expired with a custom buffer
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at - Duration::seconds(buffer_seconds),
            None => false,
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authentication state of a provider session.
///
/// # State Transitions
///
/// ```text
/// Unauthenticated -> Authenticating -> Authenticated
///        ^                 |                |
///        |  (fail)         |                | (401)
///        +-----------------+                v
///        +---------------(sign out)------ Expired
/// ```
///
/// `sign_out` returns any state to `Unauthenticated`; an `Expired` session
/// may start a new flow directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
    Expired,
}

impl AuthState {
    /// Returns `true` only when a usable token is held.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    /// Returns `true` while an authorization flow is in flight.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, AuthState::Authenticating)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated => "authenticated",
            AuthState::Expired => "expired",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
