use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Provider {provider} authentication failed: {reason}")]
    AuthenticationFailed { provider: String, reason: String },

    #[error("Invalid session transition for {provider}: {from} -> {to}")]
    InvalidTransition {
        provider: String,
        from: String,
        to: String,
    },

    #[error("OAuth state mismatch (possible CSRF)")]
    StateMismatch,

    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("Timed out waiting for {0} authentication")]
    Timeout(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
