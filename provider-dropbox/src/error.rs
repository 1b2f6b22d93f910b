//! Error types for Dropbox provider
//!
//! Display strings are what the user sees, so they describe the problem
//! rather than the HTTP exchange.

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DropboxError {
    /// No token in the session
    #[error("Not authenticated with Dropbox")]
    NotAuthenticated,

    /// Dropbox rejected the token
    #[error("Dropbox authentication expired")]
    AuthExpired,

    #[error("File is empty or invalid")]
    EmptyFile,

    /// Rejected locally, before any request
    #[error("File too large (max 350MB)")]
    FileTooLarge,

    #[error("Invalid file path or name")]
    MalformedPath,

    #[error("File name not allowed by Dropbox")]
    DisallowedName,

    /// Rejected by Dropbox
    #[error("File is too large")]
    TooLarge,

    #[error("Insufficient Dropbox storage space")]
    InsufficientSpace,

    #[error("Upload failed - invalid request")]
    InvalidRequest,

    #[error("Access denied - check Dropbox permissions")]
    AccessDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dropbox API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Dropbox operations
pub type Result<T> = std::result::Result<T, DropboxError>;

impl DropboxError {
    fn status_code(&self) -> u16 {
        match self {
            Self::AccessDenied => 403,
            Self::InsufficientSpace => 507,
            Self::ApiError { status_code, .. } => *status_code,
            _ => 400,
        }
    }
}

impl From<DropboxError> for BridgeError {
    fn from(error: DropboxError) -> Self {
        match error {
            DropboxError::NotAuthenticated | DropboxError::AuthExpired => {
                BridgeError::Unauthorized(error.to_string())
            }
            DropboxError::NotFound(path) => BridgeError::NotFound(path),
            DropboxError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            DropboxError::EmptyFile | DropboxError::FileTooLarge => {
                BridgeError::OperationFailed(error.to_string())
            }
            DropboxError::ApiError {
                status_code,
                message,
            } => BridgeError::Rejected {
                status: status_code,
                message,
            },
            DropboxError::BridgeError(e) => e,
            other => BridgeError::Rejected {
                status: other.status_code(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            DropboxError::AccessDenied.to_string(),
            "Access denied - check Dropbox permissions"
        );
        assert_eq!(
            DropboxError::InvalidRequest.to_string(),
            "Upload failed - invalid request"
        );
    }

    #[test]
    fn test_error_conversion() {
        let bridge_error: BridgeError = DropboxError::AuthExpired.into();
        assert!(bridge_error.is_unauthorized());

        let bridge_error: BridgeError = DropboxError::InsufficientSpace.into();
        match bridge_error {
            BridgeError::Rejected { status, message } => {
                assert_eq!(status, 507);
                assert_eq!(message, "Insufficient Dropbox storage space");
            }
            other => panic!("unexpected {:?}", other),
        }

        let bridge_error: BridgeError = DropboxError::NotFound("/a.pdf".into()).into();
        assert!(bridge_error.is_not_found());
    }
}
