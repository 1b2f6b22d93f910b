use bridge_traits::error::BridgeError;
use core_auth::ProviderKind;
use core_library::LibraryError;
use core_runtime::events::NotificationSeverity;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Document {name} has no source location")]
    MissingLocator { name: String },

    #[error("Downloaded content for {name} is empty")]
    EmptyContent { name: String },

    #[error("{provider} authentication expired")]
    AuthExpired { provider: ProviderKind },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{provider} sync is disabled")]
    SyncDisabled { provider: ProviderKind },

    #[error("{provider} is not connected")]
    NotConfigured { provider: ProviderKind },

    #[error("Document {name} has no content")]
    MissingContent { name: String },

    #[error("Invalid document format")]
    InvalidFormat,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },
}

impl SyncError {
    /// Map a failure reported by a cloud provider.
    pub fn from_provider(provider: ProviderKind, error: BridgeError) -> Self {
        match error {
            BridgeError::Unauthorized(_) => SyncError::AuthExpired { provider },
            BridgeError::NotFound(what) => SyncError::NotFound(what),
            other => SyncError::Provider(other.to_string()),
        }
    }

    /// Map a failure reported by the local backend.
    pub fn from_backend(error: BridgeError) -> Self {
        match error {
            BridgeError::NotFound(what) => SyncError::NotFound(what),
            other => SyncError::Backend(other.to_string()),
        }
    }

    /// Map a failure materializing a document's content.
    pub fn from_content(name: &str, error: LibraryError) -> Self {
        match error {
            LibraryError::Codec(_) => SyncError::InvalidFormat,
            LibraryError::InvalidInput { .. } => SyncError::MissingContent {
                name: name.to_string(),
            },
            LibraryError::Bridge(inner) => SyncError::Backend(inner.to_string()),
        }
    }

    /// Detail line shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::MissingLocator { name } => {
                format!("{} has no cloud location to download from", name)
            }
            SyncError::EmptyContent { name } => format!("{} is empty or invalid", name),
            SyncError::AuthExpired { provider } => {
                format!("{} session expired. Please sign in again.", provider)
            }
            SyncError::NotFound(_) => "File no longer exists at its source".to_string(),
            SyncError::SyncDisabled { provider } => {
                format!("Enable {} sync in settings first", provider)
            }
            SyncError::NotConfigured { provider } => format!("Connect {} first", provider),
            SyncError::MissingContent { name } => format!("{} has no content to upload", name),
            SyncError::InvalidFormat => "Invalid document format".to_string(),
            SyncError::Provider(message) => message.clone(),
            SyncError::Backend(message) => format!("Failed to save document: {}", message),
            SyncError::InvalidStateTransition { .. } => self.to_string(),
        }
    }

    /// Validation failures are caught before any request and reported as
    /// warnings; everything else is an error.
    pub fn severity(&self) -> NotificationSeverity {
        match self {
            SyncError::MissingLocator { .. }
            | SyncError::EmptyContent { .. }
            | SyncError::SyncDisabled { .. }
            | SyncError::NotConfigured { .. }
            | SyncError::MissingContent { .. } => NotificationSeverity::Warn,
            _ => NotificationSeverity::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::CodecError;

    #[test]
    fn test_provider_error_mapping() {
        let expired = SyncError::from_provider(
            ProviderKind::Dropbox,
            BridgeError::Unauthorized("invalid_access_token".into()),
        );
        assert!(matches!(
            expired,
            SyncError::AuthExpired {
                provider: ProviderKind::Dropbox
            }
        ));

        let missing = SyncError::from_provider(
            ProviderKind::GoogleDrive,
            BridgeError::NotFound("file abc".into()),
        );
        assert!(matches!(missing, SyncError::NotFound(_)));

        let transient = SyncError::from_provider(
            ProviderKind::GoogleDrive,
            BridgeError::OperationFailed("timeout".into()),
        );
        assert!(matches!(transient, SyncError::Provider(_)));
    }

    #[test]
    fn test_content_error_mapping() {
        let err = SyncError::from_content("a.pdf", LibraryError::Codec(CodecError::InvalidFormat));
        assert!(matches!(err, SyncError::InvalidFormat));
        assert_eq!(err.user_message(), "Invalid document format");

        let err = SyncError::from_content(
            "a.pdf",
            LibraryError::InvalidInput {
                field: "content".into(),
                message: "a.pdf has no content".into(),
            },
        );
        assert!(matches!(err, SyncError::MissingContent { .. }));
    }

    #[test]
    fn test_severity_split() {
        assert_eq!(
            SyncError::MissingLocator { name: "x".into() }.severity(),
            NotificationSeverity::Warn
        );
        assert_eq!(
            SyncError::SyncDisabled {
                provider: ProviderKind::Dropbox
            }
            .severity(),
            NotificationSeverity::Warn
        );
        assert_eq!(
            SyncError::AuthExpired {
                provider: ProviderKind::GoogleDrive
            }
            .severity(),
            NotificationSeverity::Error
        );
        assert_eq!(
            SyncError::Provider("boom".into()).severity(),
            NotificationSeverity::Error
        );
    }

    #[test]
    fn test_user_messages_name_the_provider() {
        let err = SyncError::AuthExpired {
            provider: ProviderKind::GoogleDrive,
        };
        assert_eq!(
            err.user_message(),
            "Google Drive session expired. Please sign in again."
        );
        assert_eq!(err.to_string(), "Google Drive authentication expired");
    }
}
