use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },
}

/// Failures converting between encoded text and binary content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Malformed base64, an undecodable data URL, or an empty payload.
    #[error("Invalid document format")]
    InvalidFormat,
}

pub type Result<T> = std::result::Result<T, LibraryError>;
