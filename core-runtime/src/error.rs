//! Errors raised while assembling the runtime: configuration, missing host
//! bridges and logging setup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid backend URL, user id, provider settings or log filter
    #[error("Configuration error: {0}")]
    Config(String),

    /// A bridge the host must inject was not provided
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Internal runtime error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
