//! # Dropbox Provider
//!
//! Implements `DropboxStorage` for the Dropbox HTTP API v2.
//!
//! ## Overview
//!
//! This module provides:
//! - Folder listing with cursor continuation
//! - Validated uploads (path normalization, 350 MB ceiling) with autorename
//! - Two download transports: `files/download` and a temporary link
//! - Session expiry when Dropbox reports the token as invalid
//!
//! Error messages are phrased for end users, e.g. "Invalid file path or
//! name" or "Access denied - check Dropbox permissions".

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{
    normalize_upload_path, DropboxConnector, DEFAULT_UPLOAD_PATH, MAX_UPLOAD_BYTES,
};
pub use error::{DropboxError, Result};
