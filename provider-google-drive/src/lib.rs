//! # Google Drive Provider
//!
//! Implements `DriveStorage` for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Paginated listing with query composition, progress reports and caps
//! - Multipart uploads, folder listing and creation
//! - Workspace export (Docs to `.docx`, Sheets to `.xlsx`, ...) and raw downloads
//! - Session expiry on 401 and exponential backoff on 429/5xx

pub mod connector;
pub mod error;
pub mod export;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
pub use export::{export_format, is_workspace_file, ExportFormat};
