//! Cloud Provider Capabilities
//!
//! Contracts for the two cloud stores the core reconciles against. Concrete
//! connectors live in `provider-dropbox` and `provider-google-drive`; the
//! orchestrator only sees these traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::records::{Blob, DriveFile, DriveFolder, DropboxFile, DropboxFolder, UploadedFile};

/// Progress report emitted after each page of a multi-page listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingProgress {
    pub fetched: usize,
    pub requests: u32,
}

pub type ProgressCallback = Arc<dyn Fn(ListingProgress) + Send + Sync>;

/// Options for [`DriveStorage::list_all_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveListOptions {
    /// Extra Drive query, AND-ed with the trashed filter.
    pub query: Option<String>,
    pub include_deleted: bool,
    pub max_results: usize,
    pub order_by: String,
}

impl Default for DriveListOptions {
    fn default() -> Self {
        Self {
            query: None,
            include_deleted: false,
            max_results: 10_000,
            order_by: "modifiedTime desc".to_string(),
        }
    }
}

/// Aggregated result of a paginated Drive listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveListing {
    pub files: Vec<DriveFile>,
    pub total_files: usize,
    pub total_requests: u32,
    pub query: String,
}

/// Downloadable form of a Drive file.
///
/// Workspace files are exported server-side, so `exported_name` carries the
/// extension of the export format.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveDocumentFile {
    pub metadata: DriveFile,
    pub base64_content: String,
    pub exported_name: String,
}

/// Dropbox-like provider
#[async_trait]
pub trait DropboxStorage: Send + Sync {
    /// Live view of the provider's auth session.
    fn is_authenticated(&self) -> bool;

    /// List files (not folders) directly under `path`; `""` is the root.
    async fn list_files(&self, path: &str) -> Result<Vec<DropboxFile>>;

    async fn list_folders(&self) -> Result<Vec<DropboxFolder>>;

    async fn get_folder_content(&self, path: &str) -> Result<Vec<DropboxFile>>;

    async fn upload_file(&self, blob: Blob, path: &str) -> Result<UploadedFile>;

    /// Primary download transport.
    async fn download_file(&self, path: &str) -> Result<Blob>;

    /// Secondary download transport, used when the primary one fails.
    async fn download_file_direct_api(&self, path: &str) -> Result<Blob>;
}

/// Drive-like provider
#[async_trait]
pub trait DriveStorage: Send + Sync {
    /// Live view of the provider's auth session.
    fn is_authenticated(&self) -> bool;

    async fn list_all_files(
        &self,
        options: DriveListOptions,
        progress: Option<ProgressCallback>,
    ) -> Result<DriveListing>;

    async fn upload_file(&self, blob: Blob, name: &str) -> Result<UploadedFile>;

    async fn list_folders(&self) -> Result<Vec<DriveFolder>>;

    async fn list_files_in_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>>;

    /// Fetch a file in downloadable form, exporting Workspace formats.
    async fn get_document_file(&self, file_id: &str) -> Result<DriveDocumentFile>;

    /// Raw `alt=media` download, the fallback transport.
    async fn download_file(&self, file_id: &str) -> Result<Blob>;
}
