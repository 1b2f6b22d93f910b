//! Google Drive API response types
//!
//! Data structures for (de)serializing Google Drive API v3 payloads. File
//! resources themselves are `bridge_traits::records::DriveFile`.

use bridge_traits::records::{DriveFile, DriveFolder};
use serde::{Deserialize, Serialize};

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// files.list response when only `files(id,name)` is requested
#[derive(Debug, Deserialize)]
pub struct FolderListResponse {
    #[serde(default)]
    pub files: Vec<DriveFolder>,
}

/// about.get response with `fields=user`
#[derive(Debug, Deserialize)]
pub struct AboutResponse {
    pub user: DriveUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveUser {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: Option<String>,
}

/// Metadata sent with files.create, for uploads and new folders
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<&'a str>,
}

/// files.create response for a multipart upload
#[derive(Debug, Deserialize)]
pub struct CreatedFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
}

/// Error envelope Drive wraps non-2xx bodies in
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}
