//! Dropbox API v2 request and response types
//!
//! File and folder entries deserialize straight into the shared
//! `bridge_traits::records` shapes.

use bridge_traits::records::{DropboxFile, DropboxFolder};
use serde::{Deserialize, Serialize};

/// Body of `files/list_folder`
#[derive(Debug, Serialize)]
pub struct ListFolderArg<'a> {
    pub path: &'a str,
    pub recursive: bool,
    pub include_media_info: bool,
    pub include_deleted: bool,
    pub include_has_explicit_shared_members: bool,
}

impl<'a> ListFolderArg<'a> {
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            recursive: false,
            include_media_info: false,
            include_deleted: false,
            include_has_explicit_shared_members: false,
        }
    }
}

/// Body of `files/list_folder/continue`
#[derive(Debug, Serialize)]
pub struct ListFolderContinueArg<'a> {
    pub cursor: &'a str,
}

/// Page of a folder listing
#[derive(Debug, Deserialize)]
pub struct ListFolderResult {
    #[serde(default)]
    pub entries: Vec<Metadata>,
    #[serde(default)]
    pub cursor: String,
    #[serde(default)]
    pub has_more: bool,
}

/// Listing entry, discriminated by `.tag`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
pub enum Metadata {
    File(DropboxFile),
    Folder(DropboxFolder),
    /// `deleted` entries and tags this client does not know
    #[serde(other)]
    Other,
}

/// `Dropbox-API-Arg` of `files/upload`
#[derive(Debug, Serialize)]
pub struct UploadArg<'a> {
    pub path: &'a str,
    pub mode: &'static str,
    pub autorename: bool,
    pub mute: bool,
}

impl<'a> UploadArg<'a> {
    /// Add as a new file, renaming on conflict.
    pub fn add(path: &'a str) -> Self {
        Self {
            path,
            mode: "add",
            autorename: true,
            mute: false,
        }
    }
}

/// Single-path argument used by download, delete and temporary links
#[derive(Debug, Serialize)]
pub struct PathArg<'a> {
    pub path: &'a str,
}

/// `files/upload` response
#[derive(Debug, Deserialize)]
pub struct UploadResult {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// `files/get_temporary_link` response
#[derive(Debug, Deserialize)]
pub struct TemporaryLink {
    pub link: String,
}

/// Error envelope of non-2xx API responses
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_summary: String,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// `.tag` of the structured error, if any.
    pub fn tag(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|error| error.get(".tag"))
            .and_then(serde_json::Value::as_str)
    }

    /// True when the body reports an invalid or revoked token.
    pub fn is_invalid_token(&self) -> bool {
        self.tag() == Some("invalid_access_token")
            || self.error_summary.contains("invalid_access_token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_folder_entries_by_tag() {
        let json = r#"{
            "entries": [
                {".tag": "folder", "id": "id:f", "name": "Invoices", "path_lower": "/invoices"},
                {".tag": "file", "id": "id:a", "name": "Report.pdf", "path_lower": "/report.pdf",
                 "client_modified": "2024-03-01T10:00:00Z", "size": 1024, "content_hash": "abc"},
                {".tag": "deleted", "name": "old.txt", "path_lower": "/old.txt"}
            ],
            "cursor": "c1",
            "has_more": true
        }"#;

        let result: ListFolderResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.entries.len(), 3);
        assert!(matches!(&result.entries[0], Metadata::Folder(folder) if folder.name == "Invoices"));
        assert!(matches!(&result.entries[1], Metadata::File(file) if file.size == 1024));
        assert_eq!(result.entries[2], Metadata::Other);
        assert!(result.has_more);
    }

    #[test]
    fn test_upload_arg() {
        let json = serde_json::to_value(UploadArg::add("/a.pdf")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"path": "/a.pdf", "mode": "add", "autorename": true, "mute": false})
        );
    }

    #[test]
    fn test_invalid_token_detection() {
        let tagged: ApiErrorBody = serde_json::from_str(
            r#"{"error_summary": "expired_access_token/", "error": {".tag": "invalid_access_token"}}"#,
        )
        .unwrap();
        assert!(tagged.is_invalid_token());

        let summary: ApiErrorBody =
            serde_json::from_str(r#"{"error_summary": "invalid_access_token/..."}"#).unwrap();
        assert!(summary.is_invalid_token());

        let other: ApiErrorBody =
            serde_json::from_str(r#"{"error_summary": "path/not_found/", "error": {".tag": "path"}}"#)
                .unwrap();
        assert!(!other.is_invalid_token());
        assert_eq!(other.tag(), Some("path"));
    }
}
