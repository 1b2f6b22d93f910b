//! Raw Records
//!
//! Wire-level shapes returned by the local backend and the cloud providers.
//! These are kept close to what each remote actually sends; the core turns
//! them into canonical records after tagging them with their source.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A size field as it arrives over the wire.
///
/// The backend sends numbers, Drive sends decimal strings, and some
/// records carry neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSize {
    Number(serde_json::Number),
    Text(String),
}

impl From<u64> for RawSize {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RawSize {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Binary payload tagged with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub content_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ============================================================================
// Local backend
// ============================================================================

/// Document row as serialized by the local backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDocument {
    pub id: i64,
    pub name: String,
    /// Base64 of the stored bytes.
    #[serde(default)]
    pub document: String,
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub size: Option<RawSize>,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
}

/// `GET /user/{id}` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub documents: Vec<LocalDocument>,
    #[serde(default)]
    pub dropbox_sync: bool,
    #[serde(default)]
    pub drive_sync: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFolder {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Multipart creation request for `POST /documents`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub name: String,
    pub user_id: i64,
    pub content: Bytes,
    pub doc_type: String,
    pub size: u64,
    pub folder_id: Option<i64>,
}

/// Multipart creation request for `POST /folders`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFolder {
    pub name: String,
    pub description: String,
    pub user_id: i64,
}

// ============================================================================
// Dropbox
// ============================================================================

/// File entry from a Dropbox folder listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropboxFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub client_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub server_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropboxFolder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub path_display: Option<String>,
}

// ============================================================================
// Google Drive
// ============================================================================

/// File resource from the Drive v3 API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Drive reports sizes as decimal strings; Workspace files have none.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub md5_checksum: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveFolder {
    pub id: String,
    pub name: String,
}

/// Result of a successful upload to either provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_size_accepts_number_and_string() {
        let number: RawSize = serde_json::from_str("1024").unwrap();
        let text: RawSize = serde_json::from_str("\"2048\"").unwrap();

        assert_eq!(number, RawSize::from(1024));
        assert_eq!(text, RawSize::from("2048"));
    }

    #[test]
    fn test_user_profile_from_backend_payload() {
        let payload = r#"{
            "id": 1,
            "username": "ana",
            "email": "ana@example.com",
            "password": "ignored",
            "documents": [{
                "id": 7,
                "name": "Report.pdf",
                "user_id": 1,
                "document": "JVBERi0=",
                "type": "application/pdf",
                "date_created": "2024-03-01T10:15:30.123456",
                "size": 1024
            }],
            "dropbox_sync": true,
            "drive_sync": false
        }"#;

        let profile: UserProfile = serde_json::from_str(payload).unwrap();
        assert!(profile.dropbox_sync);
        assert!(!profile.drive_sync);
        assert_eq!(profile.documents.len(), 1);

        let doc = &profile.documents[0];
        assert_eq!(doc.doc_type, "application/pdf");
        assert_eq!(doc.size, Some(RawSize::from(1024)));
        assert!(doc.date_created.is_some());
    }

    #[test]
    fn test_drive_file_camel_case() {
        let payload = r#"{
            "id": "abc",
            "name": "Budget",
            "mimeType": "application/vnd.google-apps.spreadsheet",
            "modifiedTime": "2024-01-02T03:04:05.000Z"
        }"#;

        let file: DriveFile = serde_json::from_str(payload).unwrap();
        assert_eq!(file.mime_type, "application/vnd.google-apps.spreadsheet");
        assert!(file.size.is_none());
        assert!(file.modified_time.is_some());
    }

    #[test]
    fn test_blob_len() {
        let blob = Blob::new(Bytes::from_static(b"abc"), "text/plain");
        assert_eq!(blob.len(), 3);
        assert!(!blob.is_empty());
    }
}
