//! Domain models for the reconciled document view
//!
//! Raw provider records are wrapped in [`SourceRecord`] at the boundary so
//! provenance is always explicit, then turned into canonical
//! [`DocumentRecord`]s carrying a comparison key and a set of source tags.

use crate::classifier::{classify, mime_from_file_name, TypeHints};
use crate::codec;
use crate::error::{LibraryError, Result};
use crate::normalizer::{comparison_key, normalize_size};
use bridge_traits::records::{
    Blob, DriveFile, DriveFolder, DropboxFile, DropboxFolder, LocalDocument, LocalFolder, RawSize,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Provenance
// =============================================================================

/// Store a document was listed by.
///
/// The declaration order is the merge precedence: local, then Dropbox, then
/// Drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Local,
    Dropbox,
    Drive,
}

impl SourceTag {
    pub const ALL: [SourceTag; 3] = [SourceTag::Local, SourceTag::Dropbox, SourceTag::Drive];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Local => "local",
            SourceTag::Dropbox => "dropbox",
            SourceTag::Drive => "drive",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a folder, as the navigation layer names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderSource {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "dropbox")]
    Dropbox,
    #[serde(rename = "google-drive")]
    GoogleDrive,
}

impl FolderSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderSource::Local => "local",
            FolderSource::Dropbox => "dropbox",
            FolderSource::GoogleDrive => "google-drive",
        }
    }
}

impl fmt::Display for FolderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Source records
// =============================================================================

/// A raw listing entry together with the store it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Local(LocalDocument),
    Dropbox(DropboxFile),
    Drive(DriveFile),
}

impl SourceRecord {
    pub fn tag(&self) -> SourceTag {
        match self {
            SourceRecord::Local(_) => SourceTag::Local,
            SourceRecord::Dropbox(_) => SourceTag::Dropbox,
            SourceRecord::Drive(_) => SourceTag::Drive,
        }
    }

    /// Provider-assigned id. Never used for matching.
    pub fn identity(&self) -> String {
        match self {
            SourceRecord::Local(doc) => doc.id.to_string(),
            SourceRecord::Dropbox(file) => file.id.clone(),
            SourceRecord::Drive(file) => file.id.clone(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SourceRecord::Local(doc) => &doc.name,
            SourceRecord::Dropbox(file) => &file.name,
            SourceRecord::Drive(file) => &file.name,
        }
    }

    /// Size in bytes, coerced from whatever the store reported.
    pub fn size_bytes(&self) -> u64 {
        match self {
            SourceRecord::Local(doc) => doc.size.as_ref().map(normalize_size).unwrap_or(0),
            SourceRecord::Dropbox(file) => file.size,
            SourceRecord::Drive(file) => file
                .size
                .as_deref()
                .map(|size| normalize_size(&RawSize::from(size)))
                .unwrap_or(0),
        }
    }

    pub fn comparison_key(&self) -> String {
        comparison_key(Some(self.name()), self.size_bytes())
    }

    /// Where the bytes can be fetched from; local records have none.
    pub fn origin(&self) -> Option<OriginLocator> {
        match self {
            SourceRecord::Local(_) => None,
            SourceRecord::Dropbox(file) => file
                .path_lower
                .clone()
                .filter(|path| !path.is_empty())
                .map(OriginLocator::DropboxPath),
            SourceRecord::Drive(file) => Some(OriginLocator::DriveFileId(file.id.clone())),
        }
    }

    pub fn type_hints(&self) -> TypeHints<'_> {
        match self {
            SourceRecord::Local(doc) => TypeHints {
                local_type: Some(&doc.doc_type),
                file_name: Some(&doc.name),
                ..Default::default()
            },
            SourceRecord::Dropbox(file) => TypeHints {
                dropbox_path: file.path_lower.as_deref(),
                file_name: Some(&file.name),
                ..Default::default()
            },
            SourceRecord::Drive(file) => TypeHints {
                drive_mime: Some(&file.mime_type),
                file_name: Some(&file.name),
                ..Default::default()
            },
        }
    }

    /// MIME type of the stored bytes, guessed from the name when the store
    /// does not report one.
    pub fn content_type(&self) -> String {
        let reported = match self {
            SourceRecord::Local(doc) => doc.doc_type.as_str(),
            SourceRecord::Dropbox(_) => "",
            SourceRecord::Drive(file) => file.mime_type.as_str(),
        };
        match reported.trim() {
            "" => mime_from_file_name(self.name()).to_string(),
            mime => mime.to_string(),
        }
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SourceRecord::Local(doc) => doc.date_created.map(|at| at.and_utc()),
            SourceRecord::Dropbox(file) => file.server_modified.or(file.client_modified),
            SourceRecord::Drive(file) => file.modified_time.or(file.created_time),
        }
    }

    /// Canonical record tagged with this record's source.
    pub fn into_document(self) -> DocumentRecord {
        let key = self.comparison_key();
        let mime_or_type = classify(&self.type_hints());
        let content_type = self.content_type();
        let size_bytes = self.size_bytes();
        let identity = self.identity();
        let origin = self.origin();
        let modified_at = self.modified_at();
        let tag = self.tag();

        let (display_name, content) = match self {
            SourceRecord::Local(doc) => {
                let content = Some(doc.document)
                    .filter(|encoded| !encoded.is_empty())
                    .map(DocumentContent::Encoded);
                (doc.name, content)
            }
            SourceRecord::Dropbox(file) => (file.name, None),
            SourceRecord::Drive(file) => (file.name, None),
        };

        DocumentRecord {
            identity,
            key,
            display_name,
            size_bytes,
            mime_or_type,
            content_type,
            content,
            source_tags: BTreeSet::from([tag]),
            origin,
            modified_at,
        }
    }
}

// =============================================================================
// Canonical records
// =============================================================================

/// Locator used to fetch a cloud document's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OriginLocator {
    /// `path_lower` of a Dropbox file
    DropboxPath(String),
    DriveFileId(String),
}

/// In-memory content of a document, once materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    /// Base64 or data URL, as the local backend stores it
    Encoded(String),
    /// Bytes fetched from a cloud provider
    Binary(Bytes),
}

impl DocumentContent {
    pub fn is_empty(&self) -> bool {
        match self {
            DocumentContent::Encoded(text) => text.trim().is_empty(),
            DocumentContent::Binary(bytes) => bytes.is_empty(),
        }
    }
}

/// One logical document in the merged view.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// Id assigned by the first store that contributed this record
    pub identity: String,
    /// Comparison key the record was merged under
    pub key: String,
    pub display_name: String,
    pub size_bytes: u64,
    /// Human-facing label from the classifier
    pub mime_or_type: String,
    /// MIME type of the underlying bytes
    pub content_type: String,
    pub content: Option<DocumentContent>,
    pub source_tags: BTreeSet<SourceTag>,
    pub origin: Option<OriginLocator>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    pub fn has_tag(&self, tag: SourceTag) -> bool {
        self.source_tags.contains(&tag)
    }

    /// Materialize the content as a blob tagged with [`content_type`](Self::content_type).
    ///
    /// # Errors
    ///
    /// - [`LibraryError::InvalidInput`] when no content is attached
    /// - [`LibraryError::Codec`] when the encoded content does not decode
    pub fn to_blob(&self) -> Result<Blob> {
        match &self.content {
            Some(content) if !content.is_empty() => match content {
                DocumentContent::Encoded(text) => Ok(codec::to_blob(text, &self.content_type)?),
                DocumentContent::Binary(bytes) => {
                    Ok(Blob::new(bytes.clone(), self.content_type.clone()))
                }
            },
            _ => Err(LibraryError::InvalidInput {
                field: "content".to_string(),
                message: format!("{} has no content", self.display_name),
            }),
        }
    }

    /// Numeric id when the record came from the local backend.
    pub fn local_id(&self) -> Option<i64> {
        if self.has_tag(SourceTag::Local) {
            self.identity.parse().ok()
        } else {
            None
        }
    }
}

/// A folder shown in navigation. Folders are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source: FolderSource,
    /// Dropbox path of the folder
    pub path: Option<String>,
}

impl From<LocalFolder> for FolderRecord {
    fn from(folder: LocalFolder) -> Self {
        Self {
            id: folder.id.to_string(),
            name: folder.name,
            description: folder.description,
            source: FolderSource::Local,
            path: None,
        }
    }
}

impl From<DropboxFolder> for FolderRecord {
    fn from(folder: DropboxFolder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            description: String::new(),
            source: FolderSource::Dropbox,
            path: folder.path_lower,
        }
    }
}

impl From<DriveFolder> for FolderRecord {
    fn from(folder: DriveFolder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            description: String::new(),
            source: FolderSource::GoogleDrive,
            path: None,
        }
    }
}
