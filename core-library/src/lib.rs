//! # Document Library Module
//!
//! Canonical document model and the pure transformations the sync layer
//! builds on.
//!
//! ## Overview
//!
//! This module provides:
//! - Domain models: [`SourceRecord`], [`DocumentRecord`], [`FolderRecord`]
//! - The identity normalizer deriving comparison keys ([`normalizer`])
//! - The type/MIME classifier ([`classifier`])
//! - The content codec for base64, data URLs and file names ([`codec`])
//! - The HTTP client for the local document backend ([`HttpDocumentBackend`])

pub mod backend;
pub mod classifier;
pub mod codec;
pub mod error;
pub mod models;
pub mod normalizer;

pub use backend::HttpDocumentBackend;
pub use classifier::{classify, mime_from_file_name, TypeHints};
pub use codec::{sanitize_file_name, to_base64, to_blob};
pub use error::{CodecError, LibraryError, Result};
pub use models::{
    DocumentContent, DocumentRecord, FolderRecord, FolderSource, OriginLocator, SourceRecord,
    SourceTag,
};
pub use normalizer::{comparison_key, normalize_name, normalize_size};
