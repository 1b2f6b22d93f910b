//! # Host Bridge Traits
//!
//! Capability contracts between the document sync core and the outside world.
//!
//! ## Overview
//!
//! The core never talks to a network or a keychain directly. Each capability
//! it needs is a trait here, implemented per host (`bridge-desktop`) or per
//! remote service (`provider-dropbox`, `provider-google-drive`, the backend
//! client in `core-library`).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP with retry policy support
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keychain/Keystore)
//!
//! ### Document Stores
//! - [`DocumentBackend`](backend::DocumentBackend) - The local REST backend
//! - [`DropboxStorage`](cloud::DropboxStorage) - Dropbox-like provider
//! - [`DriveStorage`](cloud::DriveStorage) - Drive-like provider
//!
//! ## Fail-Fast Strategy
//!
//! The core should fail fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Desktop: ensure default feature is enabled.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Status
//! classification that callers act on (401, 404) is carried in dedicated
//! variants so it survives crate boundaries.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent usage
//! across async tasks.

pub mod backend;
pub mod cloud;
pub mod error;
pub mod http;
pub mod records;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use backend::DocumentBackend;
pub use cloud::{
    DriveDocumentFile, DriveListOptions, DriveListing, DriveStorage, DropboxStorage,
    ListingProgress, ProgressCallback,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RetryPolicy};
pub use records::{
    Blob, DriveFile, DriveFolder, DropboxFile, DropboxFolder, LocalDocument, LocalFolder,
    NewDocument, NewFolder, RawSize, UploadedFile, UserProfile,
};
pub use storage::SecureStore;
