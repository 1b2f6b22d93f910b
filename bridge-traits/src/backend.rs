//! Local Document Backend
//!
//! The local store is a REST service owned by the host. The core reads the
//! user's documents and sync flags from it and persists downloads into it.

use async_trait::async_trait;

use crate::error::Result;
use crate::records::{LocalDocument, LocalFolder, NewDocument, NewFolder, UserProfile};

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Profile, documents and per-provider sync flags.
    async fn get_user(&self, user_id: i64) -> Result<UserProfile>;

    async fn create_document(&self, document: NewDocument) -> Result<()>;

    async fn get_document(&self, document_id: i64) -> Result<LocalDocument>;

    async fn delete_document(&self, document_id: i64) -> Result<()>;

    /// Flip the Dropbox sync flag for the user.
    async fn toggle_dropbox_sync(&self, user_id: i64) -> Result<()>;

    /// Flip the Drive sync flag for the user.
    async fn toggle_drive_sync(&self, user_id: i64) -> Result<()>;

    async fn list_folders(&self) -> Result<Vec<LocalFolder>>;

    async fn get_folder(&self, folder_id: i64) -> Result<LocalFolder>;

    async fn create_folder(&self, folder: NewFolder) -> Result<()>;

    async fn rename_folder(&self, folder_id: i64, name: &str) -> Result<LocalFolder>;

    async fn delete_folder(&self, folder_id: i64) -> Result<()>;
}
