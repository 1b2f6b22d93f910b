//! # Local Backend Client
//!
//! [`DocumentBackend`] over the host's REST service.
//!
//! ## Routes
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `get_user` | `GET /user/{id}` |
//! | `create_document` | `POST /documents` (multipart) |
//! | `get_document` / `delete_document` | `GET` / `DELETE /document/{id}` |
//! | `toggle_dropbox_sync` | `PUT /update_dropbox_sync/{id}` |
//! | `toggle_drive_sync` | `PUT /update_drive_sync/{id}` |
//! | `list_folders` / `create_folder` | `GET` / `POST /folders` |
//! | `get_folder` / `rename_folder` / `delete_folder` | `GET` / `PUT` / `DELETE /folder/{id}` |
//!
//! Reads go through the client's retry policy; writes are sent once.

use async_trait::async_trait;
use bridge_traits::backend::DocumentBackend;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RetryPolicy,
};
use bridge_traits::records::{LocalDocument, LocalFolder, NewDocument, NewFolder, UserProfile};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// HTTP client for the local document backend.
pub struct HttpDocumentBackend {
    base_url: String,
    http_client: Arc<dyn HttpClient>,
    retry_policy: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct BackendMessage {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpDocumentBackend {
    pub fn new(base_url: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = HttpRequest::new(HttpMethod::Get, self.url(path))
            .header("Accept", "application/json");
        let response = self
            .http_client
            .execute_with_retry(request, self.retry_policy.clone())
            .await?;
        Self::check(response, path)?.json()
    }

    async fn send(&self, request: HttpRequest, path: &str) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;
        Self::check(response, path)
    }

    /// Map non-2xx responses to structured errors.
    fn check(response: HttpResponse, path: &str) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<BackendMessage>()
            .ok()
            .and_then(|body| body.error.or(body.message))
            .or_else(|| response.text().ok().filter(|text| !text.trim().is_empty()))
            .unwrap_or_else(|| format!("HTTP {}", response.status));

        warn!(status = response.status, path = %path, message = %message, "Backend request failed");

        Err(match response.status {
            401 => BridgeError::Unauthorized(message),
            404 => BridgeError::NotFound(format!("{} ({})", path, message)),
            status => BridgeError::Rejected { status, message },
        })
    }
}

#[async_trait]
impl DocumentBackend for HttpDocumentBackend {
    #[instrument(skip(self))]
    async fn get_user(&self, user_id: i64) -> Result<UserProfile> {
        let user: UserProfile = self.get_json(&format!("/user/{}", user_id)).await?;
        debug!(
            documents = user.documents.len(),
            dropbox_sync = user.dropbox_sync,
            drive_sync = user.drive_sync,
            "Loaded user profile"
        );
        Ok(user)
    }

    #[instrument(skip(self, document), fields(name = %document.name, size = document.size))]
    async fn create_document(&self, document: NewDocument) -> Result<()> {
        let mut form = MultipartForm::new()
            .text("name", document.name.clone())
            .text("user_id", document.user_id.to_string())
            .file(
                "document",
                document.name.clone(),
                document.doc_type.clone(),
                document.content,
            )
            .text("type", document.doc_type)
            .text("size", document.size.to_string());
        if let Some(folder_id) = document.folder_id {
            form = form.text("folder_id", folder_id.to_string());
        }

        let request = HttpRequest::new(HttpMethod::Post, self.url("/documents")).multipart(form);
        self.send(request, "/documents").await?;

        info!("Document persisted to local backend");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_document(&self, document_id: i64) -> Result<LocalDocument> {
        self.get_json(&format!("/document/{}", document_id)).await
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, document_id: i64) -> Result<()> {
        let path = format!("/document/{}", document_id);
        let request = HttpRequest::new(HttpMethod::Delete, self.url(&path));
        self.send(request, &path).await?;
        info!("Document deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn toggle_dropbox_sync(&self, user_id: i64) -> Result<()> {
        let path = format!("/update_dropbox_sync/{}", user_id);
        let request = HttpRequest::new(HttpMethod::Put, self.url(&path));
        self.send(request, &path).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn toggle_drive_sync(&self, user_id: i64) -> Result<()> {
        let path = format!("/update_drive_sync/{}", user_id);
        let request = HttpRequest::new(HttpMethod::Put, self.url(&path));
        self.send(request, &path).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_folders(&self) -> Result<Vec<LocalFolder>> {
        self.get_json("/folders").await
    }

    #[instrument(skip(self))]
    async fn get_folder(&self, folder_id: i64) -> Result<LocalFolder> {
        self.get_json(&format!("/folder/{}", folder_id)).await
    }

    #[instrument(skip(self, folder), fields(name = %folder.name))]
    async fn create_folder(&self, folder: NewFolder) -> Result<()> {
        let form = MultipartForm::new()
            .text("name", folder.name)
            .text("description", folder.description)
            .text("user_id", folder.user_id.to_string());

        let request = HttpRequest::new(HttpMethod::Post, self.url("/folders")).multipart(form);
        self.send(request, "/folders").await?;
        info!("Folder created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn rename_folder(&self, folder_id: i64, name: &str) -> Result<LocalFolder> {
        let path = format!("/folder/{}", folder_id);
        let request = HttpRequest::new(HttpMethod::Put, self.url(&path))
            .json(&serde_json::json!({ "name": name }))?;
        self.send(request, &path).await?.json()
    }

    #[instrument(skip(self))]
    async fn delete_folder(&self, folder_id: i64) -> Result<()> {
        let path = format!("/folder/{}", folder_id);
        let request = HttpRequest::new(HttpMethod::Delete, self.url(&path));
        self.send(request, &path).await?;
        info!("Folder deleted");
        Ok(())
    }
}
