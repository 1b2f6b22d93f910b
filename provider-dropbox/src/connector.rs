//! Dropbox API connector implementation
//!
//! Implements [`DropboxStorage`] for the Dropbox HTTP API v2.

use async_trait::async_trait;
use bridge_traits::cloud::DropboxStorage;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::records::{Blob, DropboxFile, DropboxFolder, UploadedFile};
use bytes::Bytes;
use core_auth::AuthSession;
use core_library::classifier::mime_from_file_name;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::DropboxError;
use crate::types::{
    ApiErrorBody, ListFolderArg, ListFolderContinueArg, ListFolderResult, Metadata, PathArg,
    TemporaryLink, UploadArg, UploadResult,
};

const API_BASE: &str = "https://api.dropboxapi.com/2";
const CONTENT_BASE: &str = "https://content.dropboxapi.com/2";

/// Used when an upload has no usable path.
pub const DEFAULT_UPLOAD_PATH: &str = "/uploaded-file.pdf";

/// Largest file accepted by a single `files/upload` call.
pub const MAX_UPLOAD_BYTES: usize = 350 * 1024 * 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

/// Dropbox API connector
///
/// Reads the access token from the shared [`AuthSession`] on every call.
/// When Dropbox reports the token as invalid the session is expired and the
/// call fails with [`DropboxError::AuthExpired`].
///
/// # Example
///
/// ```ignore
/// use provider_dropbox::DropboxConnector;
/// use bridge_traits::cloud::DropboxStorage;
///
/// let connector = DropboxConnector::new(http_client, dropbox_session);
/// for file in connector.list_files("").await? {
///     println!("{} ({} bytes)", file.name, file.size);
/// }
/// ```
pub struct DropboxConnector {
    http_client: Arc<dyn HttpClient>,
    session: Arc<AuthSession>,
    retry_policy: RetryPolicy,
}

impl DropboxConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, session: Arc<AuthSession>) -> Self {
        Self {
            http_client,
            session,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Retry policy for listing calls. Uploads and deletes are sent once.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let request = self
            .api_request(&format!("{}/files/delete_v2", API_BASE))
            .json(&PathArg { path })?;
        self.send(request, false).await?;
        info!("Deleted {} from Dropbox", path);
        Ok(())
    }

    /// Download a file and decode it as UTF-8 text.
    pub async fn get_file_content(&self, path: &str) -> Result<String> {
        let blob = self.download_file(path).await?;
        Ok(String::from_utf8_lossy(&blob.bytes).into_owned())
    }

    /// Upload `content` as a `text/plain` file named `name` inside `folder`
    /// (the root when `None`).
    pub async fn create_text_file(
        &self,
        name: &str,
        content: &str,
        folder: Option<&str>,
    ) -> Result<UploadedFile> {
        let path = match folder.map(|f| f.trim_end_matches('/')) {
            Some(folder) if !folder.is_empty() => format!("{}/{}", folder, name),
            _ => format!("/{}", name),
        };
        let blob = Blob::new(Bytes::from(content.to_string()), "text/plain");
        self.upload_file(blob, &path).await
    }

    /// Every entry of a folder, following `list_folder/continue`.
    async fn list_entries(&self, path: &str) -> Result<Vec<Metadata>> {
        let path = normalize_list_path(path);
        let request = self
            .api_request(&format!("{}/files/list_folder", API_BASE))
            .json(&ListFolderArg::new(&path))?;
        let mut page: ListFolderResult = parse_body(&self.send(request, true).await?)?;
        let mut entries = std::mem::take(&mut page.entries);
        let mut requests = 1;

        while page.has_more {
            requests += 1;
            let request = self
                .api_request(&format!("{}/files/list_folder/continue", API_BASE))
                .json(&ListFolderContinueArg {
                    cursor: &page.cursor,
                })?;
            page = parse_body(&self.send(request, true).await?)?;
            entries.append(&mut page.entries);
        }

        debug!(
            "Listed {} entries under {:?} in {} requests",
            entries.len(),
            path,
            requests
        );
        Ok(entries)
    }

    fn api_request(&self, url: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, url).timeout(REQUEST_TIMEOUT)
    }

    fn content_request(&self, url: &str, arg: &impl Serialize) -> Result<HttpRequest> {
        Ok(HttpRequest::new(HttpMethod::Post, url)
            .header("Dropbox-API-Arg", header_json(arg)?)
            .timeout(TRANSFER_TIMEOUT))
    }

    /// Authorize and execute a request. Only idempotent reads are retried.
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn send(&self, request: HttpRequest, retry: bool) -> Result<HttpResponse> {
        let token = self
            .session
            .access_token()
            .await
            .map_err(|_| DropboxError::NotAuthenticated)?;
        let request = request.bearer_token(token);

        let response = if retry {
            self.http_client
                .execute_with_retry(request, self.retry_policy.clone())
                .await?
        } else {
            self.http_client.execute(request).await?
        };

        if response.is_success() {
            return Ok(response);
        }

        let body: ApiErrorBody = serde_json::from_slice(&response.body).unwrap_or_default();
        if response.status == 401 || body.is_invalid_token() {
            if let Err(e) = self.session.mark_expired().await {
                warn!(error = %e, "Could not expire Dropbox session");
            }
            warn!("Dropbox rejected the access token");
            return Err(DropboxError::AuthExpired.into());
        }

        warn!(
            "API request failed: status={}, summary={}",
            response.status, body.error_summary
        );
        Err(classify_failure(&response, &body).into())
    }
}

#[async_trait]
impl DropboxStorage for DropboxConnector {
    fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn list_files(&self, path: &str) -> Result<Vec<DropboxFile>> {
        let files: Vec<DropboxFile> = self
            .list_entries(path)
            .await?
            .into_iter()
            .filter_map(|entry| match entry {
                Metadata::File(file) => Some(file),
                _ => None,
            })
            .collect();
        info!("Listed {} files from Dropbox", files.len());
        Ok(files)
    }

    #[instrument(skip(self))]
    async fn list_folders(&self) -> Result<Vec<DropboxFolder>> {
        let folders: Vec<DropboxFolder> = self
            .list_entries("")
            .await?
            .into_iter()
            .filter_map(|entry| match entry {
                Metadata::Folder(folder) => Some(folder),
                _ => None,
            })
            .collect();
        info!("Listed {} folders from Dropbox", folders.len());
        Ok(folders)
    }

    async fn get_folder_content(&self, path: &str) -> Result<Vec<DropboxFile>> {
        self.list_files(path).await
    }

    #[instrument(skip(self, blob), fields(size = blob.len()))]
    async fn upload_file(&self, blob: Blob, path: &str) -> Result<UploadedFile> {
        let path = normalize_upload_path(Some(path));

        if blob.is_empty() {
            return Err(DropboxError::EmptyFile.into());
        }
        if blob.len() > MAX_UPLOAD_BYTES {
            return Err(DropboxError::FileTooLarge.into());
        }

        let size = blob.len() as u64;
        let request = self
            .content_request(
                &format!("{}/files/upload", CONTENT_BASE),
                &UploadArg::add(&path),
            )?
            .header("Content-Type", "application/octet-stream")
            .body(blob.bytes);

        let response = self.send(request, false).await?;
        let uploaded: UploadResult = parse_body(&response)?;
        info!(
            "Uploaded {} to Dropbox",
            uploaded.path_display.as_deref().unwrap_or(&path)
        );

        Ok(UploadedFile {
            id: uploaded.id,
            name: uploaded.name,
            path: uploaded.path_display.or(Some(path)),
            size: uploaded.size.or(Some(size)),
        })
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn download_file(&self, path: &str) -> Result<Blob> {
        let request =
            self.content_request(&format!("{}/files/download", CONTENT_BASE), &PathArg { path })?;
        let response = self.send(request, false).await?;
        info!("Downloaded {} bytes from Dropbox", response.body.len());
        Ok(Blob::new(response.body, mime_from_file_name(path)))
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn download_file_direct_api(&self, path: &str) -> Result<Blob> {
        let request = self
            .api_request(&format!("{}/files/get_temporary_link", API_BASE))
            .json(&PathArg { path })?;
        let link: TemporaryLink = parse_body(&self.send(request, true).await?)?;

        // Temporary links are pre-signed; no bearer token
        let response = self
            .http_client
            .execute(HttpRequest::new(HttpMethod::Get, link.link).timeout(TRANSFER_TIMEOUT))
            .await?;
        if response.status == 404 {
            return Err(DropboxError::NotFound(path.to_string()).into());
        }
        if !response.is_success() {
            return Err(DropboxError::ApiError {
                status_code: response.status,
                message: "Temporary link download failed".to_string(),
            }
            .into());
        }

        info!("Downloaded {} bytes via temporary link", response.body.len());
        Ok(Blob::new(response.body, mime_from_file_name(path)))
    }
}

/// Path for `list_folder`: `""` for the root, otherwise with a leading `/`.
pub fn normalize_list_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Upload destination: leading `/`, no repeated or trailing `/`, and
/// [`DEFAULT_UPLOAD_PATH`] when nothing remains.
///
/// ```
/// use provider_dropbox::connector::normalize_upload_path;
///
/// assert_eq!(normalize_upload_path(Some("docs//a.pdf/")), "/docs/a.pdf");
/// assert_eq!(normalize_upload_path(None), "/uploaded-file.pdf");
/// ```
pub fn normalize_upload_path(path: Option<&str>) -> String {
    let raw = path.map(str::trim).unwrap_or_default();
    let mut normalized = String::with_capacity(raw.len() + 1);
    for ch in std::iter::once('/').chain(raw.chars()) {
        if ch == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(ch);
    }

    let normalized = normalized.trim_end_matches('/');
    if normalized.is_empty() {
        DEFAULT_UPLOAD_PATH.to_string()
    } else {
        normalized.to_string()
    }
}

/// Serialize a `Dropbox-API-Arg` value. Header values must be ASCII, so
/// everything else is written as JSON `\u` escapes.
fn header_json(arg: &impl Serialize) -> Result<String> {
    let json = serde_json::to_string(arg)
        .map_err(|e| DropboxError::ParseError(format!("Failed to encode argument: {}", e)))?;

    let mut escaped = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            escaped.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(escaped)
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| DropboxError::ParseError(e.to_string()).into())
}

fn classify_failure(response: &HttpResponse, body: &ApiErrorBody) -> DropboxError {
    let summary = body.error_summary.to_lowercase();
    let from_summary = if summary.contains("malformed_path") {
        Some(DropboxError::MalformedPath)
    } else if summary.contains("disallowed_name") {
        Some(DropboxError::DisallowedName)
    } else if summary.contains("too_large") {
        Some(DropboxError::TooLarge)
    } else if summary.contains("insufficient_space") {
        Some(DropboxError::InsufficientSpace)
    } else {
        None
    };

    match (response.status, from_summary) {
        (400 | 409, Some(error)) => error,
        (400, None) => DropboxError::InvalidRequest,
        (403, _) => DropboxError::AccessDenied,
        (404, _) => DropboxError::NotFound(if body.error_summary.is_empty() {
            "Not found".to_string()
        } else {
            body.error_summary.clone()
        }),
        (507, _) => DropboxError::InsufficientSpace,
        (409, None) if summary.contains("not_found") => {
            DropboxError::NotFound(body.error_summary.clone())
        }
        (status, _) => DropboxError::ApiError {
            status_code: status,
            message: if body.error_summary.is_empty() {
                String::from_utf8_lossy(&response.body).into_owned()
            } else {
                body.error_summary.clone()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::MemorySecureStore;
    use core_auth::{AuthState, OAuthTokens, ProviderKind, TokenStore};
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
            async fn execute_with_retry(&self, request: HttpRequest, policy: RetryPolicy) -> Result<HttpResponse>;
        }
    }

    async fn authenticated_session() -> Arc<AuthSession> {
        let token_store = TokenStore::new(Arc::new(MemorySecureStore::new()));
        token_store
            .store_tokens(ProviderKind::Dropbox, &OAuthTokens::access_only("sl.token"))
            .await
            .unwrap();
        let session = AuthSession::new(ProviderKind::Dropbox, token_store);
        assert!(session.restore().await.unwrap());
        Arc::new(session)
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn pdf() -> Blob {
        Blob::new(Bytes::from_static(b"%PDF-1.7"), "application/pdf")
    }

    #[test]
    fn test_normalize_upload_path() {
        assert_eq!(normalize_upload_path(Some("report.pdf")), "/report.pdf");
        assert_eq!(normalize_upload_path(Some("//a///b.pdf")), "/a/b.pdf");
        assert_eq!(normalize_upload_path(Some("/docs/")), "/docs");
        assert_eq!(normalize_upload_path(Some("/")), DEFAULT_UPLOAD_PATH);
        assert_eq!(normalize_upload_path(Some("  ")), DEFAULT_UPLOAD_PATH);
    }

    #[test]
    fn test_normalize_list_path() {
        assert_eq!(normalize_list_path(""), "");
        assert_eq!(normalize_list_path("/"), "");
        assert_eq!(normalize_list_path("Invoices"), "/Invoices");
        assert_eq!(normalize_list_path("/Invoices"), "/Invoices");
    }

    #[test]
    fn test_header_json_escapes_non_ascii() {
        let header = header_json(&PathArg { path: "/été.pdf" }).unwrap();
        assert_eq!(header, r#"{"path":"/\u00e9t\u00e9.pdf"}"#);
        assert!(header.is_ascii());
    }

    #[tokio::test]
    async fn test_list_files_follows_cursor_and_keeps_files() {
        let mut mock_http = MockHttpClient::new();
        let mut call = 0;
        mock_http
            .expect_execute_with_retry()
            .times(2)
            .returning(move |req, _| {
                call += 1;
                assert_eq!(
                    req.headers.get("Authorization").map(String::as_str),
                    Some("Bearer sl.token")
                );
                let body: serde_json::Value = serde_json::from_slice(&req.body.unwrap()).unwrap();
                if call == 1 {
                    assert!(req.url.ends_with("/files/list_folder"));
                    assert_eq!(body["path"], "");
                    Ok(response(
                        200,
                        r#"{"entries": [
                            {".tag": "file", "id": "id:1", "name": "a.pdf", "path_lower": "/a.pdf", "size": 10},
                            {".tag": "folder", "id": "id:2", "name": "Invoices", "path_lower": "/invoices"}
                        ], "cursor": "c1", "has_more": true}"#,
                    ))
                } else {
                    assert!(req.url.ends_with("/files/list_folder/continue"));
                    assert_eq!(body["cursor"], "c1");
                    Ok(response(
                        200,
                        r#"{"entries": [
                            {".tag": "file", "id": "id:3", "name": "b.docx", "path_lower": "/b.docx", "size": 20}
                        ], "cursor": "c2", "has_more": false}"#,
                    ))
                }
            });

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let files = dropbox.list_files("").await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "a.pdf");
        assert_eq!(files[1].size, 20);
    }

    #[tokio::test]
    async fn test_list_folders_keeps_folders() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute_with_retry().times(1).returning(|_, _| {
            Ok(response(
                200,
                r#"{"entries": [
                    {".tag": "file", "id": "id:1", "name": "a.pdf", "size": 10},
                    {".tag": "folder", "id": "id:2", "name": "Invoices", "path_display": "/Invoices"}
                ], "cursor": "c1", "has_more": false}"#,
            ))
        });

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let folders = dropbox.list_folders().await.unwrap();

        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path_display.as_deref(), Some("/Invoices"));
    }

    #[tokio::test]
    async fn test_invalid_token_expires_session() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute_with_retry().times(1).returning(|_, _| {
            Ok(response(
                400,
                r#"{"error_summary": "invalid_access_token/", "error": {".tag": "invalid_access_token"}}"#,
            ))
        });

        let session = authenticated_session().await;
        let dropbox = DropboxConnector::new(Arc::new(mock_http), session.clone());
        let err = dropbox.list_files("").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Not authenticated: Dropbox authentication expired");
        assert_eq!(session.state(), AuthState::Expired);
        assert!(!dropbox.is_authenticated());
    }

    #[tokio::test]
    async fn test_upload_sends_api_arg() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/files/upload"));
            let arg: serde_json::Value =
                serde_json::from_str(&req.headers["Dropbox-API-Arg"]).unwrap();
            assert_eq!(arg["path"], "/docs/report.pdf");
            assert_eq!(arg["mode"], "add");
            assert_eq!(arg["autorename"], true);
            assert_eq!(req.headers["Content-Type"], "application/octet-stream");
            assert_eq!(req.body.as_deref(), Some(&b"%PDF-1.7"[..]));
            Ok(response(
                200,
                r#"{"id": "id:9", "name": "report.pdf", "path_display": "/docs/report.pdf", "size": 8}"#,
            ))
        });

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let uploaded = dropbox.upload_file(pdf(), "docs//report.pdf").await.unwrap();

        assert_eq!(uploaded.id, "id:9");
        assert_eq!(uploaded.path.as_deref(), Some("/docs/report.pdf"));
        assert_eq!(uploaded.size, Some(8));
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_blob_before_any_request() {
        let mock_http = MockHttpClient::new();
        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);

        let empty = Blob::new(Bytes::new(), "application/pdf");
        let err = dropbox.upload_file(empty, "/a.pdf").await.unwrap_err();

        assert!(err.to_string().contains("File is empty or invalid"));
    }

    #[tokio::test]
    async fn test_upload_error_taxonomy() {
        let cases = [
            (400, r#"{"error_summary": "path/malformed_path/.."}"#, "Invalid file path or name"),
            (400, r#"{"error_summary": "path/disallowed_name/"}"#, "File name not allowed by Dropbox"),
            (409, r#"{"error_summary": "path/insufficient_space/"}"#, "Insufficient Dropbox storage space"),
            (400, r#"{"error_summary": "something_else/"}"#, "Upload failed - invalid request"),
            (403, "", "Access denied - check Dropbox permissions"),
            (507, "", "Insufficient Dropbox storage space"),
        ];

        for (status, body, expected) in cases {
            let mut mock_http = MockHttpClient::new();
            let body = body.to_string();
            mock_http
                .expect_execute()
                .times(1)
                .returning(move |_| Ok(response(status, &body)));

            let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
            let err = dropbox.upload_file(pdf(), "/a.pdf").await.unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "status {}: {}",
                status,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_download_guesses_content_type() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/files/download"));
            assert_eq!(req.headers["Dropbox-API-Arg"], r#"{"path":"/report.pdf"}"#);
            Ok(response(200, "%PDF-"))
        });

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let blob = dropbox.download_file("/report.pdf").await.unwrap();

        assert_eq!(blob.content_type, "application/pdf");
        assert_eq!(&blob.bytes[..], b"%PDF-");
    }

    #[tokio::test]
    async fn test_direct_download_uses_temporary_link() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute_with_retry().times(1).returning(|req, _| {
            assert!(req.url.ends_with("/files/get_temporary_link"));
            Ok(response(
                200,
                r#"{"metadata": {"name": "notes.txt"}, "link": "https://dl.dropboxusercontent.com/t/abc"}"#,
            ))
        });
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Get);
            assert_eq!(req.url, "https://dl.dropboxusercontent.com/t/abc");
            assert!(!req.headers.contains_key("Authorization"));
            Ok(response(200, "hello"))
        });

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let blob = dropbox.download_file_direct_api("/notes.txt").await.unwrap();

        assert_eq!(blob.content_type, "text/plain");
        assert_eq!(&blob.bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(409, r#"{"error_summary": "path/not_found/.."}"#)));

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let err = dropbox.delete_file("/gone.pdf").await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_http_404_is_not_found() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(404, "")));

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let err = dropbox.download_file("/gone.pdf").await.unwrap_err();

        assert!(err.is_not_found(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_expired_temporary_link_is_not_found() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute_with_retry().times(1).returning(|_, _| {
            Ok(response(
                200,
                r#"{"metadata": {"name": "gone.pdf"}, "link": "https://dl.dropboxusercontent.com/t/gone"}"#,
            ))
        });
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(404, "")));

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let err = dropbox
            .download_file_direct_api("/gone.pdf")
            .await
            .unwrap_err();

        assert!(err.is_not_found(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_create_text_file_and_read_back() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            if req.url.ends_with("/files/upload") {
                let arg: serde_json::Value =
                    serde_json::from_str(&req.headers["Dropbox-API-Arg"]).unwrap();
                assert_eq!(arg["path"], "/notes/todo.txt");
                Ok(response(200, r#"{"id": "id:t", "name": "todo.txt"}"#))
            } else {
                Ok(response(200, "buy milk"))
            }
        });

        let dropbox = DropboxConnector::new(Arc::new(mock_http), authenticated_session().await);
        let uploaded = dropbox
            .create_text_file("todo.txt", "buy milk", Some("/notes/"))
            .await
            .unwrap();
        assert_eq!(uploaded.size, Some(8));

        let text = dropbox.get_file_content("/notes/todo.txt").await.unwrap();
        assert_eq!(text, "buy milk");
    }
}
