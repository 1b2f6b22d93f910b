//! Google Drive API connector implementation
//!
//! Implements [`DriveStorage`] for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::cloud::{
    DriveDocumentFile, DriveListOptions, DriveListing, DriveStorage, ListingProgress,
    ProgressCallback,
};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm};
use bridge_traits::records::{Blob, DriveFile, DriveFolder, UploadedFile};
use bytes::Bytes;
use core_auth::AuthSession;
use core_library::codec::{to_base64_yielding, DEFAULT_CHUNK_SIZE};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::GoogleDriveError;
use crate::export::{export_format, is_workspace_file};
use crate::types::{
    AboutResponse, ApiErrorResponse, CreatedFile, FileMetadata, FilesListResponse,
    FolderListResponse,
};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Media upload base URL
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: usize = 1000;

/// Hard stop for a single paginated listing
const MAX_LIST_REQUESTS: u32 = 100;

/// Fields to request for file resources
const FILE_FIELDS: &str = "id,name,mimeType,size,createdTime,modifiedTime,md5Checksum,parents";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(100);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(120);

/// Google Drive API connector
///
/// Every call reads the access token from the shared [`AuthSession`]. A 401
/// from Drive expires that session; 429 and 5xx responses are retried with
/// exponential backoff.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::cloud::{DriveListOptions, DriveStorage};
///
/// let connector = GoogleDriveConnector::new(http_client, drive_session);
/// let listing = connector.list_all_files(DriveListOptions::default(), None).await?;
/// println!("{} files in {} requests", listing.total_files, listing.total_requests);
/// ```
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,
    session: Arc<AuthSession>,
    page_delay: Duration,
    max_retries: u32,
}

impl GoogleDriveConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, session: Arc<AuthSession>) -> Self {
        Self {
            http_client,
            session,
            page_delay: DEFAULT_PAGE_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Pause between listing pages.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Attempts per request before a throttled or failing call gives up.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Check the session token against `about?fields=user`.
    ///
    /// Returns `false` when Drive rejects the token; the session is expired
    /// in that case.
    #[instrument(skip(self))]
    pub async fn validate_session(&self) -> Result<bool> {
        let url = format!("{}/about?fields=user", DRIVE_API_BASE);
        match self.get_json::<AboutResponse>(url).await {
            Ok(about) => {
                debug!(user = %about.user.display_name, "Drive session is valid");
                Ok(true)
            }
            Err(e) if e.is_unauthorized() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a folder, optionally under `parent_id`.
    #[instrument(skip(self), fields(name = %name))]
    pub async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<DriveFolder> {
        let metadata = FileMetadata {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: parent_id.into_iter().collect(),
        };
        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/files?fields=id,name", DRIVE_API_BASE),
        )
        .json(&metadata)?
        .timeout(REQUEST_TIMEOUT);

        let response = self.send(request).await?;
        let folder: DriveFolder = parse_body(&response, "created folder")?;
        info!("Created Drive folder {}", folder.id);
        Ok(folder)
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    pub async fn get_file_metadata(&self, file_id: &str) -> Result<DriveFile> {
        let url = format!(
            "{}/files/{}?fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            FILE_FIELDS
        );
        self.get_json(url).await
    }

    async fn fetch_media(&self, file_id: &str) -> Result<HttpResponse> {
        let url = format!(
            "{}/files/{}?alt=media",
            DRIVE_API_BASE,
            urlencoding::encode(file_id)
        );
        let request = HttpRequest::new(HttpMethod::Get, url).timeout(TRANSFER_TIMEOUT);
        self.send(request).await
    }

    async fn fetch_export(&self, file_id: &str, export_mime: &str) -> Result<HttpResponse> {
        let url = format!(
            "{}/files/{}/export?mimeType={}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            urlencoding::encode(export_mime)
        );
        let request = HttpRequest::new(HttpMethod::Get, url).timeout(TRANSFER_TIMEOUT);
        self.send(request).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        let request = HttpRequest::new(HttpMethod::Get, url).timeout(REQUEST_TIMEOUT);
        let response = self.send(request).await?;
        parse_body(&response, "response")
    }

    /// Authorize and execute a request, retrying throttled and transient
    /// failures.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self.session.access_token().await.map_err(|_| {
            GoogleDriveError::AuthenticationFailed("Not authenticated with Google Drive".to_string())
        })?;
        let request = request.bearer_token(token);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    debug!("API request succeeded: status={}", response.status);
                    return Ok(response);
                }
                Ok(response) if response.status == 401 => {
                    self.expire_session().await;
                    return Err(GoogleDriveError::AuthenticationFailed(
                        "Google Drive rejected the access token".to_string(),
                    )
                    .into());
                }
                Ok(response) if response.status == 429 || response.is_server_error() => {
                    if attempt >= self.max_retries {
                        warn!(
                            "API request failed after {} attempts: status={}",
                            attempt, response.status
                        );
                        let error = if response.status == 429 {
                            GoogleDriveError::RateLimitExceeded { attempts: attempt }
                        } else {
                            GoogleDriveError::ApiError {
                                status_code: response.status,
                                message: error_message(&response),
                            }
                        };
                        return Err(error.into());
                    }

                    let backoff = backoff_for(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): status={}, retrying in {}ms",
                        attempt,
                        self.max_retries,
                        response.status,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                }
                Ok(response) => {
                    warn!("API request failed: status={}", response.status);
                    return Err(GoogleDriveError::ApiError {
                        status_code: response.status,
                        message: error_message(&response),
                    }
                    .into());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        warn!("API request failed after {} attempts: {}", attempt, e);
                        return Err(e);
                    }

                    let backoff = backoff_for(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt,
                        self.max_retries,
                        e,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn expire_session(&self) {
        if let Err(e) = self.session.mark_expired().await {
            warn!(error = %e, "Could not expire Drive session");
        }
    }
}

#[async_trait]
impl DriveStorage for GoogleDriveConnector {
    fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[instrument(skip(self, progress), fields(query = ?options.query))]
    async fn list_all_files(
        &self,
        options: DriveListOptions,
        progress: Option<ProgressCallback>,
    ) -> Result<DriveListing> {
        info!("Listing files from Google Drive");

        let caller_query = options
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let query = match (options.include_deleted, caller_query) {
            (false, Some(extra)) => format!("(trashed=false) and ({})", extra),
            (false, None) => "trashed=false".to_string(),
            (true, Some(extra)) => extra.to_string(),
            (true, None) => String::new(),
        };
        let fields = format!("nextPageToken,files({})", FILE_FIELDS);

        let mut files: Vec<DriveFile> = Vec::new();
        let mut page_token: Option<String> = None;
        let mut requests = 0u32;

        loop {
            requests += 1;

            let remaining = options.max_results.saturating_sub(files.len());
            let mut url = format!(
                "{}/files?pageSize={}&fields={}",
                DRIVE_API_BASE,
                remaining.clamp(1, MAX_PAGE_SIZE),
                urlencoding::encode(&fields)
            );
            if !query.is_empty() {
                url.push_str(&format!("&q={}", urlencoding::encode(&query)));
            }
            if !options.order_by.is_empty() {
                url.push_str(&format!("&orderBy={}", urlencoding::encode(&options.order_by)));
            }
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            let page: FilesListResponse = self.get_json(url).await?;
            debug!(
                "Page {}: {} files, more={}",
                requests,
                page.files.len(),
                page.next_page_token.is_some()
            );
            files.extend(page.files);

            if let Some(callback) = &progress {
                callback(ListingProgress {
                    fetched: files.len(),
                    requests,
                });
            }

            page_token = page.next_page_token;
            if page_token.is_none()
                || files.len() >= options.max_results
                || requests >= MAX_LIST_REQUESTS
            {
                break;
            }

            tokio::time::sleep(self.page_delay).await;
        }

        files.truncate(options.max_results);
        info!(
            "Listed {} files from Google Drive in {} requests",
            files.len(),
            requests
        );

        Ok(DriveListing {
            total_files: files.len(),
            files,
            total_requests: requests,
            query: caller_query.unwrap_or("all files").to_string(),
        })
    }

    #[instrument(skip(self, blob), fields(name = %name, size = blob.len()))]
    async fn upload_file(&self, blob: Blob, name: &str) -> Result<UploadedFile> {
        let content_type = if blob.content_type.is_empty() {
            "application/octet-stream".to_string()
        } else {
            blob.content_type.clone()
        };
        let metadata = serde_json::to_vec(&FileMetadata {
            name,
            mime_type: Some(content_type.as_str()),
            parents: Vec::new(),
        })
        .map_err(|e| GoogleDriveError::ParseError(format!("Failed to encode metadata: {}", e)))?;

        let form = MultipartForm::related()
            .typed(
                "metadata",
                "application/json; charset=UTF-8",
                Bytes::from(metadata),
            )
            .typed("file", content_type, blob.bytes.clone());
        let url = format!(
            "{}/files?uploadType=multipart&fields=id,name,size",
            DRIVE_UPLOAD_BASE
        );
        let request = HttpRequest::new(HttpMethod::Post, url)
            .multipart(form)
            .timeout(TRANSFER_TIMEOUT);

        let response = self.send(request).await?;
        let created: CreatedFile = parse_body(&response, "upload")?;
        info!("Uploaded {} to Google Drive as {}", name, created.id);

        Ok(UploadedFile {
            size: created
                .size
                .and_then(|s| s.parse().ok())
                .or(Some(blob.len() as u64)),
            id: created.id,
            name: created.name,
            path: None,
        })
    }

    #[instrument(skip(self))]
    async fn list_folders(&self) -> Result<Vec<DriveFolder>> {
        let query = format!("mimeType='{}' and trashed=false", FOLDER_MIME_TYPE);
        let url = format!(
            "{}/files?q={}&fields={}&pageSize={}",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            urlencoding::encode("files(id,name)"),
            MAX_PAGE_SIZE
        );
        let response: FolderListResponse = self.get_json(url).await?;
        debug!("Found {} Drive folders", response.files.len());
        Ok(response.files)
    }

    #[instrument(skip(self), fields(folder_id = %folder_id))]
    async fn list_files_in_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let query = format!(
            "'{}' in parents and trashed=false",
            folder_id.replace('\'', "\\'")
        );
        let url = format!(
            "{}/files?q={}&fields={}&pageSize={}",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            urlencoding::encode(&format!("files({})", FILE_FIELDS)),
            MAX_PAGE_SIZE
        );
        let response: FilesListResponse = self.get_json(url).await?;
        Ok(response.files)
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn get_document_file(&self, file_id: &str) -> Result<DriveDocumentFile> {
        let metadata = self.get_file_metadata(file_id).await?;

        let (content, exported_name) = if is_workspace_file(&metadata.mime_type) {
            let format = export_format(&metadata.mime_type);
            debug!(export = format.mime_type, "Exporting Workspace file");
            let response = self.fetch_export(file_id, format.mime_type).await?;
            (response.body, format!("{}{}", metadata.name, format.extension))
        } else {
            let response = self.fetch_media(file_id).await?;
            (response.body, metadata.name.clone())
        };

        info!("Fetched {} bytes for {}", content.len(), exported_name);
        let base64_content = to_base64_yielding(&content, DEFAULT_CHUNK_SIZE).await;

        Ok(DriveDocumentFile {
            metadata,
            base64_content,
            exported_name,
        })
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn download_file(&self, file_id: &str) -> Result<Blob> {
        let response = self.fetch_media(file_id).await?;
        let content_type = response
            .header("Content-Type")
            .unwrap_or("application/octet-stream")
            .to_string();
        info!("Downloaded {} bytes", response.body.len());
        Ok(Blob::new(response.body, content_type))
    }
}

/// Backoff before retry `attempt` (1-based): 200ms, 400ms, 800ms, ...
fn backoff_for(attempt: u32) -> Duration {
    Duration::from_millis(100u64 * 2u64.pow(attempt.min(10)))
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| {
        GoogleDriveError::ParseError(format!("Failed to parse {}: {}", what, e)).into()
    })
}

fn error_message(response: &HttpResponse) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ApiErrorResponse>(&response.body) {
        if !envelope.error.message.is_empty() {
            return envelope.error.message;
        }
    }
    let text = String::from_utf8_lossy(&response.body).trim().to_string();
    if text.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::MemorySecureStore;
    use core_auth::{AuthState, OAuthTokens, ProviderKind, TokenStore};
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::Mutex;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    async fn authenticated_session() -> Arc<AuthSession> {
        let token_store = TokenStore::new(Arc::new(MemorySecureStore::new()));
        token_store
            .store_tokens(
                ProviderKind::GoogleDrive,
                &OAuthTokens::access_only("drive-token"),
            )
            .await
            .unwrap();
        let session = AuthSession::new(ProviderKind::GoogleDrive, token_store);
        assert!(session.restore().await.unwrap());
        Arc::new(session)
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn connector(mock_http: MockHttpClient, session: Arc<AuthSession>) -> GoogleDriveConnector {
        GoogleDriveConnector::new(Arc::new(mock_http), session).with_page_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_list_all_files_follows_page_tokens() {
        let mut mock_http = MockHttpClient::new();
        let mut call = 0;
        mock_http.expect_execute().times(2).returning(move |req| {
            call += 1;
            assert_eq!(
                req.headers.get("Authorization").map(String::as_str),
                Some("Bearer drive-token")
            );
            if call == 1 {
                assert!(!req.url.contains("pageToken"));
                Ok(json_response(
                    200,
                    r#"{"files": [{"id": "f1", "name": "a.pdf", "mimeType": "application/pdf", "size": "10"}],
                        "nextPageToken": "p2"}"#,
                ))
            } else {
                assert!(req.url.contains("pageToken=p2"));
                Ok(json_response(
                    200,
                    r#"{"files": [{"id": "f2", "name": "Budget", "mimeType": "application/vnd.google-apps.spreadsheet"}]}"#,
                ))
            }
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressCallback = Arc::new(move |p: ListingProgress| sink.lock().unwrap().push(p));

        let drive = connector(mock_http, authenticated_session().await);
        let listing = drive
            .list_all_files(DriveListOptions::default(), Some(progress))
            .await
            .unwrap();

        assert_eq!(listing.total_files, 2);
        assert_eq!(listing.total_requests, 2);
        assert_eq!(listing.query, "all files");
        assert_eq!(listing.files[1].id, "f2");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ListingProgress { fetched: 1, requests: 1 },
                ListingProgress { fetched: 2, requests: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_all_files_combines_queries() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            let url = urlencoding::decode(&req.url).unwrap().into_owned();
            assert!(url.contains("q=(trashed=false) and (mimeType='application/pdf')"));
            assert!(url.contains("orderBy=modifiedTime desc"));
            Ok(json_response(200, r#"{"files": []}"#))
        });

        let drive = connector(mock_http, authenticated_session().await);
        let options = DriveListOptions {
            query: Some("mimeType='application/pdf'".to_string()),
            ..Default::default()
        };
        let listing = drive.list_all_files(options, None).await.unwrap();

        assert_eq!(listing.total_files, 0);
        assert_eq!(listing.query, "mimeType='application/pdf'");
    }

    #[tokio::test]
    async fn test_list_all_files_stops_at_max_results() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("pageSize=2&"));
            Ok(json_response(
                200,
                r#"{"files": [
                    {"id": "f1", "name": "a", "mimeType": "text/plain"},
                    {"id": "f2", "name": "b", "mimeType": "text/plain"}
                ], "nextPageToken": "more"}"#,
            ))
        });

        let drive = connector(mock_http, authenticated_session().await);
        let options = DriveListOptions {
            max_results: 2,
            ..Default::default()
        };
        let listing = drive.list_all_files(options, None).await.unwrap();

        assert_eq!(listing.total_files, 2);
        assert_eq!(listing.total_requests, 1);
    }

    #[tokio::test]
    async fn test_unauthorized_response_expires_session() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(401, r#"{"error": {"code": 401, "message": "Invalid Credentials"}}"#)));

        let session = authenticated_session().await;
        let drive = connector(mock_http, session.clone());
        let result = drive.list_folders().await;

        assert!(result.unwrap_err().is_unauthorized());
        assert_eq!(session.state(), AuthState::Expired);
        assert!(!drive.is_authenticated());
    }

    #[tokio::test]
    async fn test_requests_without_session_never_hit_the_network() {
        let mock_http = MockHttpClient::new();
        let token_store = TokenStore::new(Arc::new(MemorySecureStore::new()));
        let session = Arc::new(AuthSession::new(ProviderKind::GoogleDrive, token_store));

        let drive = connector(mock_http, session);
        let result = drive.get_file_metadata("f1").await;

        assert!(result.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_validate_session() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/about?fields=user"));
            Ok(json_response(401, ""))
        });

        let session = authenticated_session().await;
        let drive = connector(mock_http, session.clone());

        assert!(!drive.validate_session().await.unwrap());
        assert_eq!(session.state(), AuthState::Expired);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut mock_http = MockHttpClient::new();
        let mut call = 0;
        mock_http.expect_execute().times(2).returning(move |_| {
            call += 1;
            if call == 1 {
                Ok(json_response(503, "Backend Error"))
            } else {
                Ok(json_response(200, r#"{"files": [{"id": "d1", "name": "Invoices"}]}"#))
            }
        });

        let drive = connector(mock_http, authenticated_session().await);
        let folders = drive.list_folders().await.unwrap();

        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Invoices");
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                404,
                r#"{"error": {"code": 404, "message": "File not found: missing."}}"#,
            ))
        });

        let drive = connector(mock_http, authenticated_session().await);
        let err = drive.get_file_metadata("missing").await.unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("File not found: missing."));
    }

    #[tokio::test]
    async fn test_workspace_file_is_exported() {
        let mut mock_http = MockHttpClient::new();
        let mut call = 0;
        mock_http.expect_execute().times(2).returning(move |req| {
            call += 1;
            if call == 1 {
                assert!(req.url.contains("/files/sheet1?fields="));
                Ok(json_response(
                    200,
                    r#"{"id": "sheet1", "name": "Budget", "mimeType": "application/vnd.google-apps.spreadsheet"}"#,
                ))
            } else {
                let url = urlencoding::decode(&req.url).unwrap().into_owned();
                assert!(url.contains(
                    "/files/sheet1/export?mimeType=application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                ));
                Ok(json_response(200, "PK"))
            }
        });

        let drive = connector(mock_http, authenticated_session().await);
        let document = drive.get_document_file("sheet1").await.unwrap();

        assert_eq!(document.exported_name, "Budget.xlsx");
        assert_eq!(document.base64_content, "UEs=");
        assert_eq!(document.metadata.id, "sheet1");
    }

    #[tokio::test]
    async fn test_regular_file_is_downloaded() {
        let mut mock_http = MockHttpClient::new();
        let mut call = 0;
        mock_http.expect_execute().times(2).returning(move |req| {
            call += 1;
            if call == 1 {
                Ok(json_response(
                    200,
                    r#"{"id": "pdf1", "name": "scan.pdf", "mimeType": "application/pdf", "size": "5"}"#,
                ))
            } else {
                assert!(req.url.ends_with("/files/pdf1?alt=media"));
                Ok(json_response(200, "%PDF-"))
            }
        });

        let drive = connector(mock_http, authenticated_session().await);
        let document = drive.get_document_file("pdf1").await.unwrap();

        assert_eq!(document.exported_name, "scan.pdf");
        assert_eq!(document.base64_content, "JVBERi0=");
    }

    #[tokio::test]
    async fn test_download_file_keeps_content_type() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            let mut headers = HashMap::new();
            headers.insert("content-type".to_string(), "application/pdf".to_string());
            Ok(HttpResponse {
                status: 200,
                headers,
                body: Bytes::from_static(&[1, 2, 3]),
            })
        });

        let drive = connector(mock_http, authenticated_session().await);
        let blob = drive.download_file("pdf1").await.unwrap();

        assert_eq!(blob.content_type, "application/pdf");
        assert_eq!(blob.len(), 3);
    }

    #[tokio::test]
    async fn test_upload_file_sends_related_multipart() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Post);
            assert!(req.url.contains("/upload/drive/v3/files?uploadType=multipart"));
            assert!(req.headers["Content-Type"].starts_with("multipart/related; boundary="));

            let body = String::from_utf8(req.body.unwrap().to_vec()).unwrap();
            assert!(body.contains(r#"{"name":"report.pdf","mimeType":"application/pdf"}"#));
            assert!(body.contains("%PDF-"));
            Ok(json_response(200, r#"{"id": "new1", "name": "report.pdf"}"#))
        });

        let drive = connector(mock_http, authenticated_session().await);
        let uploaded = drive
            .upload_file(Blob::new(Bytes::from_static(b"%PDF-"), "application/pdf"), "report.pdf")
            .await
            .unwrap();

        assert_eq!(uploaded.id, "new1");
        assert_eq!(uploaded.size, Some(5));
    }

    #[tokio::test]
    async fn test_create_folder() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            let body: serde_json::Value = serde_json::from_slice(&req.body.unwrap()).unwrap();
            assert_eq!(body["mimeType"], FOLDER_MIME_TYPE);
            assert_eq!(body["parents"][0], "root1");
            Ok(json_response(200, r#"{"id": "d9", "name": "Receipts"}"#))
        });

        let drive = connector(mock_http, authenticated_session().await);
        let folder = drive.create_folder("Receipts", Some("root1")).await.unwrap();

        assert_eq!(folder.id, "d9");
    }

    #[test]
    fn test_error_message_prefers_envelope() {
        let response = json_response(403, r#"{"error": {"code": 403, "message": "Forbidden"}}"#);
        assert_eq!(error_message(&response), "Forbidden");
        assert_eq!(error_message(&json_response(500, "")), "HTTP 500");
    }
}
