//! HTTP Client Abstraction
//!
//! Provides async HTTP operations, retry policy configuration and the
//! multipart encodings the backend and the cloud upload endpoints expect.

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON serialization failed: {}", e))
        })?;
        self.body = Some(Bytes::from(json));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Attach an encoded multipart body and its boundary-bearing content type.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.headers
            .insert("Content-Type".to_string(), form.content_type());
        self.body = Some(form.into_bytes());
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub use_exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given zero-based retry attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = if self.use_exponential_backoff {
            self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
        } else {
            self.base_delay
        };
        delay.min(self.max_delay)
    }
}

/// Which multipart flavour a [`MultipartForm`] encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartKind {
    /// `multipart/form-data`, used by HTML-form style endpoints.
    FormData,
    /// `multipart/related`, used by Drive's metadata-plus-media uploads.
    Related,
}

#[derive(Debug, Clone)]
struct MultipartPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

/// Multipart body builder
///
/// # Example
///
/// ```ignore
/// let form = MultipartForm::new()
///     .text("name", "Report.pdf")
///     .file("document", "Report.pdf", "application/pdf", bytes);
/// let request = HttpRequest::new(HttpMethod::Post, url).multipart(form);
/// ```
#[derive(Debug, Clone)]
pub struct MultipartForm {
    kind: MultipartKind,
    boundary: String,
    parts: Vec<MultipartPart>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_kind(MultipartKind::FormData)
    }

    pub fn related() -> Self {
        Self::with_kind(MultipartKind::Related)
    }

    fn with_kind(kind: MultipartKind) -> Self {
        Self {
            kind,
            boundary: format!("docsync-{}", Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn kind(&self) -> MultipartKind {
        self.kind
    }

    /// Names of the parts in insertion order.
    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: Bytes::from(value.into()),
        });
        self
    }

    /// Add a part with an explicit content type and no file name.
    pub fn typed(
        mut self,
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            file_name: None,
            content_type: Some(content_type.into()),
            data,
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        });
        self
    }

    pub fn content_type(&self) -> String {
        let subtype = match self.kind {
            MultipartKind::FormData => "form-data",
            MultipartKind::Related => "related",
        };
        format!("multipart/{}; boundary={}", subtype, self.boundary)
    }

    pub fn into_bytes(self) -> Bytes {
        let mut out = BytesMut::new();
        for part in &self.parts {
            out.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            if self.kind == MultipartKind::FormData {
                let disposition = match &part.file_name {
                    Some(file_name) => format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        escape_quoted(&part.name),
                        escape_quoted(file_name)
                    ),
                    None => format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n",
                        escape_quoted(&part.name)
                    ),
                };
                out.put_slice(disposition.as_bytes());
            }
            if let Some(content_type) = &part.content_type {
                out.put_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            out.put_slice(b"\r\n");
            out.put_slice(&part.data);
            out.put_slice(b"\r\n");
        }
        out.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out.freeze()
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('"', "%22").replace('\r', "").replace('\n', "")
}

/// Async HTTP client trait
///
/// This trait abstracts HTTP operations to allow platform-specific implementations.
/// Implementations should handle:
/// - Automatic retry with exponential backoff
/// - TLS certificate validation
/// - Connection pooling and keep-alive
///
/// Non-2xx responses are returned as `Ok(HttpResponse)`; callers classify
/// status codes themselves.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, HttpMethod};
///
/// async fn fetch_profile(client: &dyn HttpClient) -> Result<String> {
///     let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:5050/user/1");
///     let response = client.execute(request).await?;
///     response.text()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute an HTTP request with custom retry policy
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        // Implementations can override for custom retry logic
        let _ = policy;
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Get, "https://example.com")
            .header("User-Agent", "test")
            .bearer_token("secret")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer secret".to_string())
        );
    }

    #[test]
    fn test_http_response_status_checks() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from("test"),
        };

        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("dropbox-api-result".to_string(), "{}".to_string());
        let response = HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };

        assert_eq!(response.header("Dropbox-API-Result"), Some("{}"));
        assert_eq!(response.header("Content-Type"), None);
    }

    #[test]
    fn test_retry_policy_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            use_exponential_backoff: true,
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(5), Duration::from_millis(500));
    }

    #[test]
    fn test_form_data_encoding() {
        let form = MultipartForm::new()
            .text("name", "Report.pdf")
            .file(
                "document",
                "Report.pdf",
                "application/pdf",
                Bytes::from_static(b"%PDF"),
            );
        let boundary = form.boundary().to_string();
        assert_eq!(
            form.content_type(),
            format!("multipart/form-data; boundary={}", boundary)
        );
        assert_eq!(form.part_names(), vec!["name", "document"]);

        let body = String::from_utf8(form.into_bytes().to_vec()).unwrap();
        assert!(body.contains("Content-Disposition: form-data; name=\"name\"\r\n\r\nReport.pdf\r\n"));
        assert!(body.contains("filename=\"Report.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF\r\n"));
        assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
    }

    #[test]
    fn test_related_encoding_omits_disposition() {
        let form = MultipartForm::related()
            .typed("metadata", "application/json", Bytes::from_static(b"{}"))
            .typed("media", "text/plain", Bytes::from_static(b"hi"));
        assert!(form.content_type().starts_with("multipart/related; boundary="));

        let body = String::from_utf8(form.into_bytes().to_vec()).unwrap();
        assert!(!body.contains("Content-Disposition"));
        assert!(body.contains("Content-Type: application/json\r\n\r\n{}\r\n"));
    }

    #[test]
    fn test_multipart_request_sets_content_type() {
        let form = MultipartForm::new().text("name", "a");
        let expected = form.content_type();
        let request = HttpRequest::new(HttpMethod::Post, "http://localhost/documents").multipart(form);

        assert_eq!(request.headers.get("Content-Type"), Some(&expected));
        assert!(request.body.is_some());
    }
}
