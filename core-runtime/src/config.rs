//! # Core Configuration Module
//!
//! Provides configuration management for the document sync core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and settings the core needs. It enforces
//! fail-fast validation so a missing bridge or half-configured provider is
//! reported at startup instead of on the first sync.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Backend and provider requests (desktop default: reqwest)
//! - `SecureStore` - Provider token persistence (desktop default: OS keychain)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults are
//! injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ProviderSettings};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .backend_url("http://127.0.0.1:5050")
//!     .user_id(1)
//!     .http_client(Arc::new(MyHttpClient))
//!     .secure_store(Arc::new(MySecureStore))
//!     .dropbox(ProviderSettings::new("app-key", "http://localhost:4200/dropbox-callback"))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! // Fails with Error::Config: the Dropbox flag is on but no app key is set
//! let result = CoreConfig::builder()
//!     .enable_dropbox(true)
//!     .build();
//! assert!(result.is_err());
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, SecureStore};
use std::sync::Arc;
use url::Url;

/// Default address of the local document backend.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5050";

/// OAuth client settings for one cloud provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl ProviderSettings {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
        }
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self, provider: &str) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config(format!(
                "{} client_id cannot be empty",
                provider
            )));
        }

        Url::parse(&self.redirect_uri).map_err(|e| {
            Error::Config(format!(
                "{} redirect_uri is not a valid URL ({}): {}",
                provider, self.redirect_uri, e
            ))
        })?;

        Ok(())
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Feature flags control which cloud providers are wired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Enable the Dropbox connector (requires Dropbox provider settings)
    pub enable_dropbox: bool,

    /// Enable the Google Drive connector (requires Drive provider settings)
    pub enable_google_drive: bool,
}

/// Core configuration for the document sync core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Base URL of the local document backend
    pub backend_url: String,

    /// Backend user whose documents and sync flags are reconciled
    pub user_id: i64,

    pub http_client: Arc<dyn HttpClient>,

    pub secure_store: Arc<dyn SecureStore>,

    pub dropbox: Option<ProviderSettings>,

    pub google_drive: Option<ProviderSettings>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("backend_url", &self.backend_url)
            .field("user_id", &self.user_id)
            .field("http_client", &"HttpClient { ... }")
            .field("secure_store", &"SecureStore { ... }")
            .field("dropbox", &self.dropbox)
            .field("google_drive", &self.google_drive)
            .field("features", &self.features)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Backend URL is an absolute http(s) URL
    /// - User id is positive
    /// - Every enabled provider has complete settings
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.backend_url).map_err(|e| {
            Error::Config(format!(
                "Backend URL is not valid ({}): {}",
                self.backend_url, e
            ))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "Backend URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.user_id <= 0 {
            return Err(Error::Config(format!(
                "User id must be positive, got {}",
                self.user_id
            )));
        }

        if self.features.enable_dropbox {
            let settings = self.dropbox.as_ref().ok_or_else(|| {
                Error::Config(
                    "Dropbox is enabled but no provider settings were given. \
                     Use .dropbox(ProviderSettings::new(..)) to set them."
                        .to_string(),
                )
            })?;
            settings.validate("Dropbox")?;
        }

        if self.features.enable_google_drive {
            let settings = self.google_drive.as_ref().ok_or_else(|| {
                Error::Config(
                    "Google Drive is enabled but no provider settings were given. \
                     Use .google_drive(ProviderSettings::new(..)) to set them."
                        .to_string(),
                )
            })?;
            settings.validate("Google Drive")?;
        }

        Ok(())
    }

    /// Backend URL without a trailing slash, ready for path joining.
    pub fn backend_base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }
}

#[cfg_attr(feature = "desktop-shims", allow(dead_code))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                  Desktop: enable the `desktop-shims` feature. \
                  Other hosts: inject a platform adapter with .http_client()."
            .to_string(),
    }
}

#[cfg_attr(feature = "desktop-shims", allow(dead_code))]
fn secure_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SecureStore".to_string(),
        message: "No secure store provided. Provider tokens cannot be persisted. \
                  Desktop: enable the `desktop-shims` feature. \
                  Other hosts: inject a platform adapter with .secure_store()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new()
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::KeyringSecureStore;

    let store: Arc<dyn SecureStore> = Arc::new(KeyringSecureStore::new());
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(secure_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) once all options are set; the
/// builder reports missing capabilities with actionable messages.
#[derive(Default)]
pub struct CoreConfigBuilder {
    backend_url: Option<String>,
    user_id: Option<i64>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    dropbox: Option<ProviderSettings>,
    google_drive: Option<ProviderSettings>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the local backend base URL (default `http://127.0.0.1:5050`).
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Sets the backend user id (default `1`).
    pub fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Sets Dropbox OAuth settings and enables the Dropbox connector.
    pub fn dropbox(mut self, settings: ProviderSettings) -> Self {
        self.dropbox = Some(settings);
        self.features.enable_dropbox = true;
        self
    }

    /// Sets Drive OAuth settings and enables the Drive connector.
    pub fn google_drive(mut self, settings: ProviderSettings) -> Self {
        self.google_drive = Some(settings);
        self.features.enable_google_drive = true;
        self
    }

    pub fn enable_dropbox(mut self, enabled: bool) -> Self {
        self.features.enable_dropbox = enabled;
        self
    }

    pub fn enable_google_drive(mut self, enabled: bool) -> Self {
        self.features.enable_google_drive = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing and no desktop default is available
    /// - The backend URL or user id is invalid
    /// - A provider is enabled without usable settings
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };

        let config = CoreConfig {
            backend_url: self
                .backend_url
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            user_id: self.user_id.unwrap_or(1),
            http_client,
            secure_store,
            dropbox: self.dropbox,
            google_drive: self.google_drive,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
