//! # Core Service
//!
//! Façade host applications talk to.
//!
//! ## Overview
//!
//! [`CoreService::new`] turns a validated [`CoreConfig`] into a running core:
//! one event bus, one [`AuthSession`] and OAuth flow per enabled provider,
//! the provider connectors, the HTTP client of the local backend, and the
//! [`SyncOrchestrator`] over all of them. Persisted provider tokens are
//! restored during start-up, so a returning user is connected without a new
//! authorization round-trip.
//!
//! Provider connectors are compiled in through the `dropbox` and
//! `google-drive` features (both enabled by `desktop-shims`). Enabling a
//! provider in the configuration without its feature fails at start-up.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_service::{CoreConfig, CoreService, ProviderKind, ProviderSettings};
//!
//! let config = CoreConfig::builder()
//!     .dropbox(ProviderSettings::new("app-key", "http://localhost:4200/dropbox-callback"))
//!     .build()?;
//! let core = CoreService::new(config).await?;
//!
//! let url = core.authenticate(ProviderKind::Dropbox).await?;
//! // ... open `url`, wait for the redirect ...
//! core.handle_auth_callback(ProviderKind::Dropbox, &redirect).await?;
//!
//! let report = core.orchestrator().refresh_all().await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_auth::{AuthState, ProviderKind};
pub use core_runtime::config::{CoreConfig, FeatureFlags, ProviderSettings};
pub use core_runtime::events::{CoreEvent, EventBus, Notification, NotificationSeverity};
pub use core_runtime::logging::{LogFormat, LogLevel, LoggingConfig};
pub use core_sync::{BatchReport, EnabledSources, RefreshReport, SyncFlags, SyncOrchestrator};

use anyhow::Context;
use core_auth::{AuthSession, OAuthFlow, PendingAuthorization, TokenStore};
use core_library::{HttpDocumentBackend, SourceTag};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, instrument, warn};

/// Session, OAuth flow and in-flight authorization of one provider.
struct ProviderHandle {
    session: Arc<AuthSession>,
    flow: OAuthFlow,
    pending: Mutex<Option<PendingAuthorization>>,
}

/// Primary façade exposed to host applications.
pub struct CoreService {
    config: CoreConfig,
    event_bus: EventBus,
    orchestrator: Arc<SyncOrchestrator>,
    dropbox: Option<ProviderHandle>,
    google_drive: Option<ProviderHandle>,
}

impl CoreService {
    /// Wire every component described by `config`.
    ///
    /// # Errors
    ///
    /// - `Runtime` when the configuration does not validate
    /// - `CapabilityMissing` when a provider is enabled but its connector
    ///   feature was not compiled in
    /// - `ProviderUnavailable` when an enabled provider has no settings
    #[instrument(skip(config), fields(backend = %config.backend_base(), user_id = config.user_id))]
    pub async fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::default();
        let token_store = TokenStore::new(Arc::clone(&config.secure_store));
        let backend = Arc::new(HttpDocumentBackend::new(
            config.backend_base(),
            Arc::clone(&config.http_client),
        ));
        let mut orchestrator = SyncOrchestrator::new(backend, config.user_id, event_bus.clone());

        let dropbox = if config.features.enable_dropbox {
            let handle = provider_handle(
                ProviderKind::Dropbox,
                config.dropbox.as_ref(),
                &config,
                &token_store,
                &event_bus,
            )
            .await?;
            orchestrator = attach_dropbox(orchestrator, &config, &handle.session)?;
            Some(handle)
        } else {
            None
        };

        let google_drive = if config.features.enable_google_drive {
            let handle = provider_handle(
                ProviderKind::GoogleDrive,
                config.google_drive.as_ref(),
                &config,
                &token_store,
                &event_bus,
            )
            .await?;
            orchestrator = attach_drive(orchestrator, &config, &handle.session)?;
            Some(handle)
        } else {
            None
        };

        info!(
            dropbox = dropbox.is_some(),
            google_drive = google_drive.is_some(),
            "Core service started"
        );

        Ok(Self {
            config,
            event_bus,
            orchestrator: Arc::new(orchestrator),
            dropbox,
            google_drive,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    /// Receive every auth, sync and notification event from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn orchestrator(&self) -> Arc<SyncOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Whether `provider` was enabled and wired at start-up.
    pub fn is_configured(&self, provider: ProviderKind) -> bool {
        self.handle(provider).is_ok()
    }

    /// Current session state; `Unauthenticated` for a provider that is not
    /// configured.
    pub fn auth_state(&self, provider: ProviderKind) -> AuthState {
        self.handle(provider)
            .map(|handle| handle.session.state())
            .unwrap_or_default()
    }

    pub fn is_authenticated(&self, provider: ProviderKind) -> bool {
        self.auth_state(provider).is_authenticated()
    }

    /// Shared session handle, for hosts that watch state changes directly.
    pub fn session(&self, provider: ProviderKind) -> Result<Arc<AuthSession>> {
        self.handle(provider).map(|handle| Arc::clone(&handle.session))
    }

    /// Start an authorization flow and return the URL to open.
    ///
    /// A second call before the callback supersedes the first: only the
    /// latest authorization's state is accepted.
    ///
    /// # Errors
    ///
    /// `Auth(InvalidTransition)` if the provider is already connected.
    #[instrument(skip(self), fields(provider = %provider))]
    pub async fn authenticate(&self, provider: ProviderKind) -> Result<String> {
        let handle = self.handle(provider)?;
        let mut pending = handle.pending.lock().await;

        let (url, authorization) = handle.flow.authorization_url()?;
        handle.session.begin_authentication().await?;
        *pending = Some(authorization);

        info!("Authorization started");
        Ok(url)
    }

    /// Finish the flow started by [`authenticate`](Self::authenticate) with
    /// the redirect URL the provider sent back, then re-list that provider.
    ///
    /// A failed callback returns the session to `Unauthenticated`.
    ///
    /// # Errors
    ///
    /// - `NoPendingAuthorization` when no flow was started
    /// - `Auth(..)` for provider errors, state mismatch or a rejected code
    #[instrument(skip(self, callback_url), fields(provider = %provider))]
    pub async fn handle_auth_callback(
        &self,
        provider: ProviderKind,
        callback_url: &str,
    ) -> Result<()> {
        let handle = self.handle(provider)?;
        let pending = handle.pending.lock().await.take().ok_or_else(|| {
            CoreError::NoPendingAuthorization {
                provider: provider.display_name().to_string(),
            }
        })?;

        match handle.flow.handle_callback(callback_url, &pending).await {
            Ok(tokens) => handle.session.complete(tokens).await?,
            Err(e) => {
                if let Err(transition) = handle.session.fail(&e.to_string()).await {
                    warn!(error = %transition, "Could not abandon the authorization flow");
                }
                return Err(e.into());
            }
        }

        info!("Provider connected");
        self.relist(provider).await;
        Ok(())
    }

    /// Wait until an in-flight authorization settles.
    ///
    /// # Errors
    ///
    /// `Auth(Timeout)` if it has not settled within `timeout`.
    pub async fn wait_for_authentication(
        &self,
        provider: ProviderKind,
        timeout: Duration,
    ) -> Result<AuthState> {
        let handle = self.handle(provider)?;
        Ok(handle.session.wait_until_settled(timeout).await?)
    }

    /// Disconnect `provider`, forget its token and drop its listing.
    #[instrument(skip(self), fields(provider = %provider))]
    pub async fn sign_out(&self, provider: ProviderKind) -> Result<()> {
        let handle = self.handle(provider)?;
        handle.pending.lock().await.take();
        handle.session.sign_out().await?;

        self.relist(provider).await;
        Ok(())
    }

    fn handle(&self, provider: ProviderKind) -> Result<&ProviderHandle> {
        let handle = match provider {
            ProviderKind::Dropbox => self.dropbox.as_ref(),
            ProviderKind::GoogleDrive => self.google_drive.as_ref(),
        };
        handle.ok_or_else(|| CoreError::ProviderUnavailable {
            provider: provider.display_name().to_string(),
        })
    }

    async fn relist(&self, provider: ProviderKind) {
        let source = match provider {
            ProviderKind::Dropbox => SourceTag::Dropbox,
            ProviderKind::GoogleDrive => SourceTag::Drive,
        };
        // Failures are already published as ListingFailed + notification
        if let Err(e) = self.orchestrator.refresh_source(source).await {
            warn!(error = %e, "Listing after auth change failed");
        }
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("config", &self.config)
            .field("dropbox", &self.auth_state(ProviderKind::Dropbox))
            .field("google_drive", &self.auth_state(ProviderKind::GoogleDrive))
            .finish()
    }
}

/// Host entry point: install logging, start the core and load the first
/// merged view.
///
/// Listing failures do not fail start-up; they are reported on the event
/// bus like any other refresh.
pub async fn bootstrap(config: CoreConfig, logging: LoggingConfig) -> anyhow::Result<CoreService> {
    core_runtime::logging::init_logging(logging).context("Failed to initialize logging")?;

    let service = CoreService::new(config)
        .await
        .context("Failed to start the core service")?;

    let report = service.orchestrator().refresh_all().await;
    if !report.failed_sources.is_empty() {
        warn!(failed = ?report.failed_sources, "Some sources could not be listed at start-up");
    }
    info!(documents = report.documents, "Initial view loaded");

    Ok(service)
}

async fn provider_handle(
    provider: ProviderKind,
    settings: Option<&ProviderSettings>,
    config: &CoreConfig,
    token_store: &TokenStore,
    event_bus: &EventBus,
) -> Result<ProviderHandle> {
    let settings = settings
        .cloned()
        .ok_or_else(|| CoreError::ProviderUnavailable {
            provider: provider.display_name().to_string(),
        })?;

    let session = Arc::new(
        AuthSession::new(provider, token_store.clone()).with_event_bus(event_bus.clone()),
    );
    match session.restore().await {
        Ok(true) => info!(provider = %provider, "Restored provider session"),
        Ok(false) => {}
        // Start disconnected; the user can still sign in
        Err(e) => warn!(provider = %provider, error = %e, "Could not restore provider session"),
    }

    Ok(ProviderHandle {
        session,
        flow: OAuthFlow::new(provider, settings, Arc::clone(&config.http_client)),
        pending: Mutex::new(None),
    })
}

#[cfg(feature = "dropbox")]
fn attach_dropbox(
    orchestrator: SyncOrchestrator,
    config: &CoreConfig,
    session: &Arc<AuthSession>,
) -> Result<SyncOrchestrator> {
    let connector = provider_dropbox::DropboxConnector::new(
        Arc::clone(&config.http_client),
        Arc::clone(session),
    );
    Ok(orchestrator.with_dropbox(Arc::new(connector)))
}

#[cfg(not(feature = "dropbox"))]
fn attach_dropbox(
    _orchestrator: SyncOrchestrator,
    _config: &CoreConfig,
    _session: &Arc<AuthSession>,
) -> Result<SyncOrchestrator> {
    Err(connector_missing("Dropbox", "dropbox"))
}

#[cfg(feature = "google-drive")]
fn attach_drive(
    orchestrator: SyncOrchestrator,
    config: &CoreConfig,
    session: &Arc<AuthSession>,
) -> Result<SyncOrchestrator> {
    let connector = provider_google_drive::GoogleDriveConnector::new(
        Arc::clone(&config.http_client),
        Arc::clone(session),
    );
    Ok(orchestrator.with_drive(Arc::new(connector)))
}

#[cfg(not(feature = "google-drive"))]
fn attach_drive(
    _orchestrator: SyncOrchestrator,
    _config: &CoreConfig,
    _session: &Arc<AuthSession>,
) -> Result<SyncOrchestrator> {
    Err(connector_missing("Google Drive", "google-drive"))
}

#[cfg(any(not(feature = "dropbox"), not(feature = "google-drive")))]
fn connector_missing(provider: &str, feature: &str) -> CoreError {
    CoreError::CapabilityMissing {
        capability: format!("{} connector", provider),
        message: format!(
            "{} is enabled in the configuration but this build lacks the `{}` feature",
            provider, feature
        ),
    }
}

#[cfg(all(test, feature = "dropbox"))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::MemorySecureStore;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpClient, HttpRequest, HttpResponse, SecureStore};
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    const TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";
    const REDIRECT: &str = "http://localhost:4200/dropbox-callback";

    /// Answers the Dropbox token endpoint and folder listing; 404 otherwise.
    #[derive(Default)]
    struct FakeHttp {
        requests: StdMutex<Vec<String>>,
    }

    impl FakeHttp {
        fn urls(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for FakeHttp {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requests.lock().unwrap().push(request.url.clone());
            let (status, body) = if request.url == TOKEN_URL {
                (200, r#"{"access_token": "tok-123", "token_type": "bearer"}"#)
            } else if request.url.ends_with("/files/list_folder") {
                (200, r#"{"entries": [], "cursor": "c1", "has_more": false}"#)
            } else {
                (404, "{}")
            };
            Ok(HttpResponse {
                status,
                headers: HashMap::new(),
                body: Bytes::from(body),
            })
        }
    }

    fn config(http: Arc<FakeHttp>, store: Arc<MemorySecureStore>) -> CoreConfig {
        CoreConfig::builder()
            .http_client(http)
            .secure_store(store)
            .dropbox(ProviderSettings::new("app-key", REDIRECT))
            .build()
            .unwrap()
    }

    fn query_value(url: &str, key: &str) -> String {
        url::Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_authorization_round_trip_connects_dropbox() {
        let http = Arc::new(FakeHttp::default());
        let store = Arc::new(MemorySecureStore::new());
        let core = CoreService::new(config(http.clone(), store.clone()))
            .await
            .unwrap();

        assert!(core.is_configured(ProviderKind::Dropbox));
        assert!(!core.is_configured(ProviderKind::GoogleDrive));
        assert!(!core.is_authenticated(ProviderKind::Dropbox));

        let url = core.authenticate(ProviderKind::Dropbox).await.unwrap();
        assert!(url.starts_with("https://www.dropbox.com/oauth2/authorize?"));
        assert_eq!(query_value(&url, "client_id"), "app-key");
        assert_eq!(core.auth_state(ProviderKind::Dropbox), AuthState::Authenticating);

        let state = query_value(&url, "state");
        let callback = format!("{}?code=abc&state={}", REDIRECT, state);
        core.handle_auth_callback(ProviderKind::Dropbox, &callback)
            .await
            .unwrap();

        assert!(core.is_authenticated(ProviderKind::Dropbox));
        assert!(store
            .get_secret(ProviderKind::Dropbox.token_key())
            .await
            .unwrap()
            .is_some());
        assert!(http.urls().iter().any(|u| u.ends_with("/files/list_folder")));
    }

    #[tokio::test]
    async fn test_state_mismatch_abandons_flow() {
        let http = Arc::new(FakeHttp::default());
        let core = CoreService::new(config(http.clone(), Arc::new(MemorySecureStore::new())))
            .await
            .unwrap();

        core.authenticate(ProviderKind::Dropbox).await.unwrap();
        let callback = format!("{}?code=abc&state=forged", REDIRECT);
        let err = core
            .handle_auth_callback(ProviderKind::Dropbox, &callback)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Auth(core_auth::AuthError::StateMismatch)
        ));
        assert_eq!(core.auth_state(ProviderKind::Dropbox), AuthState::Unauthenticated);
        assert!(!http.urls().iter().any(|u| u == TOKEN_URL));
    }

    #[tokio::test]
    async fn test_callback_without_pending_authorization() {
        let core = CoreService::new(config(
            Arc::new(FakeHttp::default()),
            Arc::new(MemorySecureStore::new()),
        ))
        .await
        .unwrap();

        let err = core
            .handle_auth_callback(ProviderKind::Dropbox, &format!("{}?code=x", REDIRECT))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NoPendingAuthorization { .. }));
    }

    #[tokio::test]
    async fn test_persisted_token_is_restored_and_sign_out_clears_it() {
        let store = Arc::new(MemorySecureStore::new());
        store
            .set_secret(ProviderKind::Dropbox.token_key(), b"persisted-token")
            .await
            .unwrap();

        let core = CoreService::new(config(Arc::new(FakeHttp::default()), store.clone()))
            .await
            .unwrap();
        assert!(core.is_authenticated(ProviderKind::Dropbox));

        core.sign_out(ProviderKind::Dropbox).await.unwrap();
        assert!(!core.is_authenticated(ProviderKind::Dropbox));
        assert!(store
            .get_secret(ProviderKind::Dropbox.token_key())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_reported() {
        let core = CoreService::new(config(
            Arc::new(FakeHttp::default()),
            Arc::new(MemorySecureStore::new()),
        ))
        .await
        .unwrap();

        assert_eq!(core.auth_state(ProviderKind::GoogleDrive), AuthState::Unauthenticated);
        let err = core.authenticate(ProviderKind::GoogleDrive).await.unwrap_err();
        assert!(matches!(err, CoreError::ProviderUnavailable { .. }));
    }
}
