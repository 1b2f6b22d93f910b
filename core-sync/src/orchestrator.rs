//! # Sync Orchestrator
//!
//! Drives the multi-step workflows that move documents between the local
//! backend and the cloud providers, and keeps the merged document view
//! current.
//!
//! ## Overview
//!
//! - `refresh_all` lists every source concurrently. A source that fails keeps
//!   an empty listing and never blocks the others.
//! - `download_to_local` copies a cloud document into the local backend.
//! - `sync_to_cloud` uploads a local document to Dropbox or Drive.
//! - `batch_sync` downloads a selection one item at a time, counting
//!   failures instead of aborting.
//!
//! Every workflow reports exactly one [`Notification`] per attempt and
//! nothing retries on its own; a retry is the user repeating the action.
//! Connectors retry at the transport level where their API calls for it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncOrchestrator;
//!
//! let orchestrator = SyncOrchestrator::new(backend, user_id, event_bus)
//!     .with_dropbox(dropbox)
//!     .with_drive(drive);
//!
//! orchestrator.refresh_all().await;
//! for doc in orchestrator.documents().await {
//!     if !doc.has_tag(SourceTag::Local) && !orchestrator.already_synced(&doc).await {
//!         orchestrator.download_to_local(&doc).await?;
//!     }
//! }
//! ```

use crate::config::SyncConfig;
use crate::job::{PhaseTracker, SyncOperation, SyncPhase};
use crate::merge::{self, merge_records, EnabledSources};
use crate::view::{DocumentView, LoadingFlag, LoadingFlags, LoadingSnapshot, SyncFlags};
use crate::{Result, SyncError};
use bridge_traits::backend::DocumentBackend;
use bridge_traits::cloud::{
    DriveListOptions, DriveStorage, DropboxStorage, ListingProgress, ProgressCallback,
};
use bridge_traits::records::{DriveFile, DropboxFile, NewDocument, UploadedFile, UserProfile};
use bytes::Bytes;
use core_auth::ProviderKind;
use core_library::classifier::mime_from_file_name;
use core_library::codec::{decode_base64, sanitize_file_name, to_base64_yielding};
use core_library::{
    DocumentContent, DocumentRecord, FolderRecord, FolderSource, OriginLocator, SourceRecord,
    SourceTag,
};
use core_runtime::events::{
    CoreEvent, EventBus, Notification, NotificationSeverity, SyncEvent,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

const DRIVE_FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const OCTET_STREAM: &str = "application/octet-stream";

// ============================================================================
// Reports
// ============================================================================

/// Outcome of [`SyncOrchestrator::refresh_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Documents in the rebuilt view
    pub documents: usize,
    /// Sources whose listing failed and were left empty
    pub failed_sources: Vec<SourceTag>,
}

/// One item of a batch that could not be synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub name: String,
    pub message: String,
}

/// Aggregate outcome of [`SyncOrchestrator::batch_sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: u32,
    pub failed: u32,
    /// Items already present locally
    pub skipped: u32,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> u32 {
        self.succeeded + self.failed + self.skipped
    }
}

/// Bytes fetched from a cloud provider, ready to persist.
struct FetchedContent {
    name: String,
    bytes: Bytes,
    content_type: String,
}

/// A successful listing of one source.
enum Listing {
    Local(UserProfile),
    Dropbox(Vec<DropboxFile>),
    Drive(Vec<DriveFile>),
}

impl Listing {
    fn apply(self, view: &mut DocumentView) {
        match self {
            Listing::Local(profile) => view.set_profile(profile),
            Listing::Dropbox(files) => view.set_dropbox(files),
            Listing::Drive(files) => view.set_drive(files),
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Sync workflows over the local backend and the cloud providers.
pub struct SyncOrchestrator {
    backend: Arc<dyn DocumentBackend>,
    dropbox: Option<Arc<dyn DropboxStorage>>,
    drive: Option<Arc<dyn DriveStorage>>,
    event_bus: EventBus,
    config: SyncConfig,
    user_id: i64,
    view: RwLock<DocumentView>,
    loading: LoadingFlags,
}

impl SyncOrchestrator {
    pub fn new(backend: Arc<dyn DocumentBackend>, user_id: i64, event_bus: EventBus) -> Self {
        Self {
            backend,
            dropbox: None,
            drive: None,
            event_bus,
            config: SyncConfig::default(),
            user_id,
            view: RwLock::new(DocumentView::new()),
            loading: LoadingFlags::new(),
        }
    }

    pub fn with_dropbox(mut self, dropbox: Arc<dyn DropboxStorage>) -> Self {
        self.dropbox = Some(dropbox);
        self
    }

    pub fn with_drive(mut self, drive: Arc<dyn DriveStorage>) -> Self {
        self.drive = Some(drive);
        self
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn loading(&self) -> LoadingSnapshot {
        self.loading.snapshot()
    }

    /// Current merged view, sorted by display name.
    pub async fn documents(&self) -> Vec<DocumentRecord> {
        self.view.read().await.documents().to_vec()
    }

    /// Sync flags as last read from the backend.
    pub async fn sync_flags(&self) -> SyncFlags {
        self.view.read().await.sync_flags()
    }

    pub async fn enabled_sources(&self) -> EnabledSources {
        self.view.read().await.enabled_sources()
    }

    /// Change which sources take part in the merge and rebuild it from the
    /// full listings. Returns the new document count.
    pub async fn set_enabled_sources(&self, enabled: EnabledSources) -> usize {
        let documents = {
            let mut view = self.view.write().await;
            view.set_enabled(enabled);
            view.rebuild()
        };
        self.emit_view_refreshed(documents);
        documents
    }

    /// True when a local copy of `cloud` already exists.
    pub async fn already_synced(&self, cloud: &DocumentRecord) -> bool {
        let local_records = self.view.read().await.local_records();
        self.already_synced_in(cloud, &local_records)
    }

    fn already_synced_in(&self, cloud: &DocumentRecord, local_records: &[DocumentRecord]) -> bool {
        merge::already_synced(
            cloud,
            local_records,
            self.config.already_synced_tolerance_bytes,
        )
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// List every source concurrently and rebuild the view.
    ///
    /// Each failing source emits `ListingFailed` and one warning
    /// notification; the other sources are unaffected.
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) -> RefreshReport {
        self.reload_all(true).await
    }

    /// Re-list one source and rebuild the view.
    ///
    /// # Errors
    ///
    /// Returns the listing failure after clearing that source's listing.
    #[instrument(skip(self), fields(source = %source))]
    pub async fn refresh_source(&self, source: SourceTag) -> Result<usize> {
        self.reload_source(source, true).await
    }

    async fn reload_all(&self, notify: bool) -> RefreshReport {
        let (local, dropbox, drive) = futures::join!(
            self.fetch(SourceTag::Local),
            self.fetch(SourceTag::Dropbox),
            self.fetch(SourceTag::Drive)
        );

        let mut failures = Vec::new();
        let documents = {
            let mut view = self.view.write().await;
            for (source, outcome) in [
                (SourceTag::Local, local),
                (SourceTag::Dropbox, dropbox),
                (SourceTag::Drive, drive),
            ] {
                match outcome {
                    Ok(listing) => listing.apply(&mut view),
                    Err(err) => {
                        view.clear(source);
                        failures.push((source, err));
                    }
                }
            }
            view.rebuild()
        };

        for (source, err) in &failures {
            self.report_listing_failure(*source, err, notify);
        }
        self.emit_view_refreshed(documents);
        info!(
            "Refreshed document view: {} documents, {} failed sources",
            documents,
            failures.len()
        );

        RefreshReport {
            documents,
            failed_sources: failures.into_iter().map(|(source, _)| source).collect(),
        }
    }

    async fn reload_source(&self, source: SourceTag, notify: bool) -> Result<usize> {
        let outcome = self.fetch(source).await;

        let (documents, failure) = {
            let mut view = self.view.write().await;
            let failure = match outcome {
                Ok(listing) => {
                    listing.apply(&mut view);
                    None
                }
                Err(err) => {
                    view.clear(source);
                    Some(err)
                }
            };
            (view.rebuild(), failure)
        };
        self.emit_view_refreshed(documents);

        match failure {
            None => {
                debug!("Reloaded {} listing: {} documents in view", source, documents);
                Ok(documents)
            }
            Some(err) => {
                self.report_listing_failure(source, &err, notify);
                Err(err)
            }
        }
    }

    async fn fetch(&self, source: SourceTag) -> Result<Listing> {
        let _loading = self.loading.begin(LoadingFlag::from(source));
        match source {
            SourceTag::Local => self.fetch_local().await.map(Listing::Local),
            SourceTag::Dropbox => self.fetch_dropbox().await.map(Listing::Dropbox),
            SourceTag::Drive => self.fetch_drive().await.map(Listing::Drive),
        }
    }

    async fn fetch_local(&self) -> Result<UserProfile> {
        self.backend
            .get_user(self.user_id)
            .await
            .map_err(SyncError::from_backend)
    }

    /// An unconnected or signed-out provider lists as empty.
    async fn fetch_dropbox(&self) -> Result<Vec<DropboxFile>> {
        match &self.dropbox {
            Some(dropbox) if dropbox.is_authenticated() => dropbox
                .list_files("")
                .await
                .map_err(|err| SyncError::from_provider(ProviderKind::Dropbox, err)),
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_drive(&self) -> Result<Vec<DriveFile>> {
        let drive = match &self.drive {
            Some(drive) if drive.is_authenticated() => drive,
            _ => return Ok(Vec::new()),
        };

        let event_bus = self.event_bus.clone();
        let progress: ProgressCallback = Arc::new(move |progress: ListingProgress| {
            event_bus
                .emit(CoreEvent::Sync(SyncEvent::ListingProgress {
                    source: SourceTag::Drive.as_str().to_string(),
                    fetched: progress.fetched as u64,
                    requests: progress.requests,
                }))
                .ok();
        });

        let listing = drive
            .list_all_files(DriveListOptions::default(), Some(progress))
            .await
            .map_err(|err| SyncError::from_provider(ProviderKind::GoogleDrive, err))?;

        debug!(
            "Drive listing: {} files in {} requests",
            listing.total_files, listing.total_requests
        );

        Ok(listing
            .files
            .into_iter()
            .filter(|file| file.mime_type != DRIVE_FOLDER_MIME)
            .collect())
    }

    fn report_listing_failure(&self, source: SourceTag, err: &SyncError, notify: bool) {
        warn!("Failed to list {}: {}", source, err);
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::ListingFailed {
                source: source.as_str().to_string(),
                message: err.to_string(),
            }))
            .ok();

        if notify {
            let detail = match err {
                SyncError::AuthExpired { .. } => err.user_message(),
                _ => format!("Failed to fetch {} documents", source_label(source)),
            };
            self.notify(Notification::warn("Warning", detail));
        }
    }

    // ========================================================================
    // Download
    // ========================================================================

    /// Copy a cloud document into the local backend, then refresh every
    /// listing.
    ///
    /// # Errors
    ///
    /// - `MissingLocator` if the record has no cloud origin
    /// - `EmptyContent` if the provider returned no bytes
    /// - `AuthExpired` / `NotFound` from the provider
    /// - `Backend` if the local backend rejects the document
    #[instrument(skip(self, record), fields(name = %record.display_name))]
    pub async fn download_to_local(&self, record: &DocumentRecord) -> Result<()> {
        let _syncing = self.loading.begin(LoadingFlag::Syncing);
        let mut tracker = PhaseTracker::new(SyncOperation::DownloadToLocal, self.event_bus.clone());

        match self.download_and_refresh(record, &mut tracker).await {
            Ok(name) => {
                info!("Downloaded {} to local documents", name);
                self.notify(Notification::success(
                    "Success",
                    format!("Synced {} to your documents", name),
                ));
                Ok(())
            }
            Err(err) => {
                tracker.fail();
                error!("Download of {} failed: {}", record.display_name, err);
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    async fn download_and_refresh(
        &self,
        record: &DocumentRecord,
        tracker: &mut PhaseTracker,
    ) -> Result<String> {
        let name = self.import_to_local(record, tracker).await?;

        tracker.advance(SyncPhase::RefreshingView)?;
        self.reload_all(false).await;
        tracker.advance(SyncPhase::Idle)?;

        Ok(name)
    }

    /// Fetch, classify and persist one cloud document. Leaves the tracker
    /// in `PersistingTarget`.
    async fn import_to_local(
        &self,
        record: &DocumentRecord,
        tracker: &mut PhaseTracker,
    ) -> Result<String> {
        tracker.advance(SyncPhase::FetchingSource)?;
        let fetched = self.fetch_cloud_content(record).await?;

        tracker.advance(SyncPhase::Transforming)?;
        if fetched.bytes.is_empty() {
            return Err(SyncError::EmptyContent { name: fetched.name });
        }
        let doc_type = match mime_from_file_name(&fetched.name) {
            OCTET_STREAM if !fetched.content_type.trim().is_empty() => fetched.content_type,
            guessed => guessed.to_string(),
        };
        let document = NewDocument {
            size: fetched.bytes.len() as u64,
            name: fetched.name,
            user_id: self.user_id,
            content: fetched.bytes,
            doc_type,
            folder_id: None,
        };
        let name = document.name.clone();

        tracker.advance(SyncPhase::PersistingTarget)?;
        self.backend
            .create_document(document)
            .await
            .map_err(SyncError::from_backend)?;

        Ok(name)
    }

    /// Primary transport first, the secondary one if it fails for any
    /// reason other than auth or a missing file.
    async fn fetch_cloud_content(&self, record: &DocumentRecord) -> Result<FetchedContent> {
        let origin = record
            .origin
            .as_ref()
            .ok_or_else(|| SyncError::MissingLocator {
                name: record.display_name.clone(),
            })?;

        match origin {
            OriginLocator::DropboxPath(path) => {
                let dropbox = self.dropbox_connector()?;
                let blob = match dropbox.download_file(path).await {
                    Ok(blob) => blob,
                    Err(err) if err.is_unauthorized() || err.is_not_found() => {
                        return Err(SyncError::from_provider(ProviderKind::Dropbox, err));
                    }
                    Err(err) => {
                        warn!("Dropbox download failed ({}), trying the direct API", err);
                        dropbox
                            .download_file_direct_api(path)
                            .await
                            .map_err(|err| SyncError::from_provider(ProviderKind::Dropbox, err))?
                    }
                };
                Ok(FetchedContent {
                    name: record.display_name.clone(),
                    bytes: blob.bytes,
                    content_type: blob.content_type,
                })
            }
            OriginLocator::DriveFileId(file_id) => {
                let drive = self.drive_connector()?;
                match drive.get_document_file(file_id).await {
                    Ok(file) => {
                        let bytes = decode_base64(&file.base64_content)
                            .map_err(|_| SyncError::InvalidFormat)?;
                        let content_type = mime_from_file_name(&file.exported_name).to_string();
                        Ok(FetchedContent {
                            name: file.exported_name,
                            bytes: Bytes::from(bytes),
                            content_type,
                        })
                    }
                    Err(err) if err.is_unauthorized() || err.is_not_found() => {
                        Err(SyncError::from_provider(ProviderKind::GoogleDrive, err))
                    }
                    Err(err) => {
                        warn!("Drive export failed ({}), trying a raw download", err);
                        let blob = drive.download_file(file_id).await.map_err(|err| {
                            SyncError::from_provider(ProviderKind::GoogleDrive, err)
                        })?;
                        Ok(FetchedContent {
                            name: record.display_name.clone(),
                            bytes: blob.bytes,
                            content_type: blob.content_type,
                        })
                    }
                }
            }
        }
    }

    /// Base64 of a document's bytes, fetching from the cloud when the
    /// record carries no content.
    #[instrument(skip(self, record), fields(name = %record.display_name))]
    pub async fn content_base64(&self, record: &DocumentRecord) -> Result<String> {
        let has_content = record
            .content
            .as_ref()
            .is_some_and(|content| !content.is_empty());

        let bytes = if has_content || record.origin.is_none() {
            self.with_content(record)
                .await?
                .to_blob()
                .map_err(|err| SyncError::from_content(&record.display_name, err))?
                .bytes
        } else {
            self.fetch_cloud_content(record).await?.bytes
        };

        Ok(to_base64_yielding(&bytes, self.config.encode_chunk_size).await)
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Upload a local document to `target`, then re-list that provider.
    ///
    /// # Errors
    ///
    /// - `SyncDisabled` if the user has not enabled sync for `target`
    /// - `MissingContent` if the document has no content
    /// - `InvalidFormat` if the content does not decode
    /// - provider failures, passed through
    #[instrument(skip(self, record), fields(name = %record.display_name, target = %target))]
    pub async fn sync_to_cloud(
        &self,
        record: &DocumentRecord,
        target: ProviderKind,
    ) -> Result<UploadedFile> {
        let _syncing = self.loading.begin(LoadingFlag::Syncing);
        let mut tracker = PhaseTracker::new(SyncOperation::SyncToCloud, self.event_bus.clone());

        match self.upload_and_refresh(record, target, &mut tracker).await {
            Ok(uploaded) => {
                info!("Uploaded {} to {}", uploaded.name, target);
                self.notify(Notification::success(
                    "Success",
                    format!("Uploaded {} to {}", uploaded.name, target),
                ));
                Ok(uploaded)
            }
            Err(err) => {
                tracker.fail();
                error!("Upload of {} to {} failed: {}", record.display_name, target, err);
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    async fn upload_and_refresh(
        &self,
        record: &DocumentRecord,
        target: ProviderKind,
        tracker: &mut PhaseTracker,
    ) -> Result<UploadedFile> {
        tracker.advance(SyncPhase::FetchingSource)?;
        let flags = self.sync_flags().await;
        let enabled = match target {
            ProviderKind::Dropbox => flags.dropbox_sync,
            ProviderKind::GoogleDrive => flags.drive_sync,
        };
        if !enabled {
            return Err(SyncError::SyncDisabled { provider: target });
        }
        let record = self.with_content(record).await?;

        tracker.advance(SyncPhase::Transforming)?;
        let file_name = sanitize_file_name(&record.display_name);
        let blob = record
            .to_blob()
            .map_err(|err| SyncError::from_content(&record.display_name, err))?;
        debug!("Prepared {} ({} bytes, {})", file_name, blob.len(), blob.content_type);

        tracker.advance(SyncPhase::PersistingTarget)?;
        let uploaded = match target {
            ProviderKind::Dropbox => {
                self.dropbox_connector()?
                    .upload_file(blob, &format!("/{}", file_name))
                    .await
            }
            ProviderKind::GoogleDrive => self.drive_connector()?.upload_file(blob, &file_name).await,
        }
        .map_err(|err| SyncError::from_provider(target, err))?;

        tracker.advance(SyncPhase::RefreshingView)?;
        // The upload stands even if the re-list fails
        let _ = self.reload_source(source_for(target), false).await;
        tracker.advance(SyncPhase::Idle)?;

        Ok(uploaded)
    }

    /// The record with content attached, reading it from the backend when
    /// the listing did not carry it.
    async fn with_content(&self, record: &DocumentRecord) -> Result<DocumentRecord> {
        if record.content.as_ref().is_some_and(|content| !content.is_empty()) {
            return Ok(record.clone());
        }

        let missing = || SyncError::MissingContent {
            name: record.display_name.clone(),
        };
        let id = record.local_id().ok_or_else(missing)?;
        let stored = self
            .backend
            .get_document(id)
            .await
            .map_err(SyncError::from_backend)?;
        if stored.document.trim().is_empty() {
            return Err(missing());
        }

        let mut record = record.clone();
        record.content = Some(DocumentContent::Encoded(stored.document));
        Ok(record)
    }

    // ========================================================================
    // Batch
    // ========================================================================

    /// Download each selected cloud document in turn.
    ///
    /// Items already present locally are skipped. A failing item is counted
    /// and the batch moves on. The local listing is refreshed once at the
    /// end if anything was persisted.
    #[instrument(skip(self, selection), fields(items = selection.len()))]
    pub async fn batch_sync(&self, selection: &[DocumentRecord]) -> BatchReport {
        let _syncing = self.loading.begin(LoadingFlag::Syncing);
        let local_records = self.view.read().await.local_records();
        let mut report = BatchReport::default();

        for record in selection {
            if self.already_synced_in(record, &local_records) {
                debug!("Skipping {}: already synced", record.display_name);
                report.skipped += 1;
                continue;
            }

            let mut tracker = PhaseTracker::new(SyncOperation::BatchSync, self.event_bus.clone());
            let outcome = match self.import_to_local(record, &mut tracker).await {
                Ok(name) => tracker.advance(SyncPhase::Idle).map(|_| name),
                Err(err) => Err(err),
            };

            match outcome {
                Ok(name) => {
                    debug!("Batch item {} synced", name);
                    report.succeeded += 1;
                }
                Err(err) => {
                    tracker.fail();
                    warn!("Batch item {} failed: {}", record.display_name, err);
                    report.failed += 1;
                    report.failures.push(BatchFailure {
                        name: record.display_name.clone(),
                        message: err.user_message(),
                    });
                }
            }
        }

        if report.succeeded > 0 {
            let _ = self.reload_source(SourceTag::Local, false).await;
        }

        info!(
            "Batch sync finished: {} succeeded, {} failed, {} skipped",
            report.succeeded, report.failed, report.skipped
        );
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::BatchCompleted {
                succeeded: report.succeeded,
                failed: report.failed,
                skipped: report.skipped,
            }))
            .ok();
        self.notify(batch_notification(&report));

        report
    }

    // ========================================================================
    // Settings and folders
    // ========================================================================

    /// Flip the backend's sync flag for `provider` and re-read the flags.
    #[instrument(skip(self), fields(provider = %provider))]
    pub async fn toggle_sync(&self, provider: ProviderKind) -> Result<SyncFlags> {
        match self.toggle_and_reload(provider).await {
            Ok(flags) => {
                let enabled = match provider {
                    ProviderKind::Dropbox => flags.dropbox_sync,
                    ProviderKind::GoogleDrive => flags.drive_sync,
                };
                info!("{} sync is now {}", provider, if enabled { "on" } else { "off" });
                self.notify(if enabled {
                    Notification::success("Success", format!("{} sync enabled", provider))
                } else {
                    Notification::info("Info", format!("{} sync disabled", provider))
                });
                Ok(flags)
            }
            Err(err) => {
                error!("Failed to toggle {} sync: {}", provider, err);
                self.notify(Notification::error("Error", "Failed to update sync settings"));
                Err(err)
            }
        }
    }

    async fn toggle_and_reload(&self, provider: ProviderKind) -> Result<SyncFlags> {
        match provider {
            ProviderKind::Dropbox => self.backend.toggle_dropbox_sync(self.user_id).await,
            ProviderKind::GoogleDrive => self.backend.toggle_drive_sync(self.user_id).await,
        }
        .map_err(SyncError::from_backend)?;

        let profile = self.fetch_local().await?;
        let flags = SyncFlags::from(&profile);
        let documents = {
            let mut view = self.view.write().await;
            view.set_profile(profile);
            view.rebuild()
        };
        self.emit_view_refreshed(documents);
        Ok(flags)
    }

    /// Folders of one source, tagged with that source.
    #[instrument(skip(self), fields(source = %source))]
    pub async fn folders(&self, source: FolderSource) -> Result<Vec<FolderRecord>> {
        let result = match source {
            FolderSource::Local => self
                .backend
                .list_folders()
                .await
                .map(|folders| folders.into_iter().map(FolderRecord::from).collect())
                .map_err(SyncError::from_backend),
            FolderSource::Dropbox => match self.dropbox_connector() {
                Ok(dropbox) => dropbox
                    .list_folders()
                    .await
                    .map(|folders| folders.into_iter().map(FolderRecord::from).collect())
                    .map_err(|err| SyncError::from_provider(ProviderKind::Dropbox, err)),
                Err(err) => Err(err),
            },
            FolderSource::GoogleDrive => match self.drive_connector() {
                Ok(drive) => drive
                    .list_folders()
                    .await
                    .map(|folders| folders.into_iter().map(FolderRecord::from).collect())
                    .map_err(|err| SyncError::from_provider(ProviderKind::GoogleDrive, err)),
                Err(err) => Err(err),
            },
        };

        if let Err(err) = &result {
            warn!("Failed to list {} folders: {}", source, err);
            self.notify_failure(err);
        }
        result
    }

    /// Documents inside `folder`, sorted by name.
    #[instrument(skip(self, folder), fields(folder = %folder.name, source = %folder.source))]
    pub async fn folder_documents(&self, folder: &FolderRecord) -> Result<Vec<DocumentRecord>> {
        let result = match folder.source {
            FolderSource::Local => match folder.id.parse::<i64>() {
                Ok(folder_id) => {
                    let records: Vec<SourceRecord> = self
                        .view
                        .read()
                        .await
                        .local_listing()
                        .iter()
                        .filter(|doc| doc.folder_id == Some(folder_id))
                        .cloned()
                        .map(SourceRecord::Local)
                        .collect();
                    Ok(records)
                }
                Err(_) => Err(SyncError::NotFound(format!("folder {}", folder.id))),
            },
            FolderSource::Dropbox => {
                let path = folder
                    .path
                    .clone()
                    .unwrap_or_else(|| format!("/{}", folder.name));
                match self.dropbox_connector() {
                    Ok(dropbox) => dropbox
                        .get_folder_content(&path)
                        .await
                        .map(|files| files.into_iter().map(SourceRecord::Dropbox).collect())
                        .map_err(|err| SyncError::from_provider(ProviderKind::Dropbox, err)),
                    Err(err) => Err(err),
                }
            }
            FolderSource::GoogleDrive => match self.drive_connector() {
                Ok(drive) => drive
                    .list_files_in_folder(&folder.id)
                    .await
                    .map(|files| files.into_iter().map(SourceRecord::Drive).collect())
                    .map_err(|err| SyncError::from_provider(ProviderKind::GoogleDrive, err)),
                Err(err) => Err(err),
            },
        };

        match result {
            Ok(records) => Ok(merge_records(records, EnabledSources::all())),
            Err(err) => {
                warn!("Failed to open folder {}: {}", folder.name, err);
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn dropbox_connector(&self) -> Result<&Arc<dyn DropboxStorage>> {
        self.dropbox.as_ref().ok_or(SyncError::NotConfigured {
            provider: ProviderKind::Dropbox,
        })
    }

    fn drive_connector(&self) -> Result<&Arc<dyn DriveStorage>> {
        self.drive.as_ref().ok_or(SyncError::NotConfigured {
            provider: ProviderKind::GoogleDrive,
        })
    }

    fn notify(&self, notification: Notification) {
        self.event_bus
            .emit(CoreEvent::Notification(notification))
            .ok();
    }

    fn notify_failure(&self, err: &SyncError) {
        let severity = err.severity();
        let summary = match severity {
            NotificationSeverity::Warn => "Warning",
            _ => "Error",
        };
        self.notify(Notification::new(severity, summary, err.user_message()));
    }

    fn emit_view_refreshed(&self, documents: usize) {
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::ViewRefreshed {
                documents: documents as u64,
            }))
            .ok();
    }
}

fn source_for(provider: ProviderKind) -> SourceTag {
    match provider {
        ProviderKind::Dropbox => SourceTag::Dropbox,
        ProviderKind::GoogleDrive => SourceTag::Drive,
    }
}

fn source_label(source: SourceTag) -> &'static str {
    match source {
        SourceTag::Local => "local",
        SourceTag::Dropbox => "Dropbox",
        SourceTag::Drive => "Google Drive",
    }
}

fn batch_notification(report: &BatchReport) -> Notification {
    let skipped = match report.skipped {
        0 => String::new(),
        n => format!(", {} already synced", n),
    };

    if report.total() == 0 {
        Notification::info("Info", "No documents selected")
    } else if report.failed == 0 {
        Notification::success(
            "Success",
            format!("Synced {} documents{}", report.succeeded, skipped),
        )
    } else if report.succeeded == 0 {
        Notification::error(
            "Error",
            format!("Failed to sync {} documents{}", report.failed, skipped),
        )
    } else {
        Notification::warn(
            "Warning",
            format!(
                "Synced {} of {} documents, {} failed{}",
                report.succeeded,
                report.succeeded + report.failed,
                report.failed,
                skipped
            ),
        )
    }
}
