//! # Event Bus System
//!
//! Typed event broadcasting for the document sync core using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The UI layer never polls the core. Everything it renders besides the merged
//! document list arrives here:
//! - **Notifications**: exactly one per sync attempt, with severity, summary and detail
//! - **Sync events**: phase changes, listing progress, per-source listing failures
//! - **Auth events**: session state transitions per provider
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Auth Session ├──────────────>│           │
//! └──────────────┘               │ EventBus  │     subscribe    ┌────────────┐
//! ┌──────────────┐     emit      │ (broadcast├─────────────────>│ UI / Host  │
//! │ Orchestrator ├──────────────>│  channel) │                  └────────────┘
//! └──────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, Notification};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Notification(Notification::success(
//!         "Synced",
//!         "Report.pdf uploaded to Dropbox",
//!     )))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Notification(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep receiving.
//! - **`RecvError::Closed`**: all senders were dropped, treat as shutdown.
//!
//! Emitting with no subscribers is not an error for the core: callers ignore
//! the `SendError`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// Sync and listing events
    Sync(SyncEvent),
    /// User-facing notification
    Notification(Notification),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Notification(n) => &n.summary,
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Notification(n) => n.severity.into(),
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::SessionExpired { .. }) => EventSeverity::Warning,
            CoreEvent::Sync(SyncEvent::ListingFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Sync(SyncEvent::BatchCompleted { failed, .. }) if *failed > 0 => {
                EventSeverity::Warning
            }
            CoreEvent::Sync(SyncEvent::BatchCompleted { .. })
            | CoreEvent::Sync(SyncEvent::ViewRefreshed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Notifications
// ============================================================================

/// Severity shown on a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Success,
    Info,
    Warn,
    Error,
}

impl From<NotificationSeverity> for EventSeverity {
    fn from(severity: NotificationSeverity) -> Self {
        match severity {
            NotificationSeverity::Success | NotificationSeverity::Info => EventSeverity::Info,
            NotificationSeverity::Warn => EventSeverity::Warning,
            NotificationSeverity::Error => EventSeverity::Error,
        }
    }
}

/// A toast-style message for the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub severity: NotificationSeverity,
    pub summary: String,
    pub detail: String,
}

impl Notification {
    pub fn new(
        severity: NotificationSeverity,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn success(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationSeverity::Success, summary, detail)
    }

    pub fn info(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationSeverity::Info, summary, detail)
    }

    pub fn warn(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationSeverity::Warn, summary, detail)
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationSeverity::Error, summary, detail)
    }
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Provider session transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// A provider session moved to a new state.
    StateChanged {
        /// Provider identifier (e.g., "dropbox", "google_drive").
        provider: String,
        /// New state name.
        state: String,
    },
    /// The user signed out of a provider.
    SignedOut { provider: String },
    /// The provider rejected the stored token; the session was cleared.
    SessionExpired { provider: String },
    /// Authentication flow failed.
    AuthError { provider: String, message: String },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::StateChanged { .. } => "Provider session state changed",
            AuthEvent::SignedOut { .. } => "Signed out of provider",
            AuthEvent::SessionExpired { .. } => "Provider session expired",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Listing and sync workflow events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// A sync operation entered a new phase.
    PhaseChanged {
        /// Operation name (e.g., "download_to_local").
        operation: String,
        /// Phase name (e.g., "fetching-source").
        phase: String,
    },
    /// A page of a multi-page listing arrived.
    ListingProgress {
        source: String,
        fetched: u64,
        requests: u32,
    },
    /// One source failed to list; other sources are unaffected.
    ListingFailed { source: String, message: String },
    /// The merged document view was rebuilt.
    ViewRefreshed { documents: u64 },
    /// A batch sync finished.
    BatchCompleted {
        succeeded: u32,
        failed: u32,
        skipped: u32,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::PhaseChanged { .. } => "Sync phase changed",
            SyncEvent::ListingProgress { .. } => "Listing in progress",
            SyncEvent::ListingFailed { .. } => "Listing failed",
            SyncEvent::ViewRefreshed { .. } => "Document view refreshed",
            SyncEvent::BatchCompleted { .. } => "Batch sync completed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for core events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events not matching a predicate.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let notifications = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Notification(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns `None` if no matching event is currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> CoreEvent {
        CoreEvent::Notification(Notification::error("Download failed", "File not found"))
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_error() {
        let bus = EventBus::new(10);
        assert!(bus.emit(notification()).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.emit(notification()).unwrap(), 2);
        assert_eq!(first.recv().await.unwrap(), notification());
        assert_eq!(second.recv().await.unwrap(), notification());
    }

    #[tokio::test]
    async fn test_stream_filter_skips_other_events() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Notification(_)));

        bus.emit(CoreEvent::Sync(SyncEvent::ViewRefreshed { documents: 3 }))
            .unwrap();
        bus.emit(notification()).unwrap();

        assert_eq!(stream.recv().await.unwrap(), notification());
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut receiver = bus.subscribe();

        for documents in 0..5 {
            bus.emit(CoreEvent::Sync(SyncEvent::ViewRefreshed { documents }))
                .unwrap();
        }

        assert!(matches!(receiver.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(notification().severity(), EventSeverity::Error);
        assert_eq!(
            CoreEvent::Notification(Notification::success("Synced", "ok")).severity(),
            EventSeverity::Info
        );
        assert_eq!(
            CoreEvent::Sync(SyncEvent::BatchCompleted {
                succeeded: 4,
                failed: 1,
                skipped: 0
            })
            .severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            CoreEvent::Sync(SyncEvent::PhaseChanged {
                operation: "batch_sync".into(),
                phase: "idle".into()
            })
            .severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_event_description() {
        let event = CoreEvent::Auth(AuthEvent::SessionExpired {
            provider: "dropbox".into(),
        });
        assert_eq!(event.description(), "Provider session expired");
        assert_eq!(notification().description(), "Download failed");
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Notification(Notification::warn("Sync disabled", "Enable it"));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Notification");
        assert_eq!(json["payload"]["severity"], "warn");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
