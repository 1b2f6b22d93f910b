//! # Sync Phase State Machine
//!
//! Tracks the phase of one sync operation with validated transitions.
//!
//! ## State Machine
//!
//! ```text
//! Idle → FetchingSource → Transforming → PersistingTarget → RefreshingView → Idle
//!             ↓                ↓                ↓                  ↓
//!             └──────────────→ Failed ─────────────────────────→ Idle
//! ```
//!
//! A batch item goes from `PersistingTarget` straight back to `Idle`; the
//! batch refreshes the view once at the end.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::job::{PhaseTracker, SyncOperation, SyncPhase};
//!
//! let mut tracker = PhaseTracker::new(SyncOperation::DownloadToLocal, events.clone());
//! tracker.advance(SyncPhase::FetchingSource)?;
//! // ...
//! tracker.fail();
//! assert_eq!(tracker.phase(), SyncPhase::Idle);
//! ```

use crate::{Result, SyncError};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// Phase Types
// ============================================================================

/// Phase of a sync operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPhase {
    Idle,
    /// Reading content from the source store
    FetchingSource,
    /// Decoding, classifying and naming the content
    Transforming,
    /// Writing to the target store
    PersistingTarget,
    /// Re-listing and re-merging
    RefreshingView,
    /// The attempt was reported as failed
    Failed,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::FetchingSource => "fetching-source",
            SyncPhase::Transforming => "transforming",
            SyncPhase::PersistingTarget => "persisting-target",
            SyncPhase::RefreshingView => "refreshing-view",
            SyncPhase::Failed => "failed",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, SyncPhase::Idle | SyncPhase::Failed)
    }

    fn can_transition_to(self, to: SyncPhase) -> bool {
        match (self, to) {
            (SyncPhase::Idle, SyncPhase::FetchingSource) => true,
            (SyncPhase::FetchingSource, SyncPhase::Transforming) => true,
            (SyncPhase::Transforming, SyncPhase::PersistingTarget) => true,
            (SyncPhase::PersistingTarget, SyncPhase::RefreshingView) => true,
            (SyncPhase::PersistingTarget, SyncPhase::Idle) => true,
            (SyncPhase::RefreshingView, SyncPhase::Idle) => true,

            // Any in-flight phase may fail
            (from, SyncPhase::Failed) => from.is_active(),
            (SyncPhase::Failed, SyncPhase::Idle) => true,

            _ => false,
        }
    }
}

impl FromStr for SyncPhase {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "idle" => Ok(SyncPhase::Idle),
            "fetching-source" => Ok(SyncPhase::FetchingSource),
            "transforming" => Ok(SyncPhase::Transforming),
            "persisting-target" => Ok(SyncPhase::PersistingTarget),
            "refreshing-view" => Ok(SyncPhase::RefreshingView),
            "failed" => Ok(SyncPhase::Failed),
            _ => Err(SyncError::InvalidStateTransition {
                from: s.to_string(),
                to: s.to_string(),
                reason: format!("Unknown sync phase: {}", s),
            }),
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The workflow a tracker belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    DownloadToLocal,
    SyncToCloud,
    BatchSync,
}

impl SyncOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::DownloadToLocal => "download_to_local",
            SyncOperation::SyncToCloud => "sync_to_cloud",
            SyncOperation::BatchSync => "batch_sync",
        }
    }
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Phase of one operation attempt, published as `SyncEvent::PhaseChanged`.
pub struct PhaseTracker {
    operation: SyncOperation,
    phase: SyncPhase,
    event_bus: EventBus,
}

impl PhaseTracker {
    pub fn new(operation: SyncOperation, event_bus: EventBus) -> Self {
        Self {
            operation,
            phase: SyncPhase::Idle,
            event_bus,
        }
    }

    pub fn operation(&self) -> SyncOperation {
        self.operation
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Move to `to`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if `to` does not follow the current
    /// phase.
    pub fn advance(&mut self, to: SyncPhase) -> Result<()> {
        if !self.phase.can_transition_to(to) {
            return Err(SyncError::InvalidStateTransition {
                from: self.phase.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!(
                    "Cannot transition from {} to {}",
                    self.phase.as_str(),
                    to.as_str()
                ),
            });
        }

        self.set(to);
        Ok(())
    }

    /// Report the attempt as failed and return to idle.
    ///
    /// Does nothing when no phase is in flight.
    pub fn fail(&mut self) {
        if self.phase.is_active() {
            self.set(SyncPhase::Failed);
        }
        if self.phase == SyncPhase::Failed {
            self.set(SyncPhase::Idle);
        }
    }

    fn set(&mut self, phase: SyncPhase) {
        debug!(
            operation = self.operation.as_str(),
            from = self.phase.as_str(),
            to = phase.as_str(),
            "Sync phase changed"
        );
        self.phase = phase;
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::PhaseChanged {
                operation: self.operation.as_str().to_string(),
                phase: phase.as_str().to_string(),
            }))
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> PhaseTracker {
        PhaseTracker::new(SyncOperation::DownloadToLocal, EventBus::new(16))
    }

    #[test]
    fn test_full_cycle() {
        let mut tracker = tracker();
        tracker.advance(SyncPhase::FetchingSource).unwrap();
        tracker.advance(SyncPhase::Transforming).unwrap();
        tracker.advance(SyncPhase::PersistingTarget).unwrap();
        tracker.advance(SyncPhase::RefreshingView).unwrap();
        tracker.advance(SyncPhase::Idle).unwrap();
        assert_eq!(tracker.phase(), SyncPhase::Idle);
    }

    #[test]
    fn test_skipping_a_phase_is_rejected() {
        let mut tracker = tracker();
        tracker.advance(SyncPhase::FetchingSource).unwrap();

        let err = tracker.advance(SyncPhase::PersistingTarget).unwrap_err();
        match err {
            SyncError::InvalidStateTransition { from, to, .. } => {
                assert_eq!(from, "fetching-source");
                assert_eq!(to, "persisting-target");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(tracker.phase(), SyncPhase::FetchingSource);
    }

    #[test]
    fn test_fail_returns_to_idle() {
        let mut tracker = tracker();
        tracker.advance(SyncPhase::FetchingSource).unwrap();
        tracker.advance(SyncPhase::Transforming).unwrap();
        tracker.fail();
        assert_eq!(tracker.phase(), SyncPhase::Idle);

        // A fresh attempt can start again
        tracker.advance(SyncPhase::FetchingSource).unwrap();
    }

    #[test]
    fn test_idle_cannot_fail() {
        assert!(!SyncPhase::Idle.can_transition_to(SyncPhase::Failed));
        assert!(!SyncPhase::Failed.can_transition_to(SyncPhase::Failed));
        assert!(!SyncPhase::Idle.can_transition_to(SyncPhase::Transforming));
    }

    #[tokio::test]
    async fn test_phase_changes_are_published() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let mut tracker = PhaseTracker::new(SyncOperation::SyncToCloud, bus);

        tracker.advance(SyncPhase::FetchingSource).unwrap();
        tracker.fail();

        let mut phases = Vec::new();
        while let Ok(CoreEvent::Sync(SyncEvent::PhaseChanged { operation, phase })) =
            rx.try_recv()
        {
            assert_eq!(operation, "sync_to_cloud");
            phases.push(phase);
        }
        assert_eq!(phases, vec!["fetching-source", "failed", "idle"]);
    }

    #[test]
    fn test_phase_round_trip_strings() {
        for phase in [
            SyncPhase::Idle,
            SyncPhase::FetchingSource,
            SyncPhase::Transforming,
            SyncPhase::PersistingTarget,
            SyncPhase::RefreshingView,
            SyncPhase::Failed,
        ] {
            assert_eq!(phase.as_str().parse::<SyncPhase>().unwrap(), phase);
        }
        assert!("paused".parse::<SyncPhase>().is_err());
    }
}
