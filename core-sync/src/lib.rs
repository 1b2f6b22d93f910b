//! # Sync Module
//!
//! Reconciles the local document store with Dropbox and Google Drive.
//!
//! ## Overview
//!
//! This module provides:
//! - The merge engine building one view out of three listings
//! - A phase state machine for each sync attempt
//! - The orchestrator running downloads, uploads and batches with
//!   per-item failure isolation
//!
//! ## Components
//!
//! - **Merge Engine** (`merge`): Key-based de-duplication with provenance tags
//! - **Sync Phases** (`job`): Validated phase transitions, published as events
//! - **Document View** (`view`): Listings, merged records and loading flags
//! - **Sync Orchestrator** (`orchestrator`): Download, upload and batch workflows

pub mod config;
pub mod error;
pub mod job;
pub mod merge;
pub mod orchestrator;
pub mod view;

pub use config::{SyncConfig, DEFAULT_ALREADY_SYNCED_TOLERANCE};
pub use error::{Result, SyncError};
pub use job::{PhaseTracker, SyncOperation, SyncPhase};
pub use merge::{already_synced, merge, merge_records, EnabledSources};
pub use orchestrator::{BatchFailure, BatchReport, RefreshReport, SyncOrchestrator};
pub use view::{DocumentView, LoadingFlag, LoadingFlags, LoadingSnapshot, SyncFlags};
