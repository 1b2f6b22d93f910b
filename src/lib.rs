//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service` and the provider connectors).
//! Host applications can depend on `docsync-workspace` and enable the
//! documented features without needing to wire each crate individually.

#[cfg(any(feature = "desktop-shims", feature = "dropbox", feature = "google-drive"))]
pub use core_service::*;
