//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the document sync core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus and user-facing notifications
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! its configuration types and the channel it reports progress on.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
