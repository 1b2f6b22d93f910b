//! Orchestrator tuning

use core_library::codec::DEFAULT_CHUNK_SIZE;

/// Cloud documents whose size is within this many bytes of a local
/// document with the same normalized name count as already downloaded.
pub const DEFAULT_ALREADY_SYNCED_TOLERANCE: u64 = 1024;

/// Sync orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Size tolerance (exclusive) for the already-synced check
    pub already_synced_tolerance_bytes: u64,

    /// Bytes encoded per step when content is converted to base64
    pub encode_chunk_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            already_synced_tolerance_bytes: DEFAULT_ALREADY_SYNCED_TOLERANCE,
            encode_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
