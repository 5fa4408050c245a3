//! Typed failures of the differential core.
//!
//! Most APIs return anyhow::Result; these variants are inserted into the
//! chain where the kind matters, so callers can downcast:
//!
//!   match err.downcast_ref::<DiffError>() {
//!       Some(DiffError::BlockUnresolved { .. }) => ...,
//!       _ => ...,
//!   }

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    /// The manifest stream ended (or stopped growing) mid-header or
    /// mid-record after the bounded retry window.
    #[error("manifest truncated: {0}")]
    ManifestTruncated(String),

    /// No blob exists for the block at any candidate generation; never
    /// substituted with zero bytes.
    #[error("block {block} unresolved: no blob at any of {candidates} candidate generation(s)")]
    BlockUnresolved { block: u64, candidates: u32 },

    /// A resolved blob failed to decompress, or decompressed to the
    /// wrong length.
    #[error("block {block} corrupt: {reason}")]
    BlockCorrupt { block: u64, reason: String },

    /// The text header is malformed (missing required keys, bad numbers,
    /// oversized).
    #[error("bad manifest header: {0}")]
    BadHeader(String),

    /// The header carries a version this build does not understand.
    #[error("unsupported manifest version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}
