//! Wire-format constants for the differential manifest (v1).
//!
//! The record layout and the zero-digest sentinel are part of the on-disk
//! format; changing any of them requires a version bump.

/// Manifest text-header `version:` value this crate reads and writes.
pub const MANIFEST_VERSION: u32 = 1;

/// Fixed size of one binary block record (big-endian):
/// [block u64][size u32][generation u32][digest 28].
pub const BLOCK_RECORD_SIZE: usize = 44;

/// Width of the block digest (SHA3-224).
pub const DIGEST_LEN: usize = 28;

/// Reserved digest value meaning "block is entirely zero bytes, not stored".
pub const ZERO_DIGEST: [u8; DIGEST_LEN] = [0u8; DIGEST_LEN];

/// Record offsets within the 44-byte frame.
pub const REC_OFF_BLOCK: usize = 0;
pub const REC_OFF_SIZE: usize = 8;
pub const REC_OFF_GENERATION: usize = 12;
pub const REC_OFF_DIGEST: usize = 16;

/// Default block size for new backups (1 MiB). Overridable per call
/// and via DS_BLOCK_SIZE.
pub const DEFAULT_BLOCK_SIZE: u32 = 1 << 20;

/// Hard cap for block size (1 GiB). A manifest claiming more is rejected
/// rather than allocating an absurd block buffer.
pub const MAX_BLOCK_SIZE: u32 = 1 << 30;

/// Upper bound for the text header while parsing; anything larger is a
/// malformed stream, not a header still in flight.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Defaults for the incomplete-record wait (manifest produced concurrently
/// into a pipe/appended file): 300 x 100 ms = 30 s, then ManifestTruncated.
pub const MANIFEST_RETRY_MAX: u32 = 300;
pub const MANIFEST_RETRY_DELAY_MS: u64 = 100;
