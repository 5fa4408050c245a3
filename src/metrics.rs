//! Lightweight global metrics for diffstore.
//!
//! Thread-safe atomic counters for the two pipelines:
//! - scan (backup write path)
//! - restore (reconstruction read path)

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Scan -----
static SCAN_BLOCKS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SCAN_BLOCKS_FRESH: AtomicU64 = AtomicU64::new(0);
static SCAN_BLOCKS_REUSED: AtomicU64 = AtomicU64::new(0);
static SCAN_BLOCKS_ZERO: AtomicU64 = AtomicU64::new(0);
static SCAN_BYTES_READ: AtomicU64 = AtomicU64::new(0);

// ----- Blob store -----
static BLOBS_STORED: AtomicU64 = AtomicU64::new(0);
static BLOB_BYTES_STORED: AtomicU64 = AtomicU64::new(0);
static BLOB_FETCHES: AtomicU64 = AtomicU64::new(0);
static FALLBACK_PROBES: AtomicU64 = AtomicU64::new(0);

// ----- Restore -----
static RESTORE_BLOCKS_TOTAL: AtomicU64 = AtomicU64::new(0);
static RESTORE_BLOCKS_ZERO: AtomicU64 = AtomicU64::new(0);
static RESTORE_BYTES_OUT: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub scan_blocks_total: u64,
    pub scan_blocks_fresh: u64,
    pub scan_blocks_reused: u64,
    pub scan_blocks_zero: u64,
    pub scan_bytes_read: u64,

    pub blobs_stored: u64,
    pub blob_bytes_stored: u64,
    pub blob_fetches: u64,
    pub fallback_probes: u64,

    pub restore_blocks_total: u64,
    pub restore_blocks_zero: u64,
    pub restore_bytes_out: u64,
}

impl MetricsSnapshot {
    /// Share of scanned blocks that did not need fresh storage
    /// (reused + zero-filled).
    pub fn dedup_ratio(&self) -> f64 {
        if self.scan_blocks_total == 0 {
            0.0
        } else {
            (self.scan_blocks_reused + self.scan_blocks_zero) as f64
                / self.scan_blocks_total as f64
        }
    }
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        scan_blocks_total: SCAN_BLOCKS_TOTAL.load(Ordering::Relaxed),
        scan_blocks_fresh: SCAN_BLOCKS_FRESH.load(Ordering::Relaxed),
        scan_blocks_reused: SCAN_BLOCKS_REUSED.load(Ordering::Relaxed),
        scan_blocks_zero: SCAN_BLOCKS_ZERO.load(Ordering::Relaxed),
        scan_bytes_read: SCAN_BYTES_READ.load(Ordering::Relaxed),
        blobs_stored: BLOBS_STORED.load(Ordering::Relaxed),
        blob_bytes_stored: BLOB_BYTES_STORED.load(Ordering::Relaxed),
        blob_fetches: BLOB_FETCHES.load(Ordering::Relaxed),
        fallback_probes: FALLBACK_PROBES.load(Ordering::Relaxed),
        restore_blocks_total: RESTORE_BLOCKS_TOTAL.load(Ordering::Relaxed),
        restore_blocks_zero: RESTORE_BLOCKS_ZERO.load(Ordering::Relaxed),
        restore_bytes_out: RESTORE_BYTES_OUT.load(Ordering::Relaxed),
    }
}

// ----- Recorders (scan) -----
pub fn record_scan_block(bytes: usize, fresh: bool, zero: bool) {
    SCAN_BLOCKS_TOTAL.fetch_add(1, Ordering::Relaxed);
    SCAN_BYTES_READ.fetch_add(bytes as u64, Ordering::Relaxed);
    if zero {
        SCAN_BLOCKS_ZERO.fetch_add(1, Ordering::Relaxed);
    } else if fresh {
        SCAN_BLOCKS_FRESH.fetch_add(1, Ordering::Relaxed);
    } else {
        SCAN_BLOCKS_REUSED.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Recorders (blob store) -----
pub fn record_blob_stored(compressed_len: usize) {
    BLOBS_STORED.fetch_add(1, Ordering::Relaxed);
    BLOB_BYTES_STORED.fetch_add(compressed_len as u64, Ordering::Relaxed);
}

pub fn record_blob_fetch() {
    BLOB_FETCHES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_fallback_probe() {
    FALLBACK_PROBES.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (restore) -----
pub fn record_restore_block(zero: bool) {
    RESTORE_BLOCKS_TOTAL.fetch_add(1, Ordering::Relaxed);
    if zero {
        RESTORE_BLOCKS_ZERO.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_restore_bytes(n: usize) {
    RESTORE_BYTES_OUT.fetch_add(n as u64, Ordering::Relaxed);
}
