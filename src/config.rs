//! Centralized configuration for diffstore.
//!
//! Goals:
//! - Single place for tunables instead of scattered env lookups.
//! - DiffConfig::from_env() reads DS_* variables; fluent with_* setters
//!   override individual fields.
//!
//! Env:
//!   DS_BLOCK_SIZE          default block size in bytes for new backups
//!   DS_GZIP_LEVEL          blob compression level 0..=9
//!   DS_MANIFEST_RETRY_MAX  attempts to wait for an incomplete record
//!   DS_MANIFEST_RETRY_MS   delay between attempts, milliseconds

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::consts::{
    DEFAULT_BLOCK_SIZE, MANIFEST_RETRY_DELAY_MS, MANIFEST_RETRY_MAX, MAX_BLOCK_SIZE,
};
use crate::manifest::RetryPolicy;

/// Block size must be positive and sane; the final block of a stream may
/// be shorter, but the configured size is fixed for a whole manifest.
pub fn validate_block_size(block_size: u32) -> Result<()> {
    if block_size == 0 || block_size > MAX_BLOCK_SIZE {
        return Err(anyhow!(
            "block size must be in [1 .. {}], got {}",
            MAX_BLOCK_SIZE,
            block_size
        ));
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct DiffConfig {
    /// Default block size for new backups (bytes).
    /// Env: DS_BLOCK_SIZE (default 1 MiB)
    pub block_size: u32,

    /// Gzip level for fresh blob storage, 0..=9.
    /// Env: DS_GZIP_LEVEL (default 6)
    pub gzip_level: u32,

    /// Bounded wait for a manifest still being produced.
    /// Env: DS_MANIFEST_RETRY_MAX (default 300)
    pub manifest_retry_max: u32,

    /// Env: DS_MANIFEST_RETRY_MS (default 100)
    pub manifest_retry_ms: u64,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            gzip_level: 6,
            manifest_retry_max: MANIFEST_RETRY_MAX,
            manifest_retry_ms: MANIFEST_RETRY_DELAY_MS,
        }
    }
}

impl DiffConfig {
    /// Load configuration from environment variables; unset or unparsable
    /// values keep their defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("DS_BLOCK_SIZE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.block_size = n;
            }
        }
        if let Ok(v) = std::env::var("DS_GZIP_LEVEL") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.gzip_level = n.min(9);
            }
        }
        if let Ok(v) = std::env::var("DS_MANIFEST_RETRY_MAX") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.manifest_retry_max = n;
            }
        }
        if let Ok(v) = std::env::var("DS_MANIFEST_RETRY_MS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.manifest_retry_ms = n;
            }
        }

        cfg
    }

    pub fn with_block_size(mut self, bytes: u32) -> Self {
        self.block_size = bytes;
        self
    }

    pub fn with_gzip_level(mut self, level: u32) -> Self {
        self.gzip_level = level.min(9);
        self
    }

    pub fn with_manifest_retry(mut self, max_attempts: u32, delay_ms: u64) -> Self {
        self.manifest_retry_max = max_attempts;
        self.manifest_retry_ms = delay_ms;
        self
    }

    /// Retry policy for manifest readers derived from this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.manifest_retry_max,
            delay: Duration::from_millis(self.manifest_retry_ms),
        }
    }
}

impl fmt::Display for DiffConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DiffConfig {{ block_size: {}, gzip_level: {}, manifest_retry: {}x{}ms }}",
            self.block_size, self.gzip_level, self.manifest_retry_max, self.manifest_retry_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_setters() {
        let cfg = DiffConfig::default();
        assert_eq!(cfg.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(cfg.gzip_level, 6);

        let cfg = cfg
            .with_block_size(4096)
            .with_gzip_level(42)
            .with_manifest_retry(5, 10);
        assert_eq!(cfg.block_size, 4096);
        assert_eq!(cfg.gzip_level, 9); // clamped
        assert_eq!(cfg.retry_policy().max_attempts, 5);
    }

    #[test]
    fn block_size_validation() {
        assert!(validate_block_size(1).is_ok());
        assert!(validate_block_size(4096).is_ok());
        assert!(validate_block_size(0).is_err());
        assert!(validate_block_size(u32::MAX).is_err());
    }
}
