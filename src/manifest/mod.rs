//! manifest — the per-snapshot description: text header + ordered
//! sequence of fixed-size binary block records.
//!
//! Layout on the wire:
//! - header.rs: UTF-8 `key:value` lines terminated by a blank line;
//! - record.rs: 44-byte big-endian block records, strictly increasing
//!   block index starting at 0, no gaps;
//! - reader.rs: streaming consumer, tolerant to a concurrently produced
//!   manifest (bounded retry on short reads).
//!
//! Manifests are written once at scan time and immutable afterwards.

mod header;
mod reader;
mod record;

pub use header::ManifestHeader;
pub use reader::{ManifestReader, RecordSource, RetryPolicy};
pub use record::BlockRecord;
