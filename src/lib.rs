//! diffstore — incremental, content-addressed block backup.
//!
//! A snapshot's byte stream is split into fixed-size blocks; each block
//! is digested and either stored fresh (gzip blob, deterministic path)
//! or recorded as a reference N generations back into the ancestor
//! chain. A manifest (text header + 44-byte binary records) describes
//! every snapshot; reconstruction streams the exact original bytes back
//! out of whichever ancestor owns each block.

// Base modules
pub mod consts;
pub mod config;
pub mod errors;
pub mod hash;
pub mod metrics;

// Formats and addressing
pub mod manifest; // src/manifest/{mod,header,record,reader}.rs
pub mod resolve;

// Pipelines
pub mod scan;
pub mod backup;
pub mod restore;

// Storage boundary
pub mod store; // src/store/{mod,local,memory,registry}.rs

// Convenient re-exports
pub use backup::{backup_stream, BackupSummary};
pub use config::DiffConfig;
pub use errors::DiffError;
pub use manifest::{BlockRecord, ManifestHeader, ManifestReader, RecordSource, RetryPolicy};
pub use restore::DifferentialReconstructor;
pub use scan::{DifferentialScanner, ScanBlock};
pub use store::{LocalStore, MemoryStore, ObjectStore, StoreRegistry};
