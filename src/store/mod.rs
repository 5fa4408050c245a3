//! store — the object-storage boundary the differential core talks to.
//!
//! Containers hold flat, key-addressed objects; keys use '/' as a path
//! convention (blob keys look like `<snapshot>/<upper>/<lower>`) but the
//! store has no directory semantics beyond that. The core only ever
//! needs the four capabilities below; concrete backends live behind the
//! trait and are handed in by the caller via StoreRegistry — never
//! discovered through ambient global state.
//!
//! Objects are written once and immutable afterwards; writers finalize
//! (publish) on drop.

use std::io::{Read, Write};

use anyhow::Result;

mod local;
mod memory;
mod registry;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use registry::StoreRegistry;

/// Narrow capability interface over named containers of named objects.
pub trait ObjectStore: Send + Sync {
    /// Whether the object exists.
    fn exists(&self, container: &str, key: &str) -> Result<bool>;

    /// Open the object's content for sequential reading.
    fn read_stream(&self, container: &str, key: &str) -> Result<Box<dyn Read + Send>>;

    /// Open a writer for the object's content. The object becomes visible
    /// atomically when the writer is dropped (after a flush).
    fn write_stream(&self, container: &str, key: &str) -> Result<Box<dyn Write + Send>>;

    /// Keys in the container starting with `prefix`, sorted. Pass "" for
    /// all keys.
    fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>>;
}
