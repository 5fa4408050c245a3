use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use diffstore::store::{LocalStore, ObjectStore, StoreRegistry};

/// Resolve a store URL of the form "<scheme>://<path>". A bare path is
/// shorthand for "local://<path>". Only the named scheme's backend is
/// constructed, so an unknown scheme never touches the filesystem.
pub fn open_store(url: &str) -> Result<Arc<dyn ObjectStore>> {
    let (scheme, path) = url.split_once("://").unwrap_or(("local", url));
    let mut reg = StoreRegistry::new();
    if scheme == "local" {
        reg.register("local", Arc::new(LocalStore::open_or_create(Path::new(path))?));
    }
    reg.get(scheme)
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}
