//! In-memory backend: a mutex-guarded map of (container, key) -> bytes.
//! Cheap clones share the same map; used by tests and in-process
//! pipelines.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};

use super::ObjectStore;

type Objects = BTreeMap<(String, String), Vec<u8>>;

// Poison only means some thread panicked while holding the guard; every
// mutation here is a single map call, so the map is always consistent
// and the lock can be recovered instead of propagating the panic.
fn lock(objects: &Mutex<Objects>) -> MutexGuard<'_, Objects> {
    objects.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<Objects>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace an object's bytes directly. Test hook for corruption and
    /// pruning scenarios; production code writes through write_stream.
    pub fn put(&self, container: &str, key: &str, bytes: Vec<u8>) {
        lock(&self.objects).insert((container.to_string(), key.to_string()), bytes);
    }

    /// Remove an object if present. Test hook for pruning scenarios.
    pub fn remove(&self, container: &str, key: &str) -> bool {
        lock(&self.objects)
            .remove(&(container.to_string(), key.to_string()))
            .is_some()
    }
}

impl ObjectStore for MemoryStore {
    fn exists(&self, container: &str, key: &str) -> Result<bool> {
        Ok(lock(&self.objects).contains_key(&(container.to_string(), key.to_string())))
    }

    fn read_stream(&self, container: &str, key: &str) -> Result<Box<dyn Read + Send>> {
        let map = lock(&self.objects);
        let bytes = map
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("no such object: {container}/{key}"))?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn write_stream(&self, container: &str, key: &str) -> Result<Box<dyn Write + Send>> {
        Ok(Box::new(MemWriter {
            buf: Vec::new(),
            dest: Arc::clone(&self.objects),
            container: container.to_string(),
            key: key.to_string(),
        }))
    }

    fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>> {
        Ok(lock(&self.objects)
            .keys()
            .filter(|(c, k)| c == container && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }
}

/// Buffers writes and commits the object on drop, mirroring the atomic
/// publish of the filesystem backend.
struct MemWriter {
    buf: Vec<u8>,
    dest: Arc<Mutex<Objects>>,
    container: String,
    key: String,
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MemWriter {
    fn drop(&mut self) {
        lock(&self.dest).insert(
            (std::mem::take(&mut self.container), std::mem::take(&mut self.key)),
            std::mem::take(&mut self.buf),
        );
    }
}
