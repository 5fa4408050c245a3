//! Local filesystem backend.
//!
//! Objects are plain files under <root>/<container>/<key>; '/' segments
//! in keys become subdirectories. Writes go through tmp+rename so readers
//! never observe a half-written object.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::warn;

use super::ObjectStore;

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open or create a store rooted at `root`.
    pub fn open_or_create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root).with_context(|| format!("create {}", root.display()))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf> {
        for part in [container, key] {
            if part.is_empty() || part.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
                return Err(anyhow!("bad object address: {container:?}/{key:?}"));
            }
        }
        Ok(self.root.join(container).join(key))
    }
}

impl ObjectStore for LocalStore {
    fn exists(&self, container: &str, key: &str) -> Result<bool> {
        Ok(self.object_path(container, key)?.is_file())
    }

    fn read_stream(&self, container: &str, key: &str) -> Result<Box<dyn Read + Send>> {
        let path = self.object_path(container, key)?;
        let f = OpenOptions::new()
            .read(true)
            .open(&path)
            .with_context(|| format!("open object {}", path.display()))?;
        Ok(Box::new(f))
    }

    fn write_stream(&self, container: &str, key: &str) -> Result<Box<dyn Write + Send>> {
        let path = self.object_path(container, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let tmp = path.with_extension("tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .with_context(|| format!("open tmp object {}", tmp.display()))?;
        Ok(Box::new(LocalWriter {
            file: Some(file),
            tmp,
            path,
        }))
    }

    fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>> {
        let dir = self.root.join(container);
        let mut out = Vec::new();
        if dir.exists() {
            collect_keys(&dir, String::new(), &mut out)?;
        }
        out.retain(|k| k.starts_with(prefix));
        out.sort();
        Ok(out)
    }
}

fn collect_keys(dir: &Path, base: String, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let key = if base.is_empty() {
            name.clone()
        } else {
            format!("{base}/{name}")
        };
        let path = entry.path();
        if path.is_dir() {
            collect_keys(&path, key, out)?;
        } else if !name.ends_with(".tmp") {
            out.push(key);
        }
    }
    Ok(())
}

/// Streaming object writer: bytes land in a .tmp sibling; the final
/// rename happens on drop, after flush + best-effort fsync.
struct LocalWriter {
    file: Option<File>,
    tmp: PathBuf,
    path: PathBuf,
}

impl Write for LocalWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.file.as_mut() {
            Some(f) => f.write(buf),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "object writer already finalized",
            )),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.file.as_mut() {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for LocalWriter {
    fn drop(&mut self) {
        if let Some(mut f) = self.file.take() {
            let _ = f.flush();
            let _ = f.sync_all();
            drop(f);
            if let Err(e) = fs::rename(&self.tmp, &self.path) {
                warn!(
                    "publish object failed: {} -> {}: {e}",
                    self.tmp.display(),
                    self.path.display()
                );
            }
        }
    }
}
