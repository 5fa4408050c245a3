//! restore — the differential read path.
//!
//! DifferentialReconstructor walks a manifest record by record, lazily:
//! zero-filled records become synthesized zero bytes with no I/O, stored
//! records are resolved through the ancestor chain (with the pruned-
//! ancestor fallback) and streamed through gzip decompression. The
//! exposed surface is a plain std::io::Read over the exact original
//! bytes — no visible block boundaries, forward-only, single pass.
//!
//! Failure kinds surface as io::Error wrapping DiffError:
//! - BlockUnresolved: no blob at any candidate generation;
//! - BlockCorrupt: decompression failure or wrong decompressed length;
//! - ManifestTruncated: the manifest stopped mid-record for good.

use std::io::{self, Read};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::debug;

use crate::errors::DiffError;
use crate::manifest::{BlockRecord, ManifestHeader, ManifestReader, RecordSource, RetryPolicy};
use crate::metrics::{record_blob_fetch, record_restore_block, record_restore_bytes};
use crate::resolve::resolve_existing;
use crate::store::ObjectStore;

pub struct DifferentialReconstructor<'a> {
    reader: ManifestReader<Box<dyn Read + Send>>,
    store: &'a dyn ObjectStore,
    container: String,
    snapshot: String,
    current: Option<BlockStream>,
    finished: bool,
}

/// The block currently being drained.
enum BlockStream {
    /// Zero-filled block: synthesized, no backing object.
    Zeros { left: u64 },
    /// Stored block: gzip stream over the blob object.
    Blob {
        block: u64,
        expected: u64,
        got: u64,
        dec: GzDecoder<Box<dyn Read + Send>>,
    },
}

impl<'a> DifferentialReconstructor<'a> {
    /// Open the manifest object named `snapshot` and prepare to stream
    /// its bytes. The header is parsed eagerly.
    pub fn open(store: &'a dyn ObjectStore, container: &str, snapshot: &str) -> Result<Self> {
        Self::open_with_retry(store, container, snapshot, RetryPolicy::default())
    }

    pub fn open_with_retry(
        store: &'a dyn ObjectStore,
        container: &str,
        snapshot: &str,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let src = store
            .read_stream(container, snapshot)
            .with_context(|| format!("open manifest {container}/{snapshot}"))?;
        let reader = ManifestReader::with_retry(src, retry)
            .with_context(|| format!("parse manifest {snapshot}"))?;
        debug!(
            "restore: open snapshot={snapshot}, block_size={}, chain={:?}",
            reader.header().block_size,
            reader.header().chain
        );
        Ok(Self {
            reader,
            store,
            container: container.to_string(),
            snapshot: snapshot.to_string(),
            current: None,
            finished: false,
        })
    }

    /// Reconstruct from an already-open manifest stream (e.g. a pipe fed
    /// by a concurrent producer) against `snapshot`'s container root.
    pub fn from_manifest_stream(
        store: &'a dyn ObjectStore,
        container: &str,
        snapshot: &str,
        manifest: Box<dyn Read + Send>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let reader = ManifestReader::with_retry(manifest, retry)
            .with_context(|| format!("parse manifest {snapshot}"))?;
        Ok(Self {
            reader,
            store,
            container: container.to_string(),
            snapshot: snapshot.to_string(),
            current: None,
            finished: false,
        })
    }

    pub fn header(&self) -> &ManifestHeader {
        self.reader.header()
    }

    /// Pull the next record and open its byte source. Ok(false) at end.
    fn load_next_block(&mut self) -> Result<bool> {
        let rec = match self.reader.next_record()? {
            Some(r) => r,
            None => {
                self.finished = true;
                return Ok(false);
            }
        };
        record_restore_block(rec.zero_filled());

        if rec.zero_filled() {
            self.current = Some(BlockStream::Zeros {
                left: rec.size as u64,
            });
            return Ok(true);
        }

        let chain = &self.reader.header().chain;
        let key = resolve_existing(
            &self.snapshot,
            rec.block,
            rec.generation,
            chain,
            |path| self.store.exists(&self.container, path),
        )?;
        record_blob_fetch();
        debug!("restore: block {} <- {}/{}", rec.block, self.container, key);
        let raw = self
            .store
            .read_stream(&self.container, &key)
            .with_context(|| format!("open blob {}/{key}", self.container))?;
        self.current = Some(BlockStream::Blob {
            block: rec.block,
            expected: rec.size as u64,
            got: 0,
            dec: GzDecoder::new(raw),
        });
        Ok(true)
    }
}

impl Read for DifferentialReconstructor<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut written = 0usize;

        while written < out.len() {
            if self.current.is_none() {
                if self.finished {
                    break;
                }
                match self.load_next_block() {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
                }
            }

            let cur = match self.current.as_mut() {
                Some(c) => c,
                None => continue,
            };
            match cur {
                BlockStream::Zeros { left } => {
                    if *left == 0 {
                        self.current = None;
                        continue;
                    }
                    let n = (*left).min((out.len() - written) as u64) as usize;
                    out[written..written + n].fill(0);
                    *left -= n as u64;
                    written += n;
                }
                BlockStream::Blob {
                    block,
                    expected,
                    got,
                    dec,
                } => match dec.read(&mut out[written..]) {
                    Ok(0) => {
                        if *got != *expected {
                            let err = DiffError::BlockCorrupt {
                                block: *block,
                                reason: format!(
                                    "decompressed {got} bytes, record says {expected}"
                                ),
                            };
                            return Err(io::Error::new(io::ErrorKind::InvalidData, err));
                        }
                        self.current = None;
                    }
                    Ok(n) => {
                        *got += n as u64;
                        written += n;
                        if *got > *expected {
                            let err = DiffError::BlockCorrupt {
                                block: *block,
                                reason: format!(
                                    "blob decompresses past record size {expected}"
                                ),
                            };
                            return Err(io::Error::new(io::ErrorKind::InvalidData, err));
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        let err = DiffError::BlockCorrupt {
                            block: *block,
                            reason: format!("decompression failed: {e}"),
                        };
                        return Err(io::Error::new(io::ErrorKind::InvalidData, err));
                    }
                },
            }
        }

        record_restore_bytes(written);
        Ok(written)
    }
}

impl RecordSource for DifferentialReconstructor<'_> {
    /// Hand out raw records without touching any blob; this is how a
    /// scanner links to the previous snapshot for comparison.
    fn next_record(&mut self) -> Result<Option<BlockRecord>> {
        self.reader.next_record()
    }
}
