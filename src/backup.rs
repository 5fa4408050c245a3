//! backup — drives a differential scan into an object store.
//!
//! One snapshot = one manifest object (named after the snapshot) plus the
//! fresh blobs it owns, all inside a shared container. Linking to the
//! previous snapshot turns the scan incremental: unchanged blocks become
//! references into the ancestor chain and cost no storage.
//!
//! Chain derivation: a block at generation k in the parent resolves to
//! some container C; the same block referenced from the child is at
//! generation k+1 and must still resolve to C. That forces
//! child.chain = [parent] ++ parent.chain.

use std::io::{Read, Write};

use anyhow::{anyhow, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};

use crate::config::DiffConfig;
use crate::manifest::{ManifestHeader, ManifestReader};
use crate::metrics::record_blob_stored;
use crate::resolve::block_path;
use crate::scan::DifferentialScanner;
use crate::store::ObjectStore;

/// Counters for one completed backup.
#[derive(Debug, Clone, Default)]
pub struct BackupSummary {
    pub snapshot: String,
    pub blocks_total: u64,
    pub blocks_fresh: u64,
    pub blocks_reused: u64,
    pub blocks_zero: u64,
    pub bytes_read: u64,
    pub bytes_stored: u64,
    pub chain_len: usize,
}

/// Scan `source` into a new snapshot named `snapshot` inside `container`.
///
/// `link` names the immediately preceding snapshot in the same container;
/// its manifest supplies the records compared against, and the new chain
/// is derived from its header. `file_name`/`file_size` are recorded in
/// the header when known (a pipe source has no size).
pub fn backup_stream(
    store: &dyn ObjectStore,
    container: &str,
    snapshot: &str,
    source: impl Read,
    block_size: u32,
    link: Option<&str>,
    file_name: Option<&str>,
    file_size: Option<u64>,
    cfg: &DiffConfig,
) -> Result<BackupSummary> {
    if snapshot.is_empty() || snapshot.contains('/') {
        return Err(anyhow!("bad snapshot name {snapshot:?}"));
    }
    if store
        .exists(container, snapshot)
        .with_context(|| format!("probe manifest {container}/{snapshot}"))?
    {
        return Err(anyhow!(
            "snapshot {snapshot:?} already exists in container {container:?} (manifests are immutable)"
        ));
    }

    info!(
        "backup: start, container={container}, snapshot={snapshot}, block_size={block_size}, link={}",
        link.unwrap_or("none")
    );

    // Link to the parent manifest: pull its header for chain derivation,
    // keep the reader as the record source for digest comparison.
    let mut chain: Vec<String> = Vec::new();
    let linked_reader = match link {
        Some(parent) => {
            let src = store
                .read_stream(container, parent)
                .with_context(|| format!("open linked manifest {container}/{parent}"))?;
            let reader = ManifestReader::with_retry(src, cfg.retry_policy())
                .with_context(|| format!("parse linked manifest {parent}"))?;
            if reader.header().block_size != block_size {
                return Err(anyhow!(
                    "cannot link across block sizes: {} (new) vs {} ({parent})",
                    block_size,
                    reader.header().block_size
                ));
            }
            chain.push(parent.to_string());
            chain.extend(reader.header().chain.iter().cloned());
            Some(reader)
        }
        None => None,
    };

    let header = ManifestHeader::new(block_size)
        .with_file_name(file_name)
        .with_file_size(file_size)
        .with_chain(chain.clone());

    let manifest_sink = store
        .write_stream(container, snapshot)
        .with_context(|| format!("open manifest sink {container}/{snapshot}"))?;

    let mut scanner = DifferentialScanner::new(source, manifest_sink, &header)?;
    if let Some(reader) = linked_reader {
        scanner = scanner.with_linked(Box::new(reader));
    }

    let mut summary = BackupSummary {
        snapshot: snapshot.to_string(),
        chain_len: chain.len(),
        ..BackupSummary::default()
    };

    while let Some(scanned) = scanner.next_block()? {
        summary.blocks_total += 1;
        summary.bytes_read += scanned.record.size as u64;

        if scanned.record.zero_filled() {
            summary.blocks_zero += 1;
            continue;
        }
        let data = match scanned.data {
            Some(d) => d,
            None => {
                summary.blocks_reused += 1;
                continue;
            }
        };

        // Fresh block: gzip into its own object under this snapshot's root.
        summary.blocks_fresh += 1;
        let key = block_path(snapshot, scanned.record.block, 0, &[])?;
        let writer = store
            .write_stream(container, &key)
            .with_context(|| format!("open blob sink {container}/{key}"))?;
        let mut counting = CountingWriter { inner: writer, written: 0 };
        {
            let mut enc =
                GzEncoder::new(&mut counting, Compression::new(cfg.gzip_level));
            enc.write_all(&data)
                .with_context(|| format!("compress block {}", scanned.record.block))?;
            enc.finish()
                .with_context(|| format!("finish blob for block {}", scanned.record.block))?;
        }
        counting.flush().context("flush blob")?;
        record_blob_stored(counting.written);
        summary.bytes_stored += counting.written as u64;
        debug!(
            "stored blob {key}: {} raw -> {} compressed",
            data.len(),
            counting.written
        );
    }

    // Publish the manifest (writer finalizes on drop).
    drop(scanner.into_inner()?);

    info!(
        "backup: done, snapshot={}, blocks={} (fresh={}, reused={}, zero={}), read={} B, stored={} B",
        summary.snapshot,
        summary.blocks_total,
        summary.blocks_fresh,
        summary.blocks_reused,
        summary.blocks_zero,
        summary.bytes_read,
        summary.bytes_stored
    );

    Ok(summary)
}

struct CountingWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
