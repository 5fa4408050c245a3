//! scan — the differential write path.
//!
//! DifferentialScanner consumes a source byte stream strictly
//! sequentially in block-size chunks (the final chunk may be shorter),
//! digests each block, compares it against the same-index record of a
//! linked ancestor manifest, and writes one 44-byte record per block to
//! the manifest sink immediately — the manifest is streamed, never
//! buffered whole, so it can feed a pipe consumed concurrently.
//!
//! The fresh-block side channel: blocks that need storage come back from
//! next_block() with their raw bytes attached; the caller persists them
//! (see backup::backup_stream). Reused and zero-filled blocks carry no
//! bytes and cost no storage.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use log::debug;

use crate::config::validate_block_size;
use crate::hash::block_digest;
use crate::manifest::{BlockRecord, ManifestHeader, RecordSource};
use crate::metrics::record_scan_block;

/// One scanned block: the record already written to the manifest sink,
/// plus the raw bytes when (and only when) the caller must persist a
/// fresh blob for it (generation 0, not zero-filled).
#[derive(Debug)]
pub struct ScanBlock {
    pub record: BlockRecord,
    pub data: Option<Vec<u8>>,
}

pub struct DifferentialScanner<R: Read, W: Write> {
    source: R,
    manifest: W,
    block_size: usize,
    linked: Option<Box<dyn RecordSource + Send>>,
    /// Lookahead record from the linked ancestor manifest.
    linked_next: Option<BlockRecord>,
    next_block: u64,
    done: bool,
}

impl<R: Read, W: Write> DifferentialScanner<R, W> {
    /// Start a scan. The header is encoded and written to the sink right
    /// away, so a zero-byte source still yields a valid header-only
    /// manifest.
    pub fn new(source: R, mut manifest: W, header: &ManifestHeader) -> Result<Self> {
        validate_block_size(header.block_size)?;
        manifest
            .write_all(header.encode().as_bytes())
            .context("write manifest header")?;
        Ok(Self {
            source,
            manifest,
            block_size: header.block_size as usize,
            linked: None,
            linked_next: None,
            next_block: 0,
            done: false,
        })
    }

    /// Link the scanner to the immediately preceding snapshot's records.
    /// The source is consumed lock-step with the new stream and used only
    /// for digest comparison, never for block bytes.
    pub fn with_linked(mut self, linked: Box<dyn RecordSource + Send>) -> Self {
        self.linked = Some(linked);
        self
    }

    /// Scan the next block. Returns Ok(None) once the source is exhausted.
    ///
    /// The record has already been flushed to the manifest sink when this
    /// returns; `data` is Some only for blocks the caller must store.
    pub fn next_block(&mut self) -> Result<Option<ScanBlock>> {
        if self.done {
            return Ok(None);
        }

        // Fill a whole block; partial reads are re-issued so only the
        // true end of the stream yields a short block.
        let mut buf = vec![0u8; self.block_size];
        let mut filled = 0usize;
        while filled < self.block_size {
            let n = self
                .source
                .read(&mut buf[filled..])
                .context("read source block")?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            self.done = true;
            self.manifest.flush().context("flush manifest sink")?;
            return Ok(None);
        }
        if filled < self.block_size {
            // Short block: this is the last one, recorded at true size.
            buf.truncate(filled);
            self.done = true;
        }

        let (zero, digest) = block_digest(&buf);
        let mut record = BlockRecord {
            block: self.next_block,
            size: filled as u32,
            generation: 0,
            digest,
        };

        // Digest comparison against the ancestor record at this index.
        // Byte-equal digests mean "unchanged" (sentinel == sentinel only
        // when both blocks are zero-filled); the reference then points
        // one generation deeper than the ancestor's own reference.
        let mut reused = false;
        if let Some(ancestor) = self.linked_record_at(self.next_block)? {
            if ancestor.digest == record.digest {
                record.generation = ancestor.generation + 1;
                reused = true;
            }
        }

        self.manifest
            .write_all(&record.encode())
            .with_context(|| format!("write record for block {}", record.block))?;
        if self.done {
            self.manifest.flush().context("flush manifest sink")?;
        }

        record_scan_block(filled, !reused, zero);
        debug!(
            "scanned block {}: size={} zero={} generation={}",
            record.block, record.size, zero, record.generation
        );

        self.next_block += 1;
        let data = if !reused && !zero { Some(buf) } else { None };
        Ok(Some(ScanBlock { record, data }))
    }

    /// Blocks emitted so far.
    pub fn blocks_emitted(&self) -> u64 {
        self.next_block
    }

    /// Flush and hand back the manifest sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.manifest.flush().context("flush manifest sink")?;
        Ok(self.manifest)
    }

    /// Advance the linked record stream to `block` and return its record
    /// for that index, if any. Both streams are strictly sequential from
    /// index 0, so this is at most one pull per scanned block.
    fn linked_record_at(&mut self, block: u64) -> Result<Option<BlockRecord>> {
        let linked = match self.linked.as_mut() {
            Some(l) => l,
            None => return Ok(None),
        };
        loop {
            if self.linked_next.is_none() {
                self.linked_next = linked.next_record()?;
            }
            match &self.linked_next {
                None => return Ok(None), // ancestor stream was shorter
                Some(r) if r.block < block => {
                    self.linked_next = None; // stale entry, catch up
                }
                Some(r) if r.block == block => return Ok(self.linked_next.take()),
                Some(_) => return Ok(None), // ancestor is ahead; keep the lookahead
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::consts::BLOCK_RECORD_SIZE;
    use crate::manifest::ManifestReader;

    fn scan_all(source: &[u8], block_size: u32) -> (Vec<ScanBlock>, Vec<u8>) {
        let header = ManifestHeader::new(block_size);
        let mut out = Vec::new();
        let mut blocks = Vec::new();
        {
            let mut sc =
                DifferentialScanner::new(Cursor::new(source.to_vec()), &mut out, &header).unwrap();
            while let Some(b) = sc.next_block().unwrap() {
                blocks.push(b);
            }
        }
        (blocks, out)
    }

    #[test]
    fn empty_source_emits_header_only() {
        let (blocks, manifest) = scan_all(b"", 4096);
        assert!(blocks.is_empty());
        let mut rd = ManifestReader::new(Cursor::new(manifest)).unwrap();
        assert_eq!(rd.header().block_size, 4096);
        assert!(rd.next_record().unwrap().is_none());
    }

    #[test]
    fn partial_final_block_true_size_no_padding() {
        let data = vec![0xA5u8; 10_000];
        let (blocks, manifest) = scan_all(&data, 4096);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].record.size, 4096);
        assert_eq!(blocks[1].record.size, 4096);
        assert_eq!(blocks[2].record.size, 1808);
        // blocks 0 and 1 hold identical bytes, block 2 is a different length
        assert_eq!(blocks[0].record.digest, blocks[1].record.digest);
        assert_ne!(blocks[0].record.digest, blocks[2].record.digest);
        // manifest = header + exactly 3 records
        let header_len = ManifestHeader::new(4096).encode().len();
        assert_eq!(manifest.len(), header_len + 3 * BLOCK_RECORD_SIZE);
    }

    #[test]
    fn zero_blocks_carry_no_data() {
        let mut data = vec![0u8; 8192];
        data.extend_from_slice(&[1u8; 100]);
        let (blocks, _) = scan_all(&data, 4096);
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].record.zero_filled());
        assert!(blocks[0].data.is_none());
        assert!(blocks[1].record.zero_filled());
        assert!(!blocks[2].record.zero_filled());
        assert_eq!(blocks[2].data.as_deref(), Some(&[1u8; 100][..]));
    }

    #[test]
    fn linked_scan_reuses_unchanged_blocks() {
        let base = {
            let mut v = vec![0x11u8; 4096];
            v.extend_from_slice(&[0x22u8; 4096]);
            v.extend_from_slice(&[0x33u8; 1000]);
            v
        };
        let (_, base_manifest) = scan_all(&base, 4096);

        // change only the middle block
        let mut next = base.clone();
        next[5000] ^= 0xFF;

        let linked = ManifestReader::new(Cursor::new(base_manifest)).unwrap();
        let header = ManifestHeader::new(4096).with_chain(vec!["base".into()]);
        let mut out = Vec::new();
        let mut sc = DifferentialScanner::new(Cursor::new(next), &mut out, &header)
            .unwrap()
            .with_linked(Box::new(linked));

        let b0 = sc.next_block().unwrap().unwrap();
        let b1 = sc.next_block().unwrap().unwrap();
        let b2 = sc.next_block().unwrap().unwrap();
        assert!(sc.next_block().unwrap().is_none());

        assert_eq!(b0.record.generation, 1);
        assert!(b0.data.is_none());
        assert_eq!(b1.record.generation, 0);
        assert!(b1.data.is_some());
        assert_eq!(b2.record.generation, 1);
        assert!(b2.data.is_none());
    }
}
