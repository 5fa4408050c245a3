//! Streaming manifest reader: eager header parse, then one block record
//! per pull.
//!
//! Tolerant to a manifest that is still being produced at the far end
//! (scanner writing into a pipe, or a file being appended): a read that
//! comes back empty mid-header or mid-record is treated as "not yet
//! available" and retried after a short delay. The wait is bounded by
//! RetryPolicy; exhausting it is a ManifestTruncated error. An empty
//! read exactly at a record boundary is clean end-of-stream.

use std::io::{ErrorKind, Read};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::consts::{
    BLOCK_RECORD_SIZE, MANIFEST_RETRY_DELAY_MS, MANIFEST_RETRY_MAX, MAX_HEADER_BYTES,
};
use crate::errors::DiffError;

use super::{BlockRecord, ManifestHeader};

/// Bounded wait for manifest bytes that have not been produced yet.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MANIFEST_RETRY_MAX,
            delay: Duration::from_millis(MANIFEST_RETRY_DELAY_MS),
        }
    }
}

/// Pull-based source of block records. The scanner links against this to
/// compare a new stream with the previous snapshot's records.
pub trait RecordSource {
    fn next_record(&mut self) -> Result<Option<BlockRecord>>;
}

#[derive(Debug)]
pub struct ManifestReader<R: Read> {
    src: R,
    header: ManifestHeader,
    retry: RetryPolicy,
}

impl<R: Read> ManifestReader<R> {
    /// Open a manifest stream with the default retry policy. Blocks until
    /// the full header (terminated by a blank line) is available.
    pub fn new(src: R) -> Result<Self> {
        Self::with_retry(src, RetryPolicy::default())
    }

    pub fn with_retry(mut src: R, retry: RetryPolicy) -> Result<Self> {
        let header = read_header(&mut src, retry)?;
        Ok(Self {
            src,
            header,
            retry,
        })
    }

    pub fn header(&self) -> &ManifestHeader {
        &self.header
    }

    /// Read the next 44-byte record.
    ///
    /// Ok(None) at a clean record boundary; ManifestTruncated if the
    /// stream stops for good mid-record.
    pub fn next_record(&mut self) -> Result<Option<BlockRecord>> {
        let mut buf = [0u8; BLOCK_RECORD_SIZE];
        let mut filled = 0usize;
        let mut attempts = 0u32;

        while filled < BLOCK_RECORD_SIZE {
            match self.src.read(&mut buf[filled..]) {
                Ok(0) => {
                    if filled == 0 {
                        return Ok(None); // end of manifest
                    }
                    attempts += 1;
                    if attempts > self.retry.max_attempts {
                        return Err(DiffError::ManifestTruncated(format!(
                            "record cut short: {filled} of {BLOCK_RECORD_SIZE} bytes after {} attempts",
                            self.retry.max_attempts
                        ))
                        .into());
                    }
                    if attempts == 1 {
                        warn!(
                            "manifest record incomplete ({filled}/{BLOCK_RECORD_SIZE} bytes), waiting for producer"
                        );
                    }
                    thread::sleep(self.retry.delay);
                }
                Ok(n) => {
                    filled += n;
                    attempts = 0;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e).context("read manifest record"),
            }
        }

        let rec = BlockRecord::decode(&buf);
        debug!(
            "manifest record: block={} size={} generation={} zero={}",
            rec.block,
            rec.size,
            rec.generation,
            rec.zero_filled()
        );
        Ok(Some(rec))
    }
}

impl<R: Read> RecordSource for ManifestReader<R> {
    fn next_record(&mut self) -> Result<Option<BlockRecord>> {
        ManifestReader::next_record(self)
    }
}

/// Read bytes until the blank line that terminates the header, then parse.
///
/// Byte-at-a-time like the original consumer: records start immediately
/// after "\n\n" and must not be swallowed by buffering.
fn read_header<R: Read>(src: &mut R, retry: RetryPolicy) -> Result<ManifestHeader> {
    let mut raw: Vec<u8> = Vec::with_capacity(256);
    let mut attempts = 0u32;
    let mut last_newline = false;

    loop {
        let mut byte = [0u8; 1];
        match src.read(&mut byte) {
            Ok(0) => {
                attempts += 1;
                if attempts > retry.max_attempts {
                    return Err(DiffError::ManifestTruncated(format!(
                        "header incomplete after {} bytes",
                        raw.len()
                    ))
                    .into());
                }
                thread::sleep(retry.delay);
            }
            Ok(_) => {
                attempts = 0;
                if byte[0] == b'\n' {
                    if last_newline {
                        break; // blank line terminates the header
                    }
                    last_newline = true;
                } else {
                    last_newline = false;
                }
                raw.push(byte[0]);
                if raw.len() > MAX_HEADER_BYTES {
                    return Err(DiffError::BadHeader(format!(
                        "header exceeds {MAX_HEADER_BYTES} bytes"
                    ))
                    .into());
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e).context("read manifest header"),
        }
    }

    let text = std::str::from_utf8(&raw)
        .map_err(|_| DiffError::BadHeader("header is not valid UTF-8".into()))?;
    ManifestHeader::parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    use crate::consts::ZERO_DIGEST;

    fn tiny_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(1),
        }
    }

    fn manifest_bytes(records: &[BlockRecord]) -> Vec<u8> {
        let mut buf = ManifestHeader::new(4096).encode().into_bytes();
        for r in records {
            buf.extend_from_slice(&r.encode());
        }
        buf
    }

    #[test]
    fn reads_header_then_records_then_eof() {
        let recs = vec![
            BlockRecord {
                block: 0,
                size: 4096,
                generation: 0,
                digest: [7u8; 28],
            },
            BlockRecord {
                block: 1,
                size: 100,
                generation: 2,
                digest: ZERO_DIGEST,
            },
        ];
        let bytes = manifest_bytes(&recs);
        let mut rd = ManifestReader::with_retry(Cursor::new(bytes), tiny_retry()).unwrap();
        assert_eq!(rd.header().block_size, 4096);
        assert_eq!(rd.next_record().unwrap().unwrap(), recs[0]);
        let r1 = rd.next_record().unwrap().unwrap();
        assert_eq!(r1, recs[1]);
        assert!(r1.zero_filled());
        assert!(rd.next_record().unwrap().is_none());
        // EOF is sticky
        assert!(rd.next_record().unwrap().is_none());
    }

    #[test]
    fn header_only_manifest_has_zero_records() {
        let bytes = ManifestHeader::new(512).encode().into_bytes();
        let mut rd = ManifestReader::with_retry(Cursor::new(bytes), tiny_retry()).unwrap();
        assert!(rd.next_record().unwrap().is_none());
    }

    #[test]
    fn truncated_record_is_an_error_after_retries() {
        let mut bytes = manifest_bytes(&[]);
        bytes.extend_from_slice(&[0u8; 20]); // 20 of 44 bytes, then silence
        let mut rd = ManifestReader::with_retry(Cursor::new(bytes), tiny_retry()).unwrap();
        let err = rd.next_record().unwrap_err();
        match err.downcast_ref::<DiffError>() {
            Some(DiffError::ManifestTruncated(_)) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncated_header_is_an_error() {
        let err =
            ManifestReader::with_retry(Cursor::new(b"blockSize:4096\n".to_vec()), tiny_retry())
                .unwrap_err();
        match err.downcast_ref::<DiffError>() {
            Some(DiffError::ManifestTruncated(_)) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
