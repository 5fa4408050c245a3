//! Binary block record — fixed 44 bytes, big-endian.
//!
//! Layout:
//!   [0..8)   block index  u64
//!   [8..12)  block size   u32 (<= manifest blockSize; less only for the
//!                              final block of a stream)
//!   [12..16) generation   u32 (0 = stored fresh under this snapshot,
//!                              N = identical to the record at the same
//!                              index N ancestors back)
//!   [16..44) digest       28 bytes SHA3-224, or the all-zero sentinel
//!                              meaning "zero-filled block, not stored"
//!
//! zero_filled is derived from the digest sentinel; there is no separate
//! flag byte on the wire.

use byteorder::{BigEndian, ByteOrder};

use crate::consts::{
    BLOCK_RECORD_SIZE, DIGEST_LEN, REC_OFF_BLOCK, REC_OFF_DIGEST, REC_OFF_GENERATION,
    REC_OFF_SIZE, ZERO_DIGEST,
};

/// One decoded block record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub block: u64,
    pub size: u32,
    pub generation: u32,
    pub digest: [u8; DIGEST_LEN],
}

impl BlockRecord {
    /// True when the digest is the reserved sentinel: the block is
    /// entirely zero bytes and has no stored blob.
    #[inline]
    pub fn zero_filled(&self) -> bool {
        self.digest == ZERO_DIGEST
    }

    /// Encode into the fixed 44-byte wire frame.
    pub fn encode(&self) -> [u8; BLOCK_RECORD_SIZE] {
        let mut buf = [0u8; BLOCK_RECORD_SIZE];
        BigEndian::write_u64(&mut buf[REC_OFF_BLOCK..REC_OFF_BLOCK + 8], self.block);
        BigEndian::write_u32(&mut buf[REC_OFF_SIZE..REC_OFF_SIZE + 4], self.size);
        BigEndian::write_u32(
            &mut buf[REC_OFF_GENERATION..REC_OFF_GENERATION + 4],
            self.generation,
        );
        buf[REC_OFF_DIGEST..].copy_from_slice(&self.digest);
        buf
    }

    /// Decode a 44-byte wire frame.
    pub fn decode(buf: &[u8; BLOCK_RECORD_SIZE]) -> Self {
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&buf[REC_OFF_DIGEST..]);
        Self {
            block: BigEndian::read_u64(&buf[REC_OFF_BLOCK..REC_OFF_BLOCK + 8]),
            size: BigEndian::read_u32(&buf[REC_OFF_SIZE..REC_OFF_SIZE + 4]),
            generation: BigEndian::read_u32(&buf[REC_OFF_GENERATION..REC_OFF_GENERATION + 4]),
            digest,
        }
    }
}
