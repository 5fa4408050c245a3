// tests/fallback.rs
//
// Resolution edge cases, driven by hand-built manifests:
// 1) A record pointing at a pruned ancestor falls back down the chain
//    and restores from whichever container still holds the blob.
// 2) A block with no blob at any candidate generation is a hard error,
//    never silently zero-filled.
// 3) A blob that fails to decompress, or decompresses to the wrong
//    length, is reported as corrupt.

use std::io::{Read, Write};

use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;

use diffstore::hash::block_digest;
use diffstore::manifest::{BlockRecord, ManifestHeader};
use diffstore::restore::DifferentialReconstructor;
use diffstore::store::MemoryStore;

const BS: u32 = 4096;

fn gz(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn put_manifest(store: &MemoryStore, snapshot: &str, chain: &[&str], records: &[BlockRecord]) {
    let header = ManifestHeader::new(BS)
        .with_chain(chain.iter().map(|s| s.to_string()).collect());
    let mut bytes = header.encode().into_bytes();
    for r in records {
        bytes.extend_from_slice(&r.encode());
    }
    store.put("c", snapshot, bytes);
}

fn record_for(block: u64, generation: u32, data: &[u8]) -> BlockRecord {
    let (_, digest) = block_digest(data);
    BlockRecord {
        block,
        size: data.len() as u32,
        generation,
        digest,
    }
}

fn restore(store: &MemoryStore, snapshot: &str) -> std::io::Result<Vec<u8>> {
    let mut rec = DifferentialReconstructor::open(store, "c", snapshot)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let mut out = Vec::new();
    rec.read_to_end(&mut out)?;
    Ok(out)
}

#[test]
fn pruned_ancestor_falls_back_down_the_chain() -> Result<()> {
    let store = MemoryStore::new();
    let data = vec![0x5Au8; BS as usize];

    // Record says generation 2 (grandparent "a"), but "a" was pruned and
    // only "b" still holds the content.
    put_manifest(&store, "cur", &["b", "a"], &[record_for(0, 2, &data)]);
    store.put("c", "b/00/000", gz(&data));

    assert_eq!(restore(&store, "cur")?, data);
    Ok(())
}

#[test]
fn direct_generation_hit_needs_no_fallback() -> Result<()> {
    let store = MemoryStore::new();
    let data = vec![0x77u8; 1000];

    put_manifest(&store, "cur", &["b", "a"], &[record_for(0, 2, &data)]);
    store.put("c", "a/00/000", gz(&data));
    // a decoy under "b" with different bytes must NOT win over the direct hit
    store.put("c", "b/00/000", gz(&vec![0u8; 1000]));

    assert_eq!(restore(&store, "cur")?, data);
    Ok(())
}

#[test]
fn unresolvable_block_is_an_error_not_zeros() {
    let store = MemoryStore::new();
    let data = vec![1u8; 100];

    put_manifest(&store, "cur", &["b", "a"], &[record_for(0, 2, &data)]);
    // no blob anywhere in the chain

    let err = restore(&store, "cur").unwrap_err();
    assert!(err.to_string().contains("unresolved"), "got: {err}");
}

#[test]
fn undecompressable_blob_is_corrupt() {
    let store = MemoryStore::new();
    let data = vec![2u8; 100];

    put_manifest(&store, "cur", &[], &[record_for(0, 0, &data)]);
    store.put("c", "cur/00/000", b"this is not gzip".to_vec());

    let err = restore(&store, "cur").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    assert!(err.to_string().contains("corrupt"), "got: {err}");
}

#[test]
fn wrong_decompressed_length_is_corrupt() {
    let store = MemoryStore::new();
    let data = vec![3u8; 100];

    put_manifest(&store, "cur", &[], &[record_for(0, 0, &data)]);
    // valid gzip, wrong payload length
    store.put("c", "cur/00/000", gz(&data[..40]));

    let err = restore(&store, "cur").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    assert!(err.to_string().contains("corrupt"), "got: {err}");
}

#[test]
fn zero_record_restores_zeros_with_no_store_object() -> Result<()> {
    let store = MemoryStore::new();

    let rec = BlockRecord {
        block: 0,
        size: 512,
        generation: 0,
        digest: [0u8; 28],
    };
    put_manifest(&store, "cur", &[], &[rec]);

    assert_eq!(restore(&store, "cur")?, vec![0u8; 512]);
    Ok(())
}
