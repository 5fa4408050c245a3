// tests/dedup.rs
//
// Incremental backups linked to a previous snapshot: unchanged blocks
// become references into the ancestor chain, own no storage, and still
// restore exactly. Chains deepen by one per linked snapshot.

use std::io::{Cursor, Read};

use anyhow::Result;

use diffstore::backup::{backup_stream, BackupSummary};
use diffstore::config::DiffConfig;
use diffstore::manifest::ManifestReader;
use diffstore::restore::DifferentialReconstructor;
use diffstore::store::{MemoryStore, ObjectStore};

const BS: u32 = 4096;

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = oorandom::Rand32::new(seed);
    let mut v = Vec::with_capacity(len + 4);
    while v.len() < len {
        v.extend_from_slice(&rng.rand_u32().to_le_bytes());
    }
    v.truncate(len);
    v
}

fn backup(
    store: &MemoryStore,
    snapshot: &str,
    data: &[u8],
    link: Option<&str>,
) -> Result<BackupSummary> {
    backup_stream(
        store,
        "c",
        snapshot,
        Cursor::new(data.to_vec()),
        BS,
        link,
        None,
        Some(data.len() as u64),
        &DiffConfig::default().with_block_size(BS),
    )
}

fn restore(store: &MemoryStore, snapshot: &str) -> Result<Vec<u8>> {
    let mut rec = DifferentialReconstructor::open(store, "c", snapshot)?;
    let mut out = Vec::new();
    rec.read_to_end(&mut out)?;
    Ok(out)
}

fn generations(store: &MemoryStore, snapshot: &str) -> Result<Vec<u32>> {
    let mut rd = ManifestReader::new(store.read_stream("c", snapshot)?)?;
    let mut gens = Vec::new();
    while let Some(r) = rd.next_record()? {
        gens.push(r.generation);
    }
    Ok(gens)
}

#[test]
fn linked_backup_stores_only_changed_blocks() -> Result<()> {
    let store = MemoryStore::new();
    let bs = BS as usize;
    let base = random_bytes(3 * bs + 1000, 10);

    let s = backup(&store, "a", &base, None)?;
    assert_eq!(s.blocks_total, 4);
    assert_eq!(s.blocks_fresh, 4);

    // change only block 2
    let mut next = base.clone();
    next[2 * bs + 17] ^= 0xFF;

    let s = backup(&store, "b", &next, Some("a"))?;
    assert_eq!(s.blocks_total, 4);
    assert_eq!(s.blocks_fresh, 1);
    assert_eq!(s.blocks_reused, 3);
    assert_eq!(s.chain_len, 1);

    // b owns exactly the one changed blob
    assert_eq!(store.list("c", "b/")?, vec!["b/00/002".to_string()]);
    assert_eq!(generations(&store, "b")?, vec![1, 1, 0, 1]);

    assert_eq!(restore(&store, "b")?, next);
    assert_eq!(restore(&store, "a")?, base); // ancestor untouched
    Ok(())
}

#[test]
fn unchanged_linked_backup_owns_no_blobs() -> Result<()> {
    let store = MemoryStore::new();
    let data = random_bytes(2 * BS as usize, 11);

    backup(&store, "a", &data, None)?;
    let s = backup(&store, "b", &data, Some("a"))?;
    assert_eq!(s.blocks_fresh, 0);
    assert_eq!(s.blocks_reused, 2);
    assert_eq!(s.bytes_stored, 0);
    assert!(store.list("c", "b/")?.is_empty());

    assert_eq!(restore(&store, "b")?, data);
    Ok(())
}

#[test]
fn three_deep_chain_accumulates_generations() -> Result<()> {
    let store = MemoryStore::new();
    let bs = BS as usize;
    let base = random_bytes(3 * bs, 12);

    backup(&store, "a", &base, None)?;

    let mut v2 = base.clone();
    v2[bs + 5] ^= 0x01; // block 1 changes in b
    backup(&store, "b", &v2, Some("a"))?;

    let mut v3 = v2.clone();
    v3[2 * bs + 9] ^= 0x01; // block 2 changes in c
    let s = backup(&store, "c2", &v3, Some("b"))?;
    assert_eq!(s.chain_len, 2);

    // chain is [b, a]; block 0 unchanged since a (gen 2), block 1 owned
    // by b (gen 1), block 2 fresh here (gen 0)
    let rd = ManifestReader::new(store.read_stream("c", "c2")?)?;
    assert_eq!(rd.header().chain, vec!["b".to_string(), "a".to_string()]);
    drop(rd);
    assert_eq!(generations(&store, "c2")?, vec![2, 1, 0]);

    assert_eq!(restore(&store, "c2")?, v3);
    assert_eq!(restore(&store, "b")?, v2);
    assert_eq!(restore(&store, "a")?, base);
    Ok(())
}

#[test]
fn grown_stream_adds_fresh_tail_blocks() -> Result<()> {
    let store = MemoryStore::new();
    let bs = BS as usize;
    let base = random_bytes(2 * bs, 13);

    backup(&store, "a", &base, None)?;

    let mut next = base.clone();
    next.extend_from_slice(&random_bytes(bs + 50, 14)); // two extra blocks

    let s = backup(&store, "b", &next, Some("a"))?;
    assert_eq!(s.blocks_total, 4);
    assert_eq!(s.blocks_reused, 2);
    assert_eq!(s.blocks_fresh, 2);

    assert_eq!(restore(&store, "b")?, next);
    Ok(())
}

#[test]
fn linking_across_block_sizes_is_rejected() -> Result<()> {
    let store = MemoryStore::new();
    let data = random_bytes(100, 15);
    backup(&store, "a", &data, None)?;

    let err = backup_stream(
        &store,
        "c",
        "b",
        Cursor::new(data),
        8192,
        Some("a"),
        None,
        None,
        &DiffConfig::default().with_block_size(8192),
    )
    .unwrap_err();
    assert!(err.to_string().contains("block sizes"));
    Ok(())
}
