use anyhow::{Context, Result};
use serde::Serialize;

use diffstore::manifest::ManifestReader;

use super::util::{open_store, to_hex};

#[derive(Serialize)]
struct HeaderView {
    file_name: Option<String>,
    file_size: Option<u64>,
    block_size: u32,
    version: u32,
    chain: Vec<String>,
}

#[derive(Serialize)]
struct RecordView {
    block: u64,
    size: u32,
    generation: u32,
    digest: String,
    zero: bool,
}

#[derive(Serialize)]
struct ManifestView {
    snapshot: String,
    header: HeaderView,
    records: Vec<RecordView>,
}

pub fn exec(store_url: String, container: String, snapshot: String, json: bool) -> Result<()> {
    let store = open_store(&store_url)?;
    let src = store
        .read_stream(&container, &snapshot)
        .with_context(|| format!("open manifest {container}/{snapshot}"))?;
    let mut reader = ManifestReader::new(src)
        .with_context(|| format!("parse manifest {snapshot}"))?;

    let h = reader.header().clone();
    let mut records = Vec::new();
    while let Some(r) = reader.next_record()? {
        records.push(RecordView {
            block: r.block,
            size: r.size,
            generation: r.generation,
            digest: to_hex(&r.digest),
            zero: r.zero_filled(),
        });
    }

    if json {
        let view = ManifestView {
            snapshot,
            header: HeaderView {
                file_name: h.file_name,
                file_size: h.file_size,
                block_size: h.block_size,
                version: h.version,
                chain: h.chain,
            },
            records,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("snapshot:   {snapshot}");
    println!("fileName:   {}", h.file_name.as_deref().unwrap_or("(none)"));
    match h.file_size {
        Some(n) => println!("fileSize:   {n}"),
        None => println!("fileSize:   (unknown)"),
    }
    println!("blockSize:  {}", h.block_size);
    println!("version:    {}", h.version);
    if h.chain.is_empty() {
        println!("chain:      (full backup)");
    } else {
        println!("chain:      {}", h.chain.join(" -> "));
    }
    println!("records:    {}", records.len());
    for r in &records {
        if r.zero {
            println!("  block {:>8}  size {:>10}  zero-filled", r.block, r.size);
        } else {
            println!(
                "  block {:>8}  size {:>10}  gen {:>3}  {}",
                r.block, r.size, r.generation, r.digest
            );
        }
    }
    Ok(())
}
