use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};

use diffstore::backup::backup_stream;
use diffstore::config::{validate_block_size, DiffConfig};

use super::util::open_store;

pub fn exec(
    store_url: String,
    container: String,
    snapshot: String,
    input: PathBuf,
    link: Option<String>,
    block_size: Option<u32>,
) -> Result<()> {
    let store = open_store(&store_url)?;
    let cfg = DiffConfig::from_env();
    let block_size = block_size.unwrap_or(cfg.block_size);
    validate_block_size(block_size)?;

    // "-" reads stdin: a pipe has no name and no known size.
    let (source, file_name, file_size): (Box<dyn Read>, Option<String>, Option<u64>) =
        if input.as_os_str() == "-" {
            (Box::new(io::stdin()), None, None)
        } else {
            let f = File::open(&input)
                .with_context(|| format!("open input {}", input.display()))?;
            let size = f.metadata().ok().map(|m| m.len());
            let name = input.file_name().map(|n| n.to_string_lossy().into_owned());
            (Box::new(f), name, size)
        };

    let s = backup_stream(
        store.as_ref(),
        &container,
        &snapshot,
        source,
        block_size,
        link.as_deref(),
        file_name.as_deref(),
        file_size,
        &cfg,
    )?;

    println!(
        "snapshot '{}': {} blocks ({} fresh, {} reused, {} zero), {} B read, {} B stored, chain depth {}",
        s.snapshot,
        s.blocks_total,
        s.blocks_fresh,
        s.blocks_reused,
        s.blocks_zero,
        s.bytes_read,
        s.bytes_stored,
        s.chain_len
    );
    Ok(())
}
