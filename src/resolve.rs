//! Deterministic block blob addressing and the pruned-ancestor fallback
//! search.
//!
//! A blob lives at `<root>/<upper>/<lower>` inside the shared container:
//! - upper = hex(block >> 12), lowercase, zero-padded to >= 2 chars;
//! - lower = hex(block & 0xFFF), zero-padded to >= 3 chars;
//! - root = the snapshot's own name for generation 0, else
//!   `chain[generation - 1]`.
//!
//! Example: block 4098 -> <root>/01/002.

use anyhow::{anyhow, Result};
use log::debug;

use crate::errors::DiffError;
use crate::metrics::record_fallback_probe;

/// Path of the blob for (block, generation) without any existence check.
/// Errors only when generation points past the end of the chain.
pub fn block_path(container_root: &str, block: u64, generation: u32, chain: &[String]) -> Result<String> {
    let root = if generation == 0 {
        container_root
    } else {
        chain
            .get(generation as usize - 1)
            .map(String::as_str)
            .ok_or_else(|| {
                anyhow!(
                    "generation {} exceeds ancestor chain length {}",
                    generation,
                    chain.len()
                )
            })?
    };
    Ok(format!("{}/{:02x}/{:03x}", root, block >> 12, block & 0xFFF))
}

/// Resolve the blob path for a record, falling back through the chain
/// when intermediate ancestors have been pruned.
///
/// If the path for `generation` does not exist and generation > 1, the
/// generation is decremented and re-probed down to 1: a pruned ancestor's
/// blocks were themselves re-derived from an earlier snapshot, so a later
/// (lower-generation) container may hold the content. If no candidate
/// exists, the block is unresolvable — the caller gets an error, never
/// silent zero bytes.
pub fn resolve_existing<F>(
    container_root: &str,
    block: u64,
    generation: u32,
    chain: &[String],
    mut exists: F,
) -> Result<String>
where
    F: FnMut(&str) -> Result<bool>,
{
    let mut gen = generation;
    let mut path = block_path(container_root, block, gen, chain)?;
    let mut probed = 1u32;

    while gen > 1 && !exists(&path)? {
        gen -= 1;
        probed += 1;
        record_fallback_probe();
        debug!("blob {path} missing for block {block}, falling back to generation {gen}");
        path = block_path(container_root, block, gen, chain)?;
    }

    if !exists(&path)? {
        return Err(DiffError::BlockUnresolved {
            block,
            candidates: probed,
        }
        .into());
    }
    Ok(path)
}
