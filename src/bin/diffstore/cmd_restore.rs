use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use diffstore::restore::DifferentialReconstructor;

use super::util::open_store;

pub fn exec(store_url: String, container: String, snapshot: String, out: PathBuf) -> Result<()> {
    let store = open_store(&store_url)?;
    let mut rec = DifferentialReconstructor::open(store.as_ref(), &container, &snapshot)?;
    let expected = rec.header().file_size;

    let restored = if out.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let n = io::copy(&mut rec, &mut lock)
            .with_context(|| format!("restore snapshot {snapshot}"))?;
        lock.flush()?;
        n
    } else {
        let mut f =
            File::create(&out).with_context(|| format!("create output {}", out.display()))?;
        let n = io::copy(&mut rec, &mut f)
            .with_context(|| format!("restore snapshot {snapshot}"))?;
        f.flush()?;
        n
    };

    if let Some(size) = expected {
        if size != restored {
            return Err(anyhow!(
                "restored {restored} B but manifest header says fileSize {size}"
            ));
        }
    }

    println!("restored {restored} B from snapshot '{snapshot}'");
    Ok(())
}
