use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for the diffstore incremental block backup core
#[derive(Parser, Debug)]
#[command(name = "diffstore", version, about = "diffstore CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Back up a file (or stdin) as a new immutable snapshot
    ///
    /// Examples:
    ///   diffstore backup --store ./objects --container vm1 --snapshot mon --input disk.img
    ///   diffstore backup --store ./objects --container vm1 --snapshot tue --input disk.img --link mon
    Backup {
        /// Store URL: local://<dir>; a bare path means local
        #[arg(long)]
        store: String,
        #[arg(long)]
        container: String,
        /// Snapshot name (becomes the manifest object name)
        #[arg(long)]
        snapshot: String,
        /// Input file, or "-" to read stdin
        #[arg(long)]
        input: PathBuf,
        /// Previous snapshot to link against (makes the backup incremental)
        #[arg(long)]
        link: Option<String>,
        /// Block size in bytes (default: DS_BLOCK_SIZE or 1 MiB)
        #[arg(long)]
        block_size: Option<u32>,
    },
    /// Reconstruct a snapshot's exact original bytes
    Restore {
        #[arg(long)]
        store: String,
        #[arg(long)]
        container: String,
        #[arg(long)]
        snapshot: String,
        /// Output file, or "-" to write stdout
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a manifest's header and block records (use --json for JSON)
    Inspect {
        #[arg(long)]
        store: String,
        #[arg(long)]
        container: String,
        #[arg(long)]
        snapshot: String,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List objects in a container, optionally under a key prefix
    List {
        #[arg(long)]
        store: String,
        #[arg(long)]
        container: String,
        /// Optional key prefix, e.g. "<snapshot>/" for its blobs
        #[arg(long)]
        prefix: Option<String>,
        /// JSON output (array of keys)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
