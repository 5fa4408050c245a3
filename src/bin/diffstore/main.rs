use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_backup;
mod cmd_restore;
mod cmd_inspect;
mod cmd_list;

fn init_logger() {
    // Level comes from RUST_LOG, default is info.
    // Example: RUST_LOG=debug diffstore backup ...
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Backup { store, container, snapshot, input, link, block_size } =>
            cmd_backup::exec(store, container, snapshot, input, link, block_size),

        cli::Cmd::Restore { store, container, snapshot, out } =>
            cmd_restore::exec(store, container, snapshot, out),

        // Inspect supports --json flag
        cli::Cmd::Inspect { store, container, snapshot, json } =>
            cmd_inspect::exec(store, container, snapshot, json),

        cli::Cmd::List { store, container, prefix, json } =>
            cmd_list::exec(store, container, prefix, json),
    }
}
