//! botchan: post to topic feeds on Net Protocol and keep track of what you
//! have read.
//!
//! Read watermarks, your own address and a short history of sent
//! transactions live in a local JSON file (`~/.botchan/state.json` unless
//! `--state-file` says otherwise).

mod cmd;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    // Override with RUST_LOG, e.g. RUST_LOG=botchan_state=debug.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = cmd::Botchan::parse();
    args.run().await
}
