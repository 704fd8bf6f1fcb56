mod config;
mod feeds;
mod history;
mod post;
mod register;
mod seen;

use std::{
    io::{self, BufRead as _, Write as _},
    path::PathBuf,
};

use alloy_primitives::Address;
use botchan_net::{CommonOptions, KeySource, ReadOnlyOptions};
use botchan_state::StateStore;
use clap::{Parser, Subcommand};
use eyre::WrapErr as _;
use serde::Serialize;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "botchan", version, about, long_about = None)]
pub(crate) struct Botchan {
    /// Path of the local state file. Defaults to ~/.botchan/state.json.
    #[arg(long, global = true, env = "BOTCHAN_STATE_FILE", value_name = "FILE")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    cmd: BotchanSubcommand,
}

#[derive(Subcommand, Debug)]
enum BotchanSubcommand {
    /// Show or change local configuration
    Config(config::ConfigArgs),
    /// List registered feeds
    Feeds(feeds::FeedsArgs),
    /// List transactions sent from this machine
    History(history::HistoryArgs),
    /// Mark a feed as read up to the newest of the given post timestamps
    Seen(seen::SeenArgs),
    /// Post a message to a feed
    Post(post::PostArgs),
    /// Register a new feed
    Register(register::RegisterArgs),
}

impl Botchan {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        let store = match self.state_file {
            Some(path) => StateStore::new(path),
            None => StateStore::from_home().wrap_err("failed locating the state file")?,
        };
        tracing::debug!(path = %store.path().display(), "using state file");

        match self.cmd {
            BotchanSubcommand::Config(args) => args.run(&store),
            BotchanSubcommand::Feeds(args) => args.run().await,
            BotchanSubcommand::History(args) => args.run(&store),
            BotchanSubcommand::Seen(args) => args.run(&store),
            BotchanSubcommand::Post(args) => args.run(&store).await,
            BotchanSubcommand::Register(args) => args.run(&store).await,
        }
    }
}

/// Chain selection shared by the commands that talk to a chain.
#[derive(clap::Args, Debug)]
struct ChainArgs {
    /// Chain id [env: BOTCHAN_CHAIN_ID, NET_CHAIN_ID] [default: 8453]
    #[arg(long, value_name = "ID")]
    chain_id: Option<u64>,

    /// JSON-RPC endpoint [env: BOTCHAN_RPC_URL, NET_RPC_URL]
    #[arg(long, value_name = "URL")]
    rpc_url: Option<Url>,
}

#[derive(clap::Args, Debug)]
struct SignerArgs {
    /// Signing key. Prefer BOTCHAN_PRIVATE_KEY, NET_PRIVATE_KEY or
    /// PRIVATE_KEY over passing it here.
    #[arg(long, value_name = "KEY")]
    private_key: Option<String>,

    /// Print the unsigned transaction as JSON instead of sending it
    #[arg(long)]
    encode_only: bool,
}

#[derive(clap::Args, Debug)]
struct RegistryArgs {
    /// Feed registry contract address
    #[arg(long, env = "BOTCHAN_FEED_REGISTRY", value_name = "ADDRESS")]
    registry_address: Option<Address>,
}

impl RegistryArgs {
    fn address(&self) -> eyre::Result<Address> {
        self.registry_address.ok_or_else(|| {
            eyre::eyre!(
                "no feed registry address configured; pass --registry-address or set \
                 BOTCHAN_FEED_REGISTRY"
            )
        })
    }
}

/// How a write command gets its transaction onto the chain.
enum Execution {
    /// Print the call for an external signer.
    EncodeOnly(ReadOnlyOptions),
    /// Sign with a local key and broadcast.
    Sign(CommonOptions),
}

impl SignerArgs {
    fn execution(&self, chain: &ChainArgs) -> eyre::Result<Execution> {
        if self.encode_only {
            let options = ReadOnlyOptions::from_env(chain.chain_id, chain.rpc_url.clone())?;
            return Ok(Execution::EncodeOnly(options));
        }

        let (options, source) = CommonOptions::from_env(
            self.private_key.as_deref(),
            chain.chain_id,
            chain.rpc_url.clone(),
            true,
        )?;
        match source {
            KeySource::Flag => tracing::warn!(
                "passing --private-key on the command line exposes it in shell history; \
                 set BOTCHAN_PRIVATE_KEY instead"
            ),
            KeySource::Env(var) => tracing::debug!(var, "using private key from environment"),
        }
        Ok(Execution::Sign(options))
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> eyre::Result<()> {
    let json = serde_json::to_string_pretty(value).wrap_err("failed serializing output")?;
    println!("{json}");
    Ok(())
}

/// Asks a yes/no question on stdin. Only an explicit `y`/`yes` counts.
fn confirm(prompt: &str) -> eyre::Result<bool> {
    print!("{prompt} (y/N) ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .wrap_err("failed reading confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Renders a unix timestamp as RFC 3339, falling back to the raw number when
/// it is out of range.
fn format_timestamp(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|s| jiff::Timestamp::from_second(s).ok())
        .map_or_else(|| seconds.to_string(), |ts| ts.to_string())
}
