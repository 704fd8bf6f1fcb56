use botchan_net::{FeedInfo, FeedRegistry, ReadOnlyOptions, registry::DEFAULT_FEED_LIMIT};
use eyre::WrapErr as _;

use super::{ChainArgs, RegistryArgs, format_timestamp, print_json};

#[derive(clap::Args, Debug)]
pub(crate) struct FeedsArgs {
    /// Maximum number of feeds to list
    #[arg(long, value_name = "N", default_value_t = DEFAULT_FEED_LIMIT)]
    limit: u64,

    /// Print feeds as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    registry: RegistryArgs,

    #[command(flatten)]
    chain: ChainArgs,
}

impl FeedsArgs {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        let address = self.registry.address()?;
        let options = ReadOnlyOptions::from_env(self.chain.chain_id, self.chain.rpc_url)?;
        let feeds = FeedRegistry::new(address, &options)?
            .registered_feeds(self.limit)
            .await
            .wrap_err("failed fetching registered feeds")?;

        if self.json {
            return print_json(&feeds);
        }
        if feeds.is_empty() {
            println!("No registered feeds found");
            return Ok(());
        }

        println!("Found {} registered feed(s):", feeds.len());
        for (i, feed) in feeds.iter().enumerate() {
            println!();
            println!("{}", describe(i, feed));
        }
        Ok(())
    }
}

fn describe(index: usize, feed: &FeedInfo) -> String {
    let mut out = format!("[{index}] {}", feed.name);
    if !feed.description.is_empty() {
        out.push_str("\n    ");
        out.push_str(&feed.description);
    }
    out.push_str(&format!(
        "\n    registered by {} at {}",
        feed.registrant,
        format_timestamp(feed.registered_at)
    ));
    out
}
