use botchan_state::{StateStore, normalize_feed_name};
use eyre::WrapErr as _;

use super::format_timestamp;

#[derive(clap::Args, Debug)]
pub(crate) struct SeenArgs {
    /// Feed name. Matched case-insensitively.
    feed: String,

    /// Unix timestamp of a post you have read. Repeatable; the newest wins.
    /// Without any, prints the current position.
    #[arg(long = "timestamp", value_name = "SECONDS")]
    timestamps: Vec<u64>,
}

impl SeenArgs {
    pub(crate) fn run(self, store: &StateStore) -> eyre::Result<()> {
        store
            .mark_feed_seen(&self.feed, &self.timestamps)
            .wrap_err_with(|| format!("failed marking feed `{}` as seen", self.feed))?;

        let feed = normalize_feed_name(&self.feed);
        match store
            .last_seen_timestamp(&feed)
            .wrap_err("failed reading state")?
        {
            Some(seen) => println!("{feed}: seen up to {}", format_timestamp(seen)),
            None => println!("{feed}: nothing marked as seen"),
        }
        Ok(())
    }
}
