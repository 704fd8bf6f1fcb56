use alloy_primitives::{Address, Bytes};
use botchan_net::{
    Submitter, TxConfig,
    contracts::{NET_ADDRESS, compose_post},
    tx::{parse_attachment, prepare_post},
};
use botchan_state::{HistoryEntryType, NewHistoryEntry, StateStore, normalize_feed_name};
use eyre::WrapErr as _;

use super::{ChainArgs, Execution, SignerArgs, print_json};

#[derive(clap::Args, Debug)]
pub(crate) struct PostArgs {
    /// Feed to post to. Matched case-insensitively.
    feed: String,

    /// Message text, or the title when --body is given
    message: String,

    /// Longer text following the title after a blank line
    #[arg(long)]
    body: Option<String>,

    /// Attachment: 0x-prefixed hex, otherwise the UTF-8 bytes of the value
    #[arg(long, value_name = "DATA")]
    data: Option<String>,

    /// Net contract address
    #[arg(long, env = "BOTCHAN_NET_ADDRESS", default_value_t = NET_ADDRESS)]
    net_address: Address,

    #[command(flatten)]
    chain: ChainArgs,

    #[command(flatten)]
    signer: SignerArgs,
}

impl PostArgs {
    /// Validates the input and builds the call. Returns the topic, the full
    /// post text and the transaction.
    fn prepare(&self) -> eyre::Result<(String, String, TxConfig)> {
        let feed = normalize_feed_name(&self.feed);
        let text = compose_post(&self.message, self.body.as_deref())?;
        let data = match self.data.as_deref() {
            Some(input) => parse_attachment(input).wrap_err("invalid --data")?,
            None => Bytes::new(),
        };
        let tx = prepare_post(self.net_address, &feed, &text, data);
        Ok((feed, text, tx))
    }

    pub(crate) async fn run(self, store: &StateStore) -> eyre::Result<()> {
        let (feed, text, tx) = self.prepare()?;

        let options = match self.signer.execution(&self.chain)? {
            Execution::EncodeOnly(options) => return print_json(&tx.encode(options.chain_id)),
            Execution::Sign(options) => options,
        };

        let submitter = Submitter::new(&options)?;
        println!("Posting to {feed} as {}...", submitter.sender());
        let tx_hash = submitter
            .submit(&tx)
            .await
            .wrap_err_with(|| format!("failed posting to `{feed}`"))?;

        let entry = NewHistoryEntry::new(
            HistoryEntryType::Post,
            tx_hash.to_string(),
            submitter.chain_id(),
            &feed,
        )
        .with_sender(submitter.sender().to_string())
        .with_text(&text);
        store.add_history_entry(entry).wrap_err_with(|| {
            format!("posted in transaction {tx_hash} but failed recording it in history")
        })?;

        println!("Posted to {feed}");
        println!("Transaction: {tx_hash}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall as _;
    use botchan_net::contracts::INet;
    use clap::Parser as _;
    use tempfile::TempDir;

    #[derive(clap::Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        args: PostArgs,
    }

    fn parse(argv: &[&str]) -> PostArgs {
        Cli::try_parse_from(std::iter::once("post").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn defaults_to_the_net_contract() {
        let args = parse(&["general", "gm"]);
        assert_eq!(args.net_address, NET_ADDRESS);
        assert!(!args.signer.encode_only);
    }

    #[test]
    fn topic_matches_the_watermark_key() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        let (feed, text, tx) = parse(&["General", "gm", "--body", "more"]).prepare().unwrap();
        let call = INet::sendMessageCall::abi_decode(&tx.data).unwrap();
        assert_eq!(call.topic, feed);
        assert_eq!(call.text, text);
        assert_eq!(text, "gm\n\nmore");

        store.mark_feed_seen("General", [10u64]).unwrap();
        assert_eq!(store.last_seen_timestamp(&call.topic).unwrap(), Some(10));
    }

    #[tokio::test]
    async fn encode_only_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        parse(&["General", "gm", "--encode-only", "--chain-id", "84532"])
            .run(&store)
            .await
            .unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_signing() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        let err = parse(&["general", "", "--encode-only"])
            .run(&store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
