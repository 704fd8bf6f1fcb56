use botchan_net::{FeedRegistry, Submitter, contracts::validate_feed_name, tx::prepare_register};
use botchan_state::{HistoryEntryType, NewHistoryEntry, StateStore};
use eyre::WrapErr as _;

use super::{ChainArgs, Execution, RegistryArgs, SignerArgs, print_json};

#[derive(clap::Args, Debug)]
pub(crate) struct RegisterArgs {
    /// Name of the feed, 1 to 64 characters
    feed_name: String,

    /// Short description stored alongside the feed
    #[arg(long, default_value = "")]
    description: String,

    #[command(flatten)]
    registry: RegistryArgs,

    #[command(flatten)]
    chain: ChainArgs,

    #[command(flatten)]
    signer: SignerArgs,
}

impl RegisterArgs {
    pub(crate) async fn run(self, store: &StateStore) -> eyre::Result<()> {
        validate_feed_name(&self.feed_name)?;
        let registry = self.registry.address()?;
        let tx = prepare_register(registry, &self.feed_name, &self.description);

        let options = match self.signer.execution(&self.chain)? {
            Execution::EncodeOnly(options) => return print_json(&tx.encode(options.chain_id)),
            Execution::Sign(options) => options,
        };

        // Taken names are refused before anything is signed.
        let already_registered = FeedRegistry::new(registry, &options.read_only())?
            .is_registered(&self.feed_name)
            .await
            .wrap_err_with(|| {
                format!("failed checking whether feed `{}` is registered", self.feed_name)
            })?;
        if already_registered {
            eyre::bail!("feed `{}` is already registered", self.feed_name);
        }

        let submitter = Submitter::new(&options)?;
        println!("Registering feed {}...", self.feed_name);
        let tx_hash = submitter
            .submit(&tx)
            .await
            .wrap_err_with(|| format!("failed registering feed `{}`", self.feed_name))?;

        let entry = NewHistoryEntry::new(
            HistoryEntryType::Register,
            tx_hash.to_string(),
            submitter.chain_id(),
            &self.feed_name,
        );
        store.add_history_entry(entry).wrap_err_with(|| {
            format!("registered in transaction {tx_hash} but failed recording it in history")
        })?;

        println!("Registered feed {}", self.feed_name);
        println!("Transaction: {tx_hash}");
        Ok(())
    }
}
