use botchan_state::{AppState, StateStore};
use eyre::WrapErr as _;

use super::{confirm, format_timestamp, print_json};

/// Beyond this many tracked feeds `--show` prints only the count.
const MAX_LISTED_FEEDS: usize = 20;

#[derive(clap::Args, Debug)]
pub(crate) struct ConfigArgs {
    /// Set your address, used to tell your own posts apart
    #[arg(long, value_name = "ADDRESS")]
    my_address: Option<String>,

    /// Forget the configured address
    #[arg(long)]
    clear_address: bool,

    /// Print the current configuration
    #[arg(long)]
    show: bool,

    /// Delete the state file: watermarks, address and history
    #[arg(long)]
    reset: bool,

    /// Skip the confirmation prompt of --reset
    #[arg(long, requires = "reset")]
    force: bool,

    /// Print --show output as JSON
    #[arg(long)]
    json: bool,
}

impl ConfigArgs {
    pub(crate) fn run(self, store: &StateStore) -> eyre::Result<()> {
        if self.reset {
            return reset(store, self.force);
        }

        let mut changed = false;
        if let Some(address) = &self.my_address {
            if !is_address(address) {
                eyre::bail!("invalid address {address:?}: expected 0x followed by 40 hex digits");
            }
            store
                .set_my_address(address)
                .wrap_err("failed saving address")?;
            println!("Address set to {}", address.to_lowercase());
            changed = true;
        }

        if self.clear_address {
            store
                .clear_my_address()
                .wrap_err("failed clearing address")?;
            println!("Address cleared");
            changed = true;
        }

        if self.show || !changed {
            show(store, self.json)?;
        }
        Ok(())
    }
}

fn reset(store: &StateStore, force: bool) -> eyre::Result<()> {
    let state = store.load().wrap_err("failed reading state")?;
    println!("This deletes {}:", store.path().display());
    println!("  feed read positions: {}", state.feeds.len());
    println!("  history entries: {}", state.history_count());
    if let Some(address) = &state.my_address {
        println!("  configured address {address}");
    }

    if !force && !confirm("Continue?")? {
        println!("Aborted");
        return Ok(());
    }

    store.reset().wrap_err("failed deleting state file")?;
    println!("State reset");
    Ok(())
}

fn show(store: &StateStore, json: bool) -> eyre::Result<()> {
    let state = store.load().wrap_err("failed reading state")?;
    if json {
        return print_json(&state);
    }

    println!("State file: {}", store.path().display());
    println!(
        "My address: {}",
        state.my_address.as_deref().unwrap_or("(not set)")
    );
    println!("Tracked feeds: {}", state.feeds.len());
    println!("History entries: {}", state.history_count());

    for line in watermark_lines(&state) {
        println!("{line}");
    }
    Ok(())
}

/// The per-feed part of `--show`. Long feed lists collapse to a hint.
fn watermark_lines(state: &AppState) -> Vec<String> {
    let count = state.feeds.len();
    if count == 0 {
        return Vec::new();
    }
    if count > MAX_LISTED_FEEDS {
        return vec![
            String::new(),
            format!("({count} feeds tracked, use --json for full list)"),
        ];
    }

    let mut lines = vec![String::new(), "Last seen:".to_owned()];
    lines.extend(state.feeds.iter().map(|(feed, seen)| {
        format!("  {feed}: {}", format_timestamp(seen.last_seen_timestamp))
    }));
    lines
}

/// `0x` followed by exactly 40 hex digits, either case.
fn is_address(input: &str) -> bool {
    input
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;
    use tempfile::TempDir;
    use test_case::test_case;

    #[derive(clap::Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        args: ConfigArgs,
    }

    fn parse(argv: &[&str]) -> ConfigArgs {
        Cli::try_parse_from(std::iter::once("config").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test_case("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266" => true)]
    #[test_case("0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266" => true)]
    #[test_case("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266" => false; "missing prefix")]
    #[test_case("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb9226" => false; "too short")]
    #[test_case("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb922666" => false; "too long")]
    #[test_case("0xg39Fd6e51aad88F6F4ce6aB8827279cffFb92266" => false; "not hex")]
    fn address_format(input: &str) -> bool {
        is_address(input)
    }

    #[test]
    fn set_then_clear_address() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        parse(&["--my-address", "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266"])
            .run(&store)
            .unwrap();
        assert_eq!(
            store.my_address().unwrap().as_deref(),
            Some("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
        );

        parse(&["--clear-address"]).run(&store).unwrap();
        assert_eq!(store.my_address().unwrap(), None);
    }

    #[test]
    fn malformed_address_is_not_saved() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        assert!(parse(&["--my-address", "0x1234"]).run(&store).is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn forced_reset_deletes_the_file() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.set_last_seen_timestamp("general", 10).unwrap();

        parse(&["--reset", "--force"]).run(&store).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn show_lists_few_feeds_and_summarizes_many() {
        let mut state = AppState::default();
        assert!(watermark_lines(&state).is_empty());

        state.set_last_seen_timestamp("general", 0);
        assert_eq!(
            watermark_lines(&state),
            ["", "Last seen:", "  general: 1970-01-01T00:00:00Z"]
        );

        for i in 0..MAX_LISTED_FEEDS {
            state.set_last_seen_timestamp(&format!("feed-{i}"), 1);
        }
        assert_eq!(
            watermark_lines(&state),
            ["", "(21 feeds tracked, use --json for full list)"]
        );
    }

    #[test]
    fn force_requires_reset() {
        assert!(Cli::try_parse_from(["config", "--force"]).is_err());
    }
}
