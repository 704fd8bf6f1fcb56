use botchan_state::{HistoryEntry, HistoryEntryType, StateStore};
use eyre::WrapErr as _;

use super::{confirm, format_timestamp, print_json};

/// Post text is cut to this many characters in the listing.
const PREVIEW_CHARS: usize = 60;

#[derive(clap::Args, Debug)]
pub(crate) struct HistoryArgs {
    /// Only show entries of this type (post, comment, register)
    #[arg(long = "type", value_name = "TYPE")]
    kind: Option<HistoryEntryType>,

    /// Show at most this many entries, newest first
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,

    /// Delete all history entries
    #[arg(long, conflicts_with_all = ["kind", "limit"])]
    clear: bool,

    /// Skip the confirmation prompt of --clear
    #[arg(long, requires = "clear")]
    force: bool,
}

impl HistoryArgs {
    pub(crate) fn run(self, store: &StateStore) -> eyre::Result<()> {
        if self.clear {
            return clear(store, self.force);
        }

        let entries = match self.kind {
            Some(kind) => store.history_by_type(kind, self.limit),
            None => store.history(self.limit),
        }
        .wrap_err("failed reading history")?;

        if self.json {
            return print_json(&entries);
        }

        if entries.is_empty() {
            println!("No history yet");
            return Ok(());
        }
        for entry in &entries {
            println!("{}", describe(entry));
        }
        Ok(())
    }
}

fn clear(store: &StateStore, force: bool) -> eyre::Result<()> {
    let count = store.history_count().wrap_err("failed reading history")?;
    if count == 0 {
        println!("History is already empty");
        return Ok(());
    }
    if !force && !confirm(&format!("Delete {count} history entries?"))? {
        println!("Aborted");
        return Ok(());
    }
    store.clear_history().wrap_err("failed clearing history")?;
    println!("Cleared {count} history entries");
    Ok(())
}

fn describe(entry: &HistoryEntry) -> String {
    let mut line = format!(
        "{}  {:<8}  {}  chain {}  {}",
        format_timestamp(entry.timestamp),
        entry.kind.as_str(),
        entry.feed,
        entry.chain_id,
        entry.tx_hash,
    );
    if let Some(text) = &entry.text {
        line.push_str("\n    ");
        line.push_str(&preview(text));
    }
    line
}

/// First line of `text`, cut to [`PREVIEW_CHARS`].
fn preview(text: &str) -> String {
    let first = text.lines().next().unwrap_or_default();
    if first.chars().count() > PREVIEW_CHARS {
        let cut: String = first.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        first.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botchan_state::NewHistoryEntry;
    use clap::Parser as _;
    use tempfile::TempDir;

    #[derive(clap::Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        args: HistoryArgs,
    }

    fn parse(argv: &[&str]) -> Result<HistoryArgs, clap::Error> {
        Cli::try_parse_from(std::iter::once("history").chain(argv.iter().copied()))
            .map(|cli| cli.args)
    }

    #[test]
    fn type_filter_parses() {
        let args = parse(&["--type", "register", "--limit", "5"]).unwrap();
        assert_eq!(args.kind, Some(HistoryEntryType::Register));
        assert_eq!(args.limit, Some(5));
        assert!(parse(&["--type", "like"]).is_err());
    }

    #[test]
    fn clear_conflicts_with_filters() {
        assert!(parse(&["--clear", "--limit", "3"]).is_err());
        assert!(parse(&["--force"]).is_err());
    }

    #[test]
    fn forced_clear_empties_history() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store
            .add_history_entry(NewHistoryEntry::new(
                HistoryEntryType::Post,
                "0xabc",
                8453,
                "general",
            ))
            .unwrap();
        store.set_last_seen_timestamp("general", 7).unwrap();

        parse(&["--clear", "--force"]).unwrap().run(&store).unwrap();
        assert_eq!(store.history_count().unwrap(), 0);
        assert_eq!(store.last_seen_timestamp("general").unwrap(), Some(7));
    }

    #[test]
    fn preview_takes_first_line() {
        assert_eq!(preview("title\n\nbody"), "title");
        let long = "x".repeat(PREVIEW_CHARS + 1);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(PREVIEW_CHARS)));
    }
}
