//! Bounded log of the local user's own write actions.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::state::AppState;

/// Entries beyond this count are dropped from the tail.
pub const MAX_HISTORY_ENTRIES: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryEntryType {
    Post,
    Comment,
    Register,
}

impl HistoryEntryType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Register => "register",
        }
    }
}

impl fmt::Display for HistoryEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HistoryEntryType {
    type Err = UnknownEntryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            "register" => Ok(Self::Register),
            other => Err(UnknownEntryType(other.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown history entry type `{0}`, expected one of post, comment, register")]
pub struct UnknownEntryType(String);

/// A recorded write action. `timestamp` is local capture time, not block time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: HistoryEntryType,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub chain_id: u64,
    #[serde(default)]
    pub feed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

/// A history entry before it is stamped with the capture time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub kind: HistoryEntryType,
    pub tx_hash: String,
    pub chain_id: u64,
    pub feed: String,
    pub sender: Option<String>,
    pub text: Option<String>,
    pub post_id: Option<String>,
}

impl NewHistoryEntry {
    pub fn new(
        kind: HistoryEntryType,
        tx_hash: impl Into<String>,
        chain_id: u64,
        feed: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            tx_hash: tx_hash.into(),
            chain_id,
            feed: feed.into(),
            sender: None,
            text: None,
            post_id: None,
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_post_id(mut self, post_id: impl Into<String>) -> Self {
        self.post_id = Some(post_id.into());
        self
    }

    pub fn stamp(self, timestamp: u64) -> HistoryEntry {
        let Self {
            kind,
            tx_hash,
            chain_id,
            feed,
            sender,
            text,
            post_id,
        } = self;
        HistoryEntry {
            kind,
            timestamp,
            tx_hash,
            chain_id,
            feed,
            sender,
            text,
            post_id,
        }
    }
}

/// Reads the stored history list entry by entry. Entries that do not parse
/// (unknown `type`, wrong field types) are dropped on their own, and a
/// `history` value that is not a list counts as absent, so neither can turn
/// the whole file into a parse failure.
pub(crate) fn deserialize_history<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<HistoryEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(raw)) => raw,
        None => return Ok(None),
        Some(other) => {
            debug!(value = %other, "ignoring history that is not a list");
            return Ok(None);
        }
    };

    let entries = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<HistoryEntry>(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(%err, "dropping unreadable history entry");
                None
            }
        })
        .collect();
    Ok(Some(entries))
}

/// Applies the "falsy limit means everything" rule: `None` and `Some(0)`
/// both return the whole slice.
fn take_limit<T>(items: impl Iterator<Item = T>, limit: Option<usize>) -> Vec<T> {
    match limit {
        Some(n) if n > 0 => items.take(n).collect(),
        _ => items.collect(),
    }
}

impl AppState {
    /// Prepends `entry` and evicts from the tail past [`MAX_HISTORY_ENTRIES`].
    pub fn push_history(&mut self, entry: HistoryEntry) {
        let history = self.history.get_or_insert_with(Vec::new);
        history.insert(0, entry);
        history.truncate(MAX_HISTORY_ENTRIES);
    }

    /// Most recent first.
    pub fn history(&self, limit: Option<usize>) -> Vec<HistoryEntry> {
        take_limit(self.history_slice().iter().cloned(), limit)
    }

    pub fn history_by_type(&self, kind: HistoryEntryType, limit: Option<usize>) -> Vec<HistoryEntry> {
        take_limit(
            self.history_slice()
                .iter()
                .filter(|e| e.kind == kind)
                .cloned(),
            limit,
        )
    }

    pub fn history_count(&self) -> usize {
        self.history_slice().len()
    }

    /// Leaves an empty, present history list behind.
    pub fn clear_history(&mut self) {
        self.history = Some(Vec::new());
    }

    fn history_slice(&self) -> &[HistoryEntry] {
        self.history.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn entry(kind: HistoryEntryType, tx: &str) -> HistoryEntry {
        NewHistoryEntry::new(kind, tx, 8453, "general").stamp(1)
    }

    #[test_case("post", HistoryEntryType::Post)]
    #[test_case("comment", HistoryEntryType::Comment)]
    #[test_case("register", HistoryEntryType::Register)]
    fn entry_type_parses(input: &str, expected: HistoryEntryType) {
        assert_eq!(input.parse::<HistoryEntryType>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn entry_type_rejects_unknown() {
        assert!("Post".parse::<HistoryEntryType>().is_err());
    }

    #[test]
    fn push_prepends_and_caps() {
        let mut state = AppState::default();
        for i in 0..MAX_HISTORY_ENTRIES + 5 {
            state.push_history(entry(HistoryEntryType::Post, &format!("0x{i}")));
        }
        let history = state.history(None);
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history[0].tx_hash, format!("0x{}", MAX_HISTORY_ENTRIES + 4));
        assert_eq!(history.last().unwrap().tx_hash, "0x5");
    }

    #[test_case(None, 3 ; "no limit")]
    #[test_case(Some(0), 3 ; "zero means all")]
    #[test_case(Some(2), 2 ; "limited")]
    #[test_case(Some(10), 3 ; "limit past end")]
    fn limit_rules(limit: Option<usize>, expected: usize) {
        let mut state = AppState::default();
        for tx in ["a", "b", "c"] {
            state.push_history(entry(HistoryEntryType::Comment, tx));
        }
        assert_eq!(state.history(limit).len(), expected);
    }

    #[test]
    fn count_without_history_is_zero() {
        assert_eq!(AppState::default().history_count(), 0);
    }

    #[test]
    fn clear_keeps_an_empty_list() {
        let mut state = AppState::default();
        state.push_history(entry(HistoryEntryType::Register, "0x1"));
        state.clear_history();
        assert_eq!(state.history, Some(Vec::new()));
    }

    #[test]
    fn entry_wire_format() {
        let entry = NewHistoryEntry::new(HistoryEntryType::Post, "0xdead", 8453, "general")
            .with_sender("0xabc")
            .with_text("gm")
            .stamp(1_700_000_000);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({
                "type": "post",
                "timestamp": 1_700_000_000u64,
                "txHash": "0xdead",
                "chainId": 8453,
                "feed": "general",
                "sender": "0xabc",
                "text": "gm",
            })
        );
    }
}
