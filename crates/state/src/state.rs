//! The persisted root document and its per-feed watermarks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;

/// Root of the state file.
///
/// Top-level fields this version does not know about are kept in `extra` and
/// written back untouched, so an older binary never strips data written by a
/// newer one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub feeds: BTreeMap<String, FeedState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_address: Option<String>,

    #[serde(
        default,
        deserialize_with = "crate::history::deserialize_history",
        skip_serializing_if = "Option::is_none"
    )]
    pub history: Option<Vec<HistoryEntry>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    pub last_seen_timestamp: u64,
}

/// Anything carrying a chain timestamp, in unix seconds.
pub trait Timestamped {
    fn timestamp(&self) -> u64;
}

impl Timestamped for u64 {
    fn timestamp(&self) -> u64 {
        *self
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn timestamp(&self) -> u64 {
        (**self).timestamp()
    }
}

impl AppState {
    pub fn last_seen_timestamp(&self, feed: &str) -> Option<u64> {
        self.feeds.get(feed).map(|f| f.last_seen_timestamp)
    }

    /// Upserts the watermark for `feed`.
    ///
    /// There is no monotonicity check: a smaller `timestamp` moves the
    /// watermark backwards.
    pub fn set_last_seen_timestamp(&mut self, feed: &str, timestamp: u64) {
        self.feeds
            .entry(feed.to_owned())
            .and_modify(|f| f.last_seen_timestamp = timestamp)
            .or_insert(FeedState {
                last_seen_timestamp: timestamp,
            });
    }

    pub fn set_my_address(&mut self, address: &str) {
        self.my_address = Some(address.to_lowercase());
    }

    pub fn clear_my_address(&mut self) {
        self.my_address = None;
    }
}

/// Returns the newest timestamp in `posts`, or `None` if there are none.
pub fn max_timestamp<I>(posts: I) -> Option<u64>
where
    I: IntoIterator,
    I::Item: Timestamped,
{
    posts.into_iter().map(|p| p.timestamp()).max()
}

/// Feed names are compared case-insensitively by lowercasing at the edges.
/// The lowercase form is also the topic posts are sent under.
pub fn normalize_feed_name(feed: &str) -> String {
    feed.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post {
        timestamp: u64,
    }

    impl Timestamped for Post {
        fn timestamp(&self) -> u64 {
            self.timestamp
        }
    }

    #[test]
    fn max_timestamp_beyond_f64_precision() {
        let big = (1u64 << 60) + 1;
        let posts = [Post { timestamp: big - 1 }, Post { timestamp: big }];
        assert_eq!(max_timestamp(&posts), Some(big));
    }

    #[test]
    fn max_timestamp_of_nothing() {
        assert_eq!(max_timestamp(Vec::<u64>::new()), None);
    }

    #[test]
    fn set_watermark_creates_then_overwrites() {
        let mut state = AppState::default();
        assert_eq!(state.last_seen_timestamp("alpha"), None);

        state.set_last_seen_timestamp("alpha", 10);
        state.set_last_seen_timestamp("alpha", 3);
        assert_eq!(state.last_seen_timestamp("alpha"), Some(3));
        assert_eq!(state.feeds.len(), 1);
    }

    #[test]
    fn empty_document_parses() {
        let state: AppState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let mut state = AppState::default();
        state.set_last_seen_timestamp("general", 1_700_000_000);
        state.set_my_address("0xABC");

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "feeds": { "general": { "lastSeenTimestamp": 1_700_000_000u64 } },
                "myAddress": "0xabc",
            })
        );
    }
}
