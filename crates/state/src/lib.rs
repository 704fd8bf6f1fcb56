//! Local state cache for the botchan CLI.
//!
//! Everything lives in one JSON file that is re-read on every access and
//! rewritten in full on every mutation. The chain is the source of truth for
//! posts and registrations; this file only remembers what the local user has
//! already seen and what they wrote.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod history;
pub mod state;
pub mod store;

pub use history::{HistoryEntry, HistoryEntryType, MAX_HISTORY_ENTRIES, NewHistoryEntry};
pub use state::{AppState, FeedState, Timestamped, normalize_feed_name};
pub use store::{Loaded, StateError, StateStore};
