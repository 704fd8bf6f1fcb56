//! File-backed persistence of [`AppState`].
//!
//! Every accessor is a synchronous load, mutate, save cycle against the file.
//! Two processes running at the same time race on that cycle and the last
//! save wins; nothing here locks the file.

use std::{
    ffi::OsString,
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::{debug, warn};

use crate::{
    history::{HistoryEntry, HistoryEntryType, NewHistoryEntry},
    state::{AppState, Timestamped, max_timestamp, normalize_feed_name},
};

/// Directory under the user's home holding the state file.
pub const STATE_DIR_NAME: &str = ".botchan";
pub const STATE_FILE_NAME: &str = "state.json";
/// Suffix of the per-save temp files next to the state file.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Result of reading the state file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Loaded {
    /// The file parsed, or did not exist.
    Clean(AppState),
    /// The file existed but could not be parsed; an empty state stands in.
    RecoveredFromCorruption(AppState),
}

impl Loaded {
    pub fn into_state(self) -> AppState {
        match self {
            Self::Clean(state) | Self::RecoveredFromCorruption(state) => state,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::RecoveredFromCorruption(_))
    }
}

/// Handle on the state file at a fixed path.
#[derive(Clone, Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The per-user store at `~/.botchan/state.json`.
    pub fn from_home() -> Result<Self, StateError> {
        let home = dirs::home_dir().ok_or(StateErrorKind::NoHomeDir)?;
        Ok(Self::new(home.join(STATE_DIR_NAME).join(STATE_FILE_NAME)))
    }

    /// Path of the state file, for display only.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the state file lives in; temp files are created here so the
    /// final rename never crosses a filesystem.
    fn directory(&self) -> &Path {
        self.path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// `state.json.` for the default file, so temp files read as
    /// `state.json.<random>.tmp`.
    fn temp_prefix(&self) -> OsString {
        let mut prefix = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| STATE_FILE_NAME.into());
        prefix.push(".");
        prefix
    }

    pub fn ensure_directory(&self) -> Result<(), StateError> {
        let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) else {
            return Ok(());
        };
        fs::create_dir_all(dir).map_err(|source| StateErrorKind::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Reads the state, reporting whether a corrupt file was replaced by an
    /// empty state. Only a missing file and unparsable contents are absorbed.
    pub fn load_with_outcome(&self) -> Result<Loaded, StateError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Loaded::Clean(AppState::default()));
            }
            Err(source) => {
                return Err(StateErrorKind::Read {
                    path: self.path.clone(),
                    source,
                }
                .into());
            }
        };

        match serde_json::from_slice::<AppState>(&raw) {
            Ok(state) => Ok(Loaded::Clean(state)),
            Err(err) => {
                debug!(
                    path = %self.path.display(),
                    %err,
                    "state file is unreadable, starting from empty state"
                );
                Ok(Loaded::RecoveredFromCorruption(AppState::default()))
            }
        }
    }

    pub fn load(&self) -> Result<AppState, StateError> {
        self.load_with_outcome().map(Loaded::into_state)
    }

    /// Writes `state` to a uniquely named sibling temp file and renames it
    /// over the target, so readers see either the old or the new document in
    /// full. Concurrent saves each use their own temp file; the last rename
    /// wins.
    pub fn save(&self, state: &AppState) -> Result<(), StateError> {
        self.ensure_directory()?;

        let json = serde_json::to_vec_pretty(state).map_err(StateErrorKind::Serialize)?;
        let dir = self.directory();

        // Dropping `temp` on any error path below removes the file.
        let mut temp = tempfile::Builder::new()
            .prefix(&self.temp_prefix())
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|source| StateErrorKind::Write {
                path: dir.to_path_buf(),
                source,
            })?;

        if let Err(source) = write_synced(temp.as_file_mut(), &json) {
            return Err(StateErrorKind::Write {
                path: temp.path().to_path_buf(),
                source,
            }
            .into());
        }

        temp.persist(&self.path)
            .map_err(|err| StateErrorKind::Rename {
                from: err.file.path().to_path_buf(),
                to: self.path.clone(),
                source: err.error,
            })?;

        debug!(path = %self.path.display(), bytes = json.len(), "saved state");
        Ok(())
    }

    /// Deletes the state file. A missing file is not an error.
    pub fn reset(&self) -> Result<(), StateError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed state file");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StateErrorKind::Remove {
                path: self.path.clone(),
                source,
            }
            .into()),
        }
    }

    fn update<T>(&self, f: impl FnOnce(&mut AppState) -> T) -> Result<T, StateError> {
        let mut state = self.load()?;
        let out = f(&mut state);
        self.save(&state)?;
        Ok(out)
    }

    pub fn last_seen_timestamp(&self, feed: &str) -> Result<Option<u64>, StateError> {
        Ok(self.load()?.last_seen_timestamp(feed))
    }

    /// Sets the watermark unconditionally; callers must not pass a value
    /// older than the current one unless they mean to rewind.
    pub fn set_last_seen_timestamp(&self, feed: &str, timestamp: u64) -> Result<(), StateError> {
        self.update(|state| state.set_last_seen_timestamp(feed, timestamp))
    }

    /// Moves the watermark of `feed` (lowercased) to the newest timestamp in
    /// `posts`. Does nothing when `posts` is empty.
    ///
    /// The watermark only advances in practice because callers pass the full
    /// unseen batch; a batch of older posts rewinds it.
    pub fn mark_feed_seen<I>(&self, feed: &str, posts: I) -> Result<(), StateError>
    where
        I: IntoIterator,
        I::Item: Timestamped,
    {
        let Some(latest) = max_timestamp(posts) else {
            return Ok(());
        };
        self.set_last_seen_timestamp(&normalize_feed_name(feed), latest)
    }

    pub fn my_address(&self) -> Result<Option<String>, StateError> {
        Ok(self.load()?.my_address)
    }

    pub fn set_my_address(&self, address: &str) -> Result<(), StateError> {
        self.update(|state| state.set_my_address(address))
    }

    pub fn clear_my_address(&self) -> Result<(), StateError> {
        self.update(AppState::clear_my_address)
    }

    /// Stamps `entry` with the current time and records it as the newest
    /// history item.
    pub fn add_history_entry(&self, entry: NewHistoryEntry) -> Result<(), StateError> {
        let entry = entry.stamp(unix_now());
        self.update(|state| state.push_history(entry))
    }

    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, StateError> {
        Ok(self.load()?.history(limit))
    }

    pub fn history_by_type(
        &self,
        kind: HistoryEntryType,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryEntry>, StateError> {
        Ok(self.load()?.history_by_type(kind, limit))
    }

    pub fn clear_history(&self) -> Result<(), StateError> {
        self.update(AppState::clear_history)
    }

    pub fn history_count(&self) -> Result<usize, StateError> {
        Ok(self.load()?.history_count())
    }
}

fn write_synced(file: &mut fs::File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.sync_all()
}

fn unix_now() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs(),
        Err(err) => {
            warn!(%err, "system clock is before the unix epoch");
            0
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StateError(StateErrorKind);

impl StateError {
    /// The underlying I/O error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match &self.0 {
            StateErrorKind::CreateDir { source, .. }
            | StateErrorKind::Read { source, .. }
            | StateErrorKind::Write { source, .. }
            | StateErrorKind::Rename { source, .. }
            | StateErrorKind::Remove { source, .. } => Some(source),
            StateErrorKind::NoHomeDir | StateErrorKind::Serialize(_) => None,
        }
    }
}

impl From<StateErrorKind> for StateError {
    fn from(value: StateErrorKind) -> Self {
        Self(value)
    }
}

#[derive(Debug, thiserror::Error)]
enum StateErrorKind {
    #[error("could not determine the home directory")]
    NoHomeDir,
    #[error("failed creating state directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed reading state file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed serializing state")]
    Serialize(#[source] serde_json::Error),
    #[error("failed writing temporary state file {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed moving {from:?} over {to:?}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed removing state file {path:?}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
