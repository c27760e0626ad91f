//! Storage for the session record and the saved app selection.

use chrono::DateTime;
use color_eyre::eyre::WrapErr as _;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::session::Session;

/// File holding the session record.
pub const SESSION_FILE: &str = "app_blocking_prefs.plist";
/// File holding the user's saved selection.
pub const SELECTION_FILE: &str = "selected_apps.plist";

/// Session record storage.
pub trait SessionStore: Send + Sync {
    /// Load the record; the unset record if none exists.
    fn load(&self) -> color_eyre::eyre::Result<Session>;

    /// Replace the whole record.
    fn replace(&self, session: &Session) -> color_eyre::eyre::Result<()>;

    /// Remove the record. Clearing an absent record succeeds.
    fn clear(&self) -> color_eyre::eyre::Result<()>;
}

/// Saved selection of apps to block.
pub trait SelectionStore: Send + Sync {
    fn load_selection(&self) -> color_eyre::eyre::Result<BTreeSet<String>>;

    fn save_selection(&self, apps: &BTreeSet<String>) -> color_eyre::eyre::Result<()>;
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    session: RwLock<Session>,
    selection: RwLock<BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> color_eyre::eyre::Result<Session> {
        Ok(self
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn replace(&self, session: &Session) -> color_eyre::eyre::Result<()> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session.clone();
        Ok(())
    }

    fn clear(&self) -> color_eyre::eyre::Result<()> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Session::default();
        Ok(())
    }
}

impl SelectionStore for MemoryStore {
    fn load_selection(&self) -> color_eyre::eyre::Result<BTreeSet<String>> {
        Ok(self
            .selection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_selection(&self, apps: &BTreeSet<String>) -> color_eyre::eyre::Result<()> {
        *self.selection.write().unwrap_or_else(PoisonError::into_inner) = apps.clone();
        Ok(())
    }
}

/// On-disk layout of the session record.
///
/// `blocking_end_time` is milliseconds since the epoch, `0` meaning unset.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionRecord {
    #[serde(default)]
    blocked_apps: Vec<String>,
    #[serde(default)]
    blocking_end_time: i64,
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self {
            blocked_apps: session.blocked.iter().cloned().collect(),
            blocking_end_time: session
                .expires_at
                .map_or(0, |end| end.timestamp_millis()),
        }
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        let expires_at = if record.blocking_end_time > 0 {
            DateTime::from_timestamp_millis(record.blocking_end_time)
        } else {
            None
        };

        match expires_at {
            Some(end) => Session {
                blocked: record.blocked_apps.into_iter().collect(),
                expires_at: Some(end),
            },
            None => Session::default(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SelectionRecord {
    #[serde(default)]
    selected_apps_for_blocking: Vec<String>,
}

/// Plist files under a state directory.
#[derive(Debug, Clone)]
pub struct PlistFileStore {
    dir: PathBuf,
}

impl PlistFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn selection_path(&self) -> PathBuf {
        self.dir.join(SELECTION_FILE)
    }
}

impl SessionStore for PlistFileStore {
    fn load(&self) -> color_eyre::eyre::Result<Session> {
        let record: Option<SessionRecord> = read_plist(&self.session_path())?;
        Ok(record.map(Session::from).unwrap_or_default())
    }

    fn replace(&self, session: &Session) -> color_eyre::eyre::Result<()> {
        write_plist(&self.session_path(), &SessionRecord::from(session))
    }

    fn clear(&self) -> color_eyre::eyre::Result<()> {
        remove_if_exists(&self.session_path())
    }
}

impl SelectionStore for PlistFileStore {
    fn load_selection(&self) -> color_eyre::eyre::Result<BTreeSet<String>> {
        let record: Option<SelectionRecord> = read_plist(&self.selection_path())?;
        Ok(record
            .map(|r| r.selected_apps_for_blocking.into_iter().collect())
            .unwrap_or_default())
    }

    fn save_selection(&self, apps: &BTreeSet<String>) -> color_eyre::eyre::Result<()> {
        let record = SelectionRecord {
            selected_apps_for_blocking: apps.iter().cloned().collect(),
        };
        write_plist(&self.selection_path(), &record)
    }
}

/// Read a plist file, `None` if it does not exist.
pub(crate) fn read_plist<T: DeserializeOwned>(path: &Path) -> color_eyre::eyre::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let value = plist::from_file(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Ok(Some(value))
}

/// Write a plist file via a sibling temp file and rename.
pub(crate) fn write_plist<T: Serialize>(path: &Path, value: &T) -> color_eyre::eyre::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }

    let tmp = path.with_extension("plist.tmp");
    plist::to_file_xml(&tmp, value)
        .wrap_err_with(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .wrap_err_with(|| format!("failed to move {} into place", tmp.display()))?;

    Ok(())
}

pub(crate) fn remove_if_exists(path: &Path) -> color_eyre::eyre::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).wrap_err_with(|| format!("failed to remove {}", path.display())),
    }
}
