//! Snapshot-backed in-memory store
//!
//! The store holds four ordered sequences (page views, events, users,
//! sessions) and persists them as one JSON document, rewritten in full
//! after every mutation. There is no incremental persistence and no
//! transaction boundary wider than a single operation.
//!
//! ## Durability policy
//!
//! Persistence is best-effort: a failed write is logged and swallowed,
//! and the in-memory mutation stands. The last successful write is the
//! durable state. Loading is equally forgiving — a missing or
//! unparseable snapshot file yields an empty store, never an error.

use crate::error::Result;
use crate::types::{Event, PageView, Session, User};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The complete persisted form of the store.
///
/// Field names match the wire shape:
/// `{pageViews:[...], events:[...], users:[...], sessions:[...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub page_views: Vec<PageView>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// In-memory analytics state backed by a single JSON snapshot file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: Snapshot,
}

impl Store {
    /// Open a store backed by the given snapshot file.
    ///
    /// Best-effort load: a missing file starts an empty store, and a
    /// malformed snapshot is logged and replaced with an empty store.
    /// Never fails.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match read_snapshot(&path) {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    path = %path.display(),
                    page_views = snapshot.page_views.len(),
                    events = snapshot.events.len(),
                    users = snapshot.users.len(),
                    "Loaded snapshot"
                );
                snapshot
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "No snapshot file, starting empty");
                Snapshot::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load snapshot, starting empty"
                );
                Snapshot::default()
            }
        };

        Self { path, data }
    }

    /// Path of the backing snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full in-memory state, in snapshot shape.
    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    /// Persist the full in-memory state over the snapshot file.
    ///
    /// Write failures are logged and swallowed; the triggering
    /// mutation is not rolled back.
    pub fn save(&self) {
        if let Err(e) = write_snapshot(&self.path, &self.data) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist snapshot, in-memory state retained"
            );
        }
    }

    /// Reset all four sequences to empty and persist immediately.
    pub fn clear(&mut self) {
        self.data = Snapshot::default();
        self.save();
    }

    // ----- read access -----

    pub fn page_views(&self) -> &[PageView] {
        &self.data.page_views
    }

    pub fn events(&self) -> &[Event] {
        &self.data.events
    }

    pub fn users(&self) -> &[User] {
        &self.data.users
    }

    pub fn sessions(&self) -> &[Session] {
        &self.data.sessions
    }

    // ----- mutation, used by the ingest operations -----

    pub(crate) fn push_page_view(&mut self, page_view: PageView) {
        self.data.page_views.push(page_view);
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.data.events.push(event);
    }

    pub(crate) fn push_user(&mut self, user: User) {
        self.data.users.push(user);
    }

    pub(crate) fn users_mut(&mut self) -> &mut [User] {
        &mut self.data.users
    }
}

/// Read and parse the snapshot file.
///
/// `Ok(None)` means the file does not exist; parse and IO failures are
/// real errors so the caller can log them distinctly.
fn read_snapshot(path: &Path) -> Result<Option<Snapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&content)?;
    Ok(Some(snapshot))
}

/// Serialize the snapshot and rewrite the file in full.
fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fresh_id;
    use chrono::Utc;
    use tempfile::TempDir;

    fn page_view(page: &str, user_id: &str) -> PageView {
        PageView {
            id: fresh_id("pv"),
            timestamp: Utc::now(),
            page: page.to_string(),
            user_id: user_id.to_string(),
            session_id: fresh_id("sess"),
            referrer: String::new(),
            user_agent: String::new(),
        }
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("analytics.json"));
        assert!(store.page_views().is_empty());
        assert!(store.events().is_empty());
        assert!(store.users().is_empty());
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn open_malformed_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analytics.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let store = Store::open(&path);
        assert!(store.page_views().is_empty());
    }

    #[test]
    fn save_and_reload_round_trips_sequences_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analytics.json");

        let mut store = Store::open(&path);
        store.push_page_view(page_view("/home", "u1"));
        store.push_page_view(page_view("/about", "u2"));
        store.push_page_view(page_view("/home", "u1"));
        store.save();

        let reloaded = Store::open(&path);
        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert_eq!(reloaded.page_views()[0].page, "/home");
        assert_eq!(reloaded.page_views()[1].page, "/about");
    }

    #[test]
    fn clear_resets_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analytics.json");

        let mut store = Store::open(&path);
        store.push_page_view(page_view("/home", "u1"));
        store.save();

        store.clear();
        assert!(store.page_views().is_empty());

        let reloaded = Store::open(&path);
        assert!(reloaded.page_views().is_empty());
    }

    #[test]
    fn save_failure_keeps_memory_intact() {
        let dir = TempDir::new().unwrap();
        // Directory in place of the snapshot file makes the write fail.
        let path = dir.path().join("analytics.json");
        std::fs::create_dir_all(&path).unwrap();

        let mut store = Store::open(&path);
        store.push_page_view(page_view("/home", "u1"));
        store.save();
        assert_eq!(store.page_views().len(), 1);
    }

    #[test]
    fn snapshot_parses_legacy_shape_with_missing_arrays() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analytics.json");
        std::fs::write(&path, r#"{"pageViews":[],"events":[]}"#).unwrap();

        let store = Store::open(&path);
        assert!(store.users().is_empty());
        assert!(store.sessions().is_empty());
    }
}
