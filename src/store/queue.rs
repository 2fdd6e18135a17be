//! Persistent rename queue

use crate::error::{RenameError, Result};
use crate::types::QueueEntry;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Session-independent queue of files accepted for renaming
///
/// Entries are deduplicated by `full_path` and persisted to a JSON file on
/// every mutation. Clearing the queue removes the backing file outright.
pub struct QueueStore {
    path: PathBuf,
    entries: Mutex<Vec<QueueEntry>>,
}

impl QueueStore {
    /// Load the queue from its backing file
    ///
    /// A missing file is an empty queue. An unreadable or malformed file is
    /// also treated as empty (with a warning) rather than failing startup —
    /// the queue is convenience state, not critical data.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<Vec<QueueEntry>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "queue file is malformed, starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "queue file unreadable, starting empty");
                Vec::new()
            }
        };

        debug!(path = %path.display(), len = entries.len(), "queue loaded");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Snapshot of the current entries
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.lock().clone()
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Add one entry; a duplicate `full_path` is a no-op
    ///
    /// Returns `true` when the entry was added.
    pub fn add(&self, entry: QueueEntry) -> Result<bool> {
        let mut entries = self.lock();
        if entries.iter().any(|e| e.full_path == entry.full_path) {
            return Ok(false);
        }
        entries.push(entry);
        self.save(&entries)?;
        Ok(true)
    }

    /// Add several entries, skipping duplicates
    ///
    /// Returns the number of entries actually added. The file is rewritten
    /// once, after all additions.
    pub fn add_all(&self, new_entries: Vec<QueueEntry>) -> Result<usize> {
        let mut entries = self.lock();
        let before = entries.len();
        for entry in new_entries {
            if !entries.iter().any(|e| e.full_path == entry.full_path) {
                entries.push(entry);
            }
        }
        let added = entries.len() - before;
        if added > 0 {
            self.save(&entries)?;
        }
        Ok(added)
    }

    /// Remove the entry for `path`, if present
    ///
    /// Returns `true` when an entry was removed.
    pub fn remove_path(&self, path: &Path) -> Result<bool> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|e| e.full_path != path);
        if entries.len() == before {
            return Ok(false);
        }
        self.save(&entries)?;
        Ok(true)
    }

    /// Re-read the backing file, replacing the in-memory entries
    ///
    /// Same tolerance as [`load`](QueueStore::load): a missing or
    /// unreadable file leaves the queue empty. Returns the new length.
    pub fn reload(&self) -> usize {
        let fresh = match std::fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str::<Vec<QueueEntry>>(&json).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "queue file is malformed, reloading empty");
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "queue file unreadable, reloading empty");
                Vec::new()
            }
        };

        let mut entries = self.lock();
        *entries = fresh;
        entries.len()
    }

    /// Drop every entry and delete the backing file
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.lock();
        entries.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.persist_error(e).into()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<QueueEntry>> {
        // A poisoned lock means a writer panicked between mutate and save;
        // the in-memory list is still the best available state.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self, entries: &[QueueEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json).map_err(|e| self.persist_error(e))?;
        Ok(())
    }

    fn persist_error(&self, e: std::io::Error) -> RenameError {
        RenameError::PersistFailed {
            what: "queue",
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}
