//! Persistent rename ledger

use crate::error::{RenameError, Result};
use crate::types::LogEntry;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Append-only record of rename attempts, reversible until pruned
///
/// Every rename attempt (success or failure) is appended. Successful
/// entries are removed permanently once their reversal succeeds; when the
/// last entry is removed the backing file is deleted outright.
pub struct LedgerStore {
    path: PathBuf,
    entries: Mutex<Vec<LogEntry>>,
}

impl LedgerStore {
    /// Load the ledger from its backing file
    ///
    /// A missing file is an empty ledger; an unreadable or malformed file
    /// is treated as empty with a warning.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<Vec<LogEntry>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ledger file is malformed, starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ledger file unreadable, starting empty");
                Vec::new()
            }
        };

        debug!(path = %path.display(), len = entries.len(), "ledger loaded");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Append a batch of attempt records and rewrite the file once
    pub fn append_all(&self, new_entries: Vec<LogEntry>) -> Result<()> {
        if new_entries.is_empty() {
            return Ok(());
        }
        let mut entries = self.lock();
        entries.extend(new_entries);
        self.save(&entries)
    }

    /// Successful entries, newest first
    pub fn successful_entries(&self) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .rev()
            .filter(|e| e.success)
            .cloned()
            .collect()
    }

    /// Snapshot of every entry, in append order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Number of recorded attempts
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the ledger holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Permanently remove the given entries
    ///
    /// If the ledger becomes empty its backing file is deleted; otherwise
    /// the file is rewritten in full.
    pub fn remove(&self, to_remove: &[LogEntry]) -> Result<()> {
        if to_remove.is_empty() {
            return Ok(());
        }
        let mut entries = self.lock();
        entries.retain(|e| !to_remove.contains(e));

        if entries.is_empty() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.persist_error(e).into()),
            }
        } else {
            self.save(&entries)
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        // A poisoned lock means a writer panicked between mutate and save;
        // the in-memory list is still the best available state.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self, entries: &[LogEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json).map_err(|e| self.persist_error(e))?;
        Ok(())
    }

    fn persist_error(&self, e: std::io::Error) -> RenameError {
        RenameError::PersistFailed {
            what: "ledger",
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}
