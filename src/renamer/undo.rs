//! Selective reversal of completed renames.

use super::RarRenamer;
use crate::types::{Event, LogEntry, OperationSummary};
use tracing::{info, warn};

impl RarRenamer {
    /// Successfully completed renames, newest first
    ///
    /// These are the ledger entries eligible for [`undo`](RarRenamer::undo).
    pub fn successful_entries(&self) -> Vec<LogEntry> {
        self.ledger.successful_entries()
    }

    /// Reverse the selected renames, independently per entry
    ///
    /// - the renamed file no longer exists at its recorded new path:
    ///   failure, entry retained
    /// - a file already occupies the original old path: failure (reversing
    ///   would silently overwrite it), entry retained
    /// - otherwise the file is moved back and the ledger entry is deleted
    ///   permanently
    ///
    /// If the ledger ends up empty its backing file is removed entirely.
    /// Failed-attempt entries in the selection are skipped; there is
    /// nothing to reverse.
    pub async fn undo(&self, selected: &[LogEntry]) -> crate::Result<OperationSummary> {
        let mut summary = OperationSummary::default();
        let mut reversed = Vec::new();

        for entry in selected.iter().filter(|e| e.success) {
            if tokio::fs::metadata(&entry.new_path).await.is_err() {
                summary.failed += 1;
                self.emit_event(Event::UndoFailed {
                    path: entry.new_path.clone(),
                    error: "renamed file no longer exists".to_string(),
                });
                continue;
            }

            if tokio::fs::metadata(&entry.old_path).await.is_ok() {
                summary.failed += 1;
                self.emit_event(Event::UndoFailed {
                    path: entry.new_path.clone(),
                    error: "a file already exists at the original path".to_string(),
                });
                continue;
            }

            match tokio::fs::rename(&entry.new_path, &entry.old_path).await {
                Ok(()) => {
                    info!(
                        restored = %entry.old_path.display(),
                        from = %entry.new_path.display(),
                        "rename reversed"
                    );
                    summary.succeeded += 1;
                    reversed.push(entry.clone());
                    self.emit_event(Event::Undone {
                        old_path: entry.old_path.clone(),
                        new_path: entry.new_path.clone(),
                    });
                }
                Err(e) => {
                    warn!(
                        path = %entry.new_path.display(),
                        error = %e,
                        "failed to reverse rename"
                    );
                    summary.failed += 1;
                    self.emit_event(Event::UndoFailed {
                        path: entry.new_path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.ledger.remove(&reversed)?;

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "undo finished"
        );

        Ok(summary)
    }
}
