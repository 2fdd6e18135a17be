//! Committing renames — the per-item move/conflict policy.

use super::RarRenamer;
use crate::types::{Event, LogEntry, OperationSummary, RenameRequest};
use tracing::{info, warn};

impl RarRenamer {
    /// Rename each selected file to its derived target name
    ///
    /// Items are processed independently — there is no all-or-nothing
    /// transaction and one failure never stops the rest:
    /// - source missing at commit time: recorded as a failure and the
    ///   matching queue entry is dropped (nothing left to retry)
    /// - destination already occupied: recorded as a failure, the queue
    ///   entry stays (retryable once the conflict is resolved)
    /// - otherwise the file is moved; the queue entry is dropped
    ///
    /// Every attempt, success or failure, appends one ledger record. Each
    /// outcome is also emitted as a `Renamed` / `RenameFailed` event so the
    /// presentation layer can update per-row status.
    pub async fn commit_rename(&self, selected: &[RenameRequest]) -> crate::Result<OperationSummary> {
        let mut summary = OperationSummary::default();
        let mut log_entries = Vec::with_capacity(selected.len());

        for request in selected {
            let old_path = request.full_path.clone();
            let new_path = match old_path.parent() {
                Some(dir) => dir.join(&request.new_name),
                None => std::path::PathBuf::from(&request.new_name),
            };

            if tokio::fs::metadata(&old_path).await.is_err() {
                // Nothing to rename and nothing to retry later
                self.drop_queue_entry(&old_path);
                summary.failed += 1;
                let error = "source no longer exists";
                log_entries.push(LogEntry::failed(old_path.clone(), new_path, error));
                self.emit_event(Event::RenameFailed {
                    path: old_path,
                    error: error.to_string(),
                });
                continue;
            }

            if tokio::fs::metadata(&new_path).await.is_ok() {
                summary.failed += 1;
                let error = "target already exists";
                log_entries.push(LogEntry::failed(old_path.clone(), new_path, error));
                self.emit_event(Event::RenameFailed {
                    path: old_path,
                    error: error.to_string(),
                });
                continue;
            }

            match tokio::fs::rename(&old_path, &new_path).await {
                Ok(()) => {
                    info!(
                        old = %old_path.display(),
                        new = %new_path.display(),
                        "file renamed"
                    );
                    self.drop_queue_entry(&old_path);
                    summary.succeeded += 1;
                    log_entries.push(LogEntry::succeeded(old_path.clone(), new_path.clone()));
                    self.emit_event(Event::Renamed { old_path, new_path });
                }
                Err(e) => {
                    // Unexpected move failure; the entry stays queued
                    summary.failed += 1;
                    let error = e.to_string();
                    log_entries.push(LogEntry::failed(
                        old_path.clone(),
                        new_path,
                        error.clone(),
                    ));
                    self.emit_event(Event::RenameFailed {
                        path: old_path,
                        error,
                    });
                }
            }
        }

        self.ledger.append_all(log_entries)?;

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "rename commit finished"
        );

        Ok(summary)
    }

    /// Remove the queue entry for a path after its rename was resolved
    fn drop_queue_entry(&self, path: &std::path::Path) {
        match self.queue.remove_path(path) {
            Ok(true) => self.emit_event(Event::QueueChanged {
                len: self.queue.len(),
            }),
            Ok(false) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to update queue file");
            }
        }
    }
}
