//! The persistent rename queue — session-independent curation.

use super::RarRenamer;
use crate::types::{Event, QueueEntry, ScanItem};
use tracing::info;

impl RarRenamer {
    /// Accept scan rows into the persistent queue
    ///
    /// Rows without a derived target name are skipped; rows whose path is
    /// already queued are a no-op. Returns the number of entries actually
    /// added. The queue file is rewritten once.
    pub fn add_to_queue(&self, items: &[ScanItem]) -> crate::Result<usize> {
        let entries: Vec<QueueEntry> = items.iter().filter_map(QueueEntry::from_item).collect();
        let added = self.queue.add_all(entries)?;

        if added > 0 {
            info!(added, len = self.queue.len(), "items queued for rename");
            self.emit_event(Event::QueueChanged {
                len: self.queue.len(),
            });
        }

        Ok(added)
    }

    /// Drop every queued entry and delete the queue file
    pub fn clear_queue(&self) -> crate::Result<()> {
        self.queue.clear()?;
        info!("rename queue cleared");
        self.emit_event(Event::QueueChanged { len: 0 });
        Ok(())
    }

    /// Snapshot of the queued entries
    pub fn queue_entries(&self) -> Vec<QueueEntry> {
        self.queue.entries()
    }

    /// Re-read the queue file, replacing the in-memory entries
    ///
    /// Useful when another process (or the user) edited the file. Returns
    /// the number of entries after the reload.
    pub fn reload_queue(&self) -> usize {
        let len = self.queue.reload();
        self.emit_event(Event::QueueChanged { len });
        len
    }

    /// Whether any entries are queued
    pub fn has_queue(&self) -> bool {
        !self.queue.is_empty()
    }
}
