//! Scan session orchestration — worker fan-out, pause gating, batch delivery.

use super::{RarRenamer, SessionHandle};
use crate::error::{Error, Result, ScanError};
use crate::inspector::ArchiveInspector;
use crate::parallelism::{clamp_workers, optimal_workers};
use crate::types::{Event, ScanId, ScanItem, ScanOptions, SessionState, compose_new_name};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Everything a scan session's driver task needs, captured at start time.
///
/// Affixes are captured once per session: rows are composed with the
/// prefix/suffix as they were when the scan began, exactly like the
/// session-wide settings they are.
struct ScanSessionContext {
    id: ScanId,
    paths: Vec<PathBuf>,
    workers: usize,
    prefix: String,
    suffix: String,
    batch_size: usize,
    pause_poll: Duration,
    inspector: Arc<ArchiveInspector>,
    handle: SessionHandle,
    renamer: RarRenamer,
}

/// Result buffer shared by all workers of one session.
///
/// Items and the progress counters live behind one mutex so each batch is
/// handed over with a consistent running total. The broadcast send happens
/// under the same lock: that is what serializes delivery and keeps batches
/// in the order their thresholds were reached.
struct BatchBuffer {
    inner: std::sync::Mutex<BatchState>,
}

#[derive(Default)]
struct BatchState {
    items: Vec<ScanItem>,
    scanned: usize,
    renameable: usize,
}

impl BatchBuffer {
    fn new() -> Self {
        Self {
            inner: std::sync::Mutex::new(BatchState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BatchState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record one completed inspection, flushing a full batch if due
    fn push(&self, item: ScanItem, batch_size: usize, total: usize, ctx: &ScanSessionContext) {
        let mut state = self.lock();
        if item.can_rename {
            state.renameable += 1;
        }
        state.items.push(item);
        state.scanned += 1;

        if state.items.len() >= batch_size {
            let items = std::mem::take(&mut state.items);
            let scanned = state.scanned;
            ctx.renamer.emit_event(Event::ScanBatch {
                session: ctx.id,
                items,
                scanned,
                total,
            });
        }
    }

    /// Flush any partial batch once all workers are done
    fn flush(&self, total: usize, ctx: &ScanSessionContext) -> (usize, usize) {
        let mut state = self.lock();
        if !state.items.is_empty() {
            let items = std::mem::take(&mut state.items);
            let scanned = state.scanned;
            ctx.renamer.emit_event(Event::ScanBatch {
                session: ctx.id,
                items,
                scanned,
                total,
            });
        }
        (state.scanned, state.renameable)
    }
}

impl RarRenamer {
    /// Start a scan session over the `.rar` files in `directory`
    ///
    /// The worker count comes from the parallelism policy: a positive
    /// `thread_override` wins (clamped to 1–256), otherwise the directory's
    /// drive type decides. Results stream to subscribers as
    /// [`Event::ScanBatch`] events; the session ends with exactly one of
    /// `ScanCompleted`, `ScanCancelled`, or `ScanFailed`.
    ///
    /// Returns the session ID immediately; the scan runs in the background.
    pub async fn start_scan(
        &self,
        directory: impl AsRef<Path>,
        options: ScanOptions,
    ) -> Result<ScanId> {
        let directory = directory.as_ref();
        let paths = collect_rar_files(directory)?;

        let override_workers = options.thread_override.map(clamp_workers);
        let workers = clamp_workers(optimal_workers(directory, override_workers));

        let id = ScanId(self.next_session_id.fetch_add(1, Ordering::SeqCst) + 1);
        let handle = SessionHandle::new();
        {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(id, handle.clone());
        }

        info!(
            session_id = id.0,
            dir = %directory.display(),
            archives = paths.len(),
            workers,
            "scan session started"
        );

        self.emit_event(Event::ScanStarted {
            session: id,
            total: paths.len(),
            workers,
        });

        let ctx = ScanSessionContext {
            id,
            paths,
            workers,
            prefix: options.prefix,
            suffix: options.suffix,
            batch_size: self.config.scan.batch_size,
            pause_poll: self.config.scan.pause_poll_interval,
            inspector: Arc::clone(&self.inspector),
            handle,
            renamer: self.clone(),
        };

        tokio::spawn(run_scan_session(ctx));

        Ok(id)
    }
}

/// Drive one scan session from dispatch to its terminal state.
async fn run_scan_session(ctx: ScanSessionContext) {
    let total = ctx.paths.len();
    let buffer = Arc::new(BatchBuffer::new());
    let semaphore = Arc::new(Semaphore::new(ctx.workers));
    let mut workers: JoinSet<()> = JoinSet::new();

    let ctx = Arc::new(ctx);
    let mut failure: Option<String> = None;

    for path in ctx.paths.clone() {
        // Reap finished workers as we go so an abnormal death (panic)
        // stops dispatch instead of surfacing only at the end.
        while let Some(joined) = workers.try_join_next() {
            if let Err(e) = joined
                && failure.is_none()
                && !e.is_cancelled()
            {
                failure = Some(ScanError::WorkerFailed(e.to_string()).to_string());
                ctx.handle.cancel.cancel();
            }
        }

        // Stop dispatching as soon as cancellation is observed; permits
        // already handed out run their course.
        if ctx.handle.cancel.is_cancelled() {
            break;
        }

        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_closed) => break,
        };

        let ctx = Arc::clone(&ctx);
        let buffer = Arc::clone(&buffer);
        workers.spawn(async move {
            let _permit = permit;

            // Pause gate: block before starting this file's inspection.
            // A cancelled session must exit here rather than resume.
            if !wait_while_paused(&ctx.handle, ctx.pause_poll).await {
                return;
            }

            let result = ctx.inspector.scan(&path).await;
            debug!(
                session_id = ctx.id.0,
                archive = %path.display(),
                status = %result.status(),
                "archive inspected"
            );

            let item = ScanItem::from_scan(&path, &result, &ctx.prefix, &ctx.suffix);
            buffer.push(item, ctx.batch_size, total, &ctx);
        });
    }

    // Wait for in-flight workers. A worker that dies abnormally (panic)
    // is a session-level failure: abort the rest and report once.
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined
            && failure.is_none()
            && !e.is_cancelled()
        {
            failure = Some(ScanError::WorkerFailed(e.to_string()).to_string());
            ctx.handle.cancel.cancel();
            workers.abort_all();
        }
    }

    let (scanned, renameable) = buffer.flush(total, &ctx);

    if let Some(error) = failure {
        warn!(session_id = ctx.id.0, error = %error, "scan session failed");
        ctx.handle.set_state(SessionState::Failed);
        ctx.renamer.emit_event(Event::ScanFailed {
            session: ctx.id,
            error,
        });
    } else if ctx.handle.cancel.is_cancelled() {
        info!(session_id = ctx.id.0, scanned, "scan session cancelled");
        ctx.handle.set_state(SessionState::Cancelled);
        ctx.renamer.emit_event(Event::ScanCancelled {
            session: ctx.id,
            scanned,
        });
    } else {
        info!(session_id = ctx.id.0, scanned, renameable, "scan session complete");
        ctx.handle.set_state(SessionState::Completed);
        ctx.renamer.emit_event(Event::ScanCompleted {
            session: ctx.id,
            scanned,
            renameable,
        });
    }
}

/// Block while the session is paused, polling at the configured interval.
///
/// Returns `false` if cancellation was observed — checked ahead of the
/// pause flag on every iteration, so cancel always beats pause.
async fn wait_while_paused(handle: &SessionHandle, poll: Duration) -> bool {
    loop {
        if handle.cancel.is_cancelled() {
            return false;
        }
        if !handle.paused.load(Ordering::Acquire) {
            return true;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Enumerate the `.rar` files directly inside `directory` (no recursion)
fn collect_rar_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(directory).map_err(|e| {
        Error::Scan(ScanError::DirectoryUnreadable {
            path: directory.to_path_buf(),
            reason: e.to_string(),
        })
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::Scan(ScanError::DirectoryUnreadable {
                path: directory.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if let Some(ext) = path.extension()
            && ext.to_string_lossy().eq_ignore_ascii_case("rar")
        {
            paths.push(path);
        }
    }

    // Deterministic dispatch order; completion order is still up to the pool
    paths.sort();
    Ok(paths)
}

/// Recompute `new_name` for every renameable row after an affix change
pub fn apply_affixes(items: &mut [ScanItem], prefix: &str, suffix: &str) {
    for item in items.iter_mut() {
        item.apply_affixes(prefix, suffix);
    }
}

/// Re-sync rows with the filesystem
///
/// Rows whose backing file no longer exists are removed; surviving rows get
/// their `current_name` re-derived from the path and their `new_name`
/// recomposed from the given affixes.
pub fn refresh_items(items: &mut Vec<ScanItem>, prefix: &str, suffix: &str) {
    items.retain(|item| item.full_path.exists());
    for item in items.iter_mut() {
        if let Some(name) = item.full_path.file_name() {
            item.current_name = name.to_string_lossy().into_owned();
        }
        if let Some(folder) = &item.folder_name {
            item.new_name = Some(compose_new_name(prefix, folder, suffix));
        }
    }
}
