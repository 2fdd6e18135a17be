//! Core renamer implementation split into focused submodules.
//!
//! The `RarRenamer` struct and its methods are organized by domain:
//! - [`scan`] - Scan session orchestration (worker fan-out, batching)
//! - [`control`] - Session lifecycle control (pause/resume/cancel)
//! - [`commit`] - Committing renames from the queue or a scan selection
//! - [`undo`] - Selective reversal of completed renames
//! - [`queue`] - The persistent rename queue

mod commit;
mod control;
mod queue;
mod scan;
mod undo;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use scan::{apply_affixes, refresh_items};

use crate::config::Config;
use crate::error::Result;
use crate::inspector::ArchiveInspector;
use crate::store::{LedgerStore, QueueStore};
use crate::types::{Event, ScanId, SessionState};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use tokio_util::sync::CancellationToken;

/// Per-session control state shared between the caller-facing handle and
/// the session's driver and worker tasks.
#[derive(Clone)]
pub(crate) struct SessionHandle {
    /// Current state, advanced by the driver and the control surface
    pub(crate) state: Arc<std::sync::Mutex<SessionState>>,
    /// Pause flag polled by workers before each inspection
    pub(crate) paused: Arc<std::sync::atomic::AtomicBool>,
    /// Cooperative cancellation; takes priority over pause
    pub(crate) cancel: CancellationToken,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(std::sync::Mutex::new(SessionState::Running)),
            paused: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

/// Main renamer instance (cloneable - all fields are Arc-wrapped)
///
/// This is the handle the embedding application holds. It exposes the whole
/// command surface: starting/pausing/resuming/cancelling scan sessions,
/// committing renames, undoing them, and managing the persistent queue.
/// Observable state changes stream through the broadcast channel returned
/// by [`subscribe`](RarRenamer::subscribe).
#[derive(Clone)]
pub struct RarRenamer {
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Archive inspector with the once-resolved listing tool
    pub(crate) inspector: Arc<ArchiveInspector>,
    /// Active and finished scan sessions by ID
    pub(crate) sessions: Arc<tokio::sync::Mutex<HashMap<ScanId, SessionHandle>>>,
    /// Next session ID counter
    pub(crate) next_session_id: Arc<AtomicI64>,
    /// Persistent rename queue
    pub(crate) queue: Arc<QueueStore>,
    /// Persistent rename ledger
    pub(crate) ledger: Arc<LedgerStore>,
}

impl RarRenamer {
    /// Create a new RarRenamer instance
    ///
    /// This initializes all core components:
    /// - Resolves the external listing tool (once, for the process lifetime)
    /// - Loads the persistent queue and ledger from disk
    /// - Sets up the event broadcast channel
    pub fn new(config: Config) -> Result<Self> {
        let inspector = ArchiveInspector::from_config(&config.tools, config.scan.scan_timeout);

        let queue = QueueStore::load(&config.persistence.queue_path);
        let ledger = LedgerStore::load(&config.persistence.ledger_path);

        // Bounded broadcast buffer; slow subscribers observe a Lagged error
        // rather than stalling producers.
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        tracing::info!(
            tool = ?inspector.tool_path(),
            queue_len = queue.len(),
            ledger_len = ledger.len(),
            "renamer initialized"
        );

        Ok(Self {
            event_tx,
            config: Arc::new(config),
            inspector: Arc::new(inspector),
            sessions: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            next_session_id: Arc::new(AtomicI64::new(0)),
            queue: Arc::new(queue),
            ledger: Arc::new(ledger),
        })
    }

    /// Subscribe to renamer events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently. Events are buffered, but a subscriber that
    /// falls behind by more than 1000 events receives a
    /// `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Whether a listing tool was resolved at startup
    ///
    /// When this is false every scan result reports the tool as missing.
    pub fn has_listing_tool(&self) -> bool {
        self.inspector.tool_path().is_some()
    }

    /// Current state of a scan session, if the session exists
    pub async fn session_state(&self, id: ScanId) -> Option<SessionState> {
        let sessions = self.sessions.lock().await;
        sessions.get(&id).map(SessionHandle::state)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// scanning and renaming proceed whether or not anyone is listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
