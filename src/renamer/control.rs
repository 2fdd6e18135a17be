//! Scan session lifecycle control — pause, resume, cancel.

use super::{RarRenamer, SessionHandle};
use crate::error::{Error, Result, ScanError};
use crate::types::{Event, ScanId, SessionState};
use std::sync::atomic::Ordering;

impl RarRenamer {
    /// Pause a scan session
    ///
    /// Workers that have not yet started their current inspection block
    /// until the session is resumed; inspections already in flight run to
    /// completion, so a few results may still arrive shortly after pausing.
    ///
    /// Pausing an already-paused session is a no-op. Pausing a session in a
    /// terminal state is an error.
    pub async fn pause(&self, id: ScanId) -> Result<()> {
        let handle = self.session_handle(id).await?;

        match handle.state() {
            SessionState::Paused => return Ok(()),
            SessionState::Running => {}
            state => {
                return Err(Error::Scan(ScanError::InvalidState {
                    id: id.0,
                    operation: "pause".to_string(),
                    current_state: state.to_string(),
                }));
            }
        }

        handle.paused.store(true, Ordering::Release);
        handle.set_state(SessionState::Paused);
        tracing::info!(session_id = id.0, "scan session paused");
        self.emit_event(Event::ScanPaused { session: id });

        Ok(())
    }

    /// Resume a paused scan session
    ///
    /// Workers continue from where they left off; archives inspected before
    /// the pause are not re-scanned. Resuming a running session is a no-op.
    /// Resuming a session in a terminal state is an error.
    pub async fn resume(&self, id: ScanId) -> Result<()> {
        let handle = self.session_handle(id).await?;

        match handle.state() {
            SessionState::Running => return Ok(()),
            SessionState::Paused => {}
            state => {
                return Err(Error::Scan(ScanError::InvalidState {
                    id: id.0,
                    operation: "resume".to_string(),
                    current_state: state.to_string(),
                }));
            }
        }

        handle.paused.store(false, Ordering::Release);
        handle.set_state(SessionState::Running);
        tracing::info!(session_id = id.0, "scan session resumed");
        self.emit_event(Event::ScanResumed { session: id });

        Ok(())
    }

    /// Cancel a scan session
    ///
    /// Cancellation is cooperative: no new inspections start, workers
    /// blocked on the pause gate exit instead of resuming, and any child
    /// listing processes still running are terminated. Results already
    /// delivered are kept; the session ends in the `Cancelled` state with
    /// one final `ScanCancelled` event.
    ///
    /// Cancelling an already-cancelled session is a no-op. Cancelling a
    /// session in another terminal state is an error.
    pub async fn cancel(&self, id: ScanId) -> Result<()> {
        let handle = self.session_handle(id).await?;

        match handle.state() {
            SessionState::Cancelled => return Ok(()),
            SessionState::Running | SessionState::Paused => {}
            state => {
                return Err(Error::Scan(ScanError::InvalidState {
                    id: id.0,
                    operation: "cancel".to_string(),
                    current_state: state.to_string(),
                }));
            }
        }

        tracing::info!(session_id = id.0, "cancelling scan session");
        handle.cancel.cancel();

        Ok(())
    }

    async fn session_handle(&self, id: ScanId) -> Result<SessionHandle> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("scan session {} not found", id)))
    }
}
