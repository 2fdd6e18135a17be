//! End-to-end tests for scan sessions, commit, and undo.
//!
//! A shell script stands in for the 7z binary so the full
//! spawn/parse/classify pipeline runs without 7-Zip installed; filesystem
//! effects go through real tempdirs.

use crate::config::Config;
use crate::types::{
    Event, QueueEntry, RenameRequest, ScanId, ScanItem, ScanOptions, ScanStatus, SessionState,
};
use crate::{Error, RarRenamer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;

fn test_config(dir: &Path) -> Config {
    Config {
        persistence: crate::config::PersistenceConfig {
            queue_path: dir.join("queue.json"),
            ledger_path: dir.join("rename_log.json"),
        },
        tools: crate::config::ToolsConfig {
            sevenzip_path: None,
            search_path: false,
        },
        ..Default::default()
    }
}

fn make_renamer(dir: &Path, tool: Option<PathBuf>) -> RarRenamer {
    let mut config = test_config(dir);
    config.tools.sevenzip_path = tool;
    RarRenamer::new(config).unwrap()
}

fn touch_rar_files(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("archive{i:02}.rar"));
            std::fs::write(&path, b"not really a rar").unwrap();
            path
        })
        .collect()
}

async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Drain events until the session reaches a terminal event, collecting all
/// batch items seen along the way.
async fn drain_to_terminal(
    rx: &mut broadcast::Receiver<Event>,
    session: ScanId,
) -> (Vec<ScanItem>, Event) {
    let mut items = Vec::new();
    loop {
        let event = next_event(rx).await;
        match &event {
            Event::ScanBatch {
                session: s,
                items: batch,
                ..
            } if *s == session => items.extend(batch.iter().cloned()),
            Event::ScanCompleted { session: s, .. }
            | Event::ScanCancelled { session: s, .. }
            | Event::ScanFailed { session: s, .. }
                if *s == session =>
            {
                return (items, event);
            }
            _ => {}
        }
    }
}

#[cfg(unix)]
fn write_fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-7z");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A fake tool that lists one root folder named after nothing in particular.
#[cfg(unix)]
fn ready_tool(dir: &Path) -> PathBuf {
    write_fake_tool(
        dir,
        "cat <<'EOF'\n\
         Path = Season 1\n\
         Folder = +\n\
         Path = Season 1/episode01.mkv\n\
         Folder = -\n\
         EOF\n\
         exit 0",
    )
}

/// Same listing, but each invocation takes at least `millis` to finish.
#[cfg(unix)]
fn slow_ready_tool(dir: &Path, millis: u64) -> PathBuf {
    let seconds = millis as f64 / 1000.0;
    write_fake_tool(
        dir,
        &format!(
            "sleep {seconds}\n\
             cat <<'EOF'\n\
             Path = Season 1\n\
             Folder = +\n\
             EOF\n\
             exit 0"
        ),
    )
}

// --- scan sessions ---

#[tokio::test]
async fn empty_directory_completes_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let renamer = make_renamer(dir.path(), None);
    let mut rx = renamer.subscribe();

    let session = renamer
        .start_scan(dir.path(), ScanOptions::default())
        .await
        .unwrap();

    match next_event(&mut rx).await {
        Event::ScanStarted { total, .. } => assert_eq!(total, 0),
        other => panic!("expected ScanStarted, got {other:?}"),
    }

    let (items, terminal) = drain_to_terminal(&mut rx, session).await;
    assert!(items.is_empty());
    assert!(matches!(
        terminal,
        Event::ScanCompleted { scanned: 0, renameable: 0, .. }
    ));
    assert_eq!(
        renamer.session_state(session).await,
        Some(SessionState::Completed)
    );
}

#[tokio::test]
async fn nonexistent_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let renamer = make_renamer(dir.path(), None);

    let result = renamer
        .start_scan(dir.path().join("nope"), ScanOptions::default())
        .await;
    assert!(matches!(result, Err(Error::Scan(_))));
}

#[tokio::test]
async fn missing_tool_marks_every_row_tool_missing() {
    let dir = tempfile::tempdir().unwrap();
    touch_rar_files(dir.path(), 3);
    let renamer = make_renamer(dir.path(), None);
    assert!(!renamer.has_listing_tool());
    let mut rx = renamer.subscribe();

    let session = renamer
        .start_scan(dir.path(), ScanOptions::default())
        .await
        .unwrap();

    let (items, terminal) = drain_to_terminal(&mut rx, session).await;
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.status == ScanStatus::ToolMissing));
    assert!(items.iter().all(|i| !i.can_rename));
    assert!(matches!(
        terminal,
        Event::ScanCompleted { scanned: 3, renameable: 0, .. }
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn scan_session_composes_names_from_affixes() {
    let dir = tempfile::tempdir().unwrap();
    let archives = touch_rar_files(dir.path(), 5);
    let tool = ready_tool(dir.path());
    let renamer = make_renamer(dir.path(), Some(tool));
    let mut rx = renamer.subscribe();

    let options = ScanOptions {
        thread_override: Some(4),
        prefix: "[tv] ".to_string(),
        suffix: " (2019)".to_string(),
    };
    let session = renamer.start_scan(dir.path(), options).await.unwrap();

    match next_event(&mut rx).await {
        Event::ScanStarted { total, workers, .. } => {
            assert_eq!(total, 5);
            assert_eq!(workers, 4);
        }
        other => panic!("expected ScanStarted, got {other:?}"),
    }

    let (items, terminal) = drain_to_terminal(&mut rx, session).await;
    assert_eq!(items.len(), archives.len());
    for item in &items {
        assert_eq!(item.status, ScanStatus::Ready);
        assert_eq!(item.folder_name.as_deref(), Some("Season 1"));
        assert_eq!(item.new_name.as_deref(), Some("[tv] Season 1 (2019).rar"));
        assert!(item.can_rename);
    }
    assert!(matches!(
        terminal,
        Event::ScanCompleted { scanned: 5, renameable: 5, .. }
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn cancellation_mid_scan_yields_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    touch_rar_files(dir.path(), 12);
    let tool = slow_ready_tool(dir.path(), 200);
    let renamer = make_renamer(dir.path(), Some(tool));
    let mut rx = renamer.subscribe();

    let options = ScanOptions {
        thread_override: Some(2),
        ..Default::default()
    };
    let session = renamer.start_scan(dir.path(), options).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    renamer.cancel(session).await.unwrap();

    let (items, terminal) = drain_to_terminal(&mut rx, session).await;
    match terminal {
        Event::ScanCancelled { scanned, .. } => {
            assert_eq!(scanned, items.len());
            assert!(scanned < 12, "expected a partial result set, got {scanned}");
        }
        other => panic!("expected ScanCancelled, got {other:?}"),
    }
    assert_eq!(
        renamer.session_state(session).await,
        Some(SessionState::Cancelled)
    );

    // Cancelling again is a no-op, not an error
    renamer.cancel(session).await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn pause_halts_progress_until_resumed() {
    let dir = tempfile::tempdir().unwrap();
    touch_rar_files(dir.path(), 6);
    let tool = slow_ready_tool(dir.path(), 100);

    let mut config = test_config(dir.path());
    config.tools.sevenzip_path = Some(tool);
    // One-item batches so progress is observable per inspection
    config.scan.batch_size = 1;
    let renamer = RarRenamer::new(config).unwrap();
    let mut rx = renamer.subscribe();

    let options = ScanOptions {
        thread_override: Some(1),
        ..Default::default()
    };
    let session = renamer.start_scan(dir.path(), options).await.unwrap();
    renamer.pause(session).await.unwrap();
    assert_eq!(
        renamer.session_state(session).await,
        Some(SessionState::Paused)
    );

    // Let any in-flight inspection drain, then measure a quiet window.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let mut during_pause = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::ScanBatch { items, .. } => during_pause += items.len(),
            Event::ScanCompleted { .. } | Event::ScanCancelled { .. } => {
                panic!("session must not finish while paused")
            }
            _ => {}
        }
    }
    assert!(
        during_pause <= 1,
        "at most the in-flight inspection may land after pause, got {during_pause}"
    );

    // No further progress while paused
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err(), "paused session produced results");

    renamer.resume(session).await.unwrap();
    let (items, terminal) = drain_to_terminal(&mut rx, session).await;
    match terminal {
        Event::ScanCompleted { scanned, .. } => {
            // Every archive inspected exactly once across pause/resume
            assert_eq!(scanned, 6);
            assert_eq!(during_pause + items.len(), 6);
        }
        other => panic!("expected ScanCompleted, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn cancel_beats_pause() {
    let dir = tempfile::tempdir().unwrap();
    touch_rar_files(dir.path(), 8);
    let tool = slow_ready_tool(dir.path(), 100);
    let renamer = make_renamer(dir.path(), Some(tool));
    let mut rx = renamer.subscribe();

    let options = ScanOptions {
        thread_override: Some(2),
        ..Default::default()
    };
    let session = renamer.start_scan(dir.path(), options).await.unwrap();
    renamer.pause(session).await.unwrap();
    renamer.cancel(session).await.unwrap();

    // Workers blocked on the pause gate must observe cancellation and exit;
    // the session terminates without ever being resumed.
    let (_, terminal) = drain_to_terminal(&mut rx, session).await;
    assert!(matches!(terminal, Event::ScanCancelled { .. }));
}

#[tokio::test]
async fn control_of_unknown_session_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let renamer = make_renamer(dir.path(), None);

    assert!(matches!(
        renamer.pause(ScanId(999)).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        renamer.resume(ScanId(999)).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        renamer.cancel(ScanId(999)).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn pause_after_completion_is_invalid_state() {
    let dir = tempfile::tempdir().unwrap();
    let renamer = make_renamer(dir.path(), None);
    let mut rx = renamer.subscribe();

    let session = renamer
        .start_scan(dir.path(), ScanOptions::default())
        .await
        .unwrap();
    drain_to_terminal(&mut rx, session).await;

    assert!(matches!(
        renamer.pause(session).await,
        Err(Error::Scan(crate::error::ScanError::InvalidState { .. }))
    ));
}

// --- commit and undo ---

fn rename_request(path: &Path, new_name: &str) -> RenameRequest {
    RenameRequest {
        current_name: path.file_name().unwrap().to_string_lossy().into_owned(),
        new_name: new_name.to_string(),
        full_path: path.to_path_buf(),
    }
}

#[tokio::test]
async fn commit_and_undo_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir(&data_dir).unwrap();
    let old_path = data_dir.join("old name.rar");
    std::fs::write(&old_path, b"archive bytes").unwrap();

    let renamer = make_renamer(dir.path(), None);

    let summary = renamer
        .commit_rename(&[rename_request(&old_path, "Season 1.rar")])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);

    let new_path = data_dir.join("Season 1.rar");
    assert!(!old_path.exists());
    assert_eq!(std::fs::read(&new_path).unwrap(), b"archive bytes");

    // The ledger recorded the success and survives a reload
    let successes = renamer.successful_entries();
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].old_name, "old name.rar");

    let summary = renamer.undo(&successes).await.unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);

    assert!(old_path.exists());
    assert!(!new_path.exists());
    assert_eq!(std::fs::read(&old_path).unwrap(), b"archive bytes");

    // Reversal deletes the entry permanently; empty ledger loses its file
    assert!(renamer.successful_entries().is_empty());
    assert!(!dir.path().join("rename_log.json").exists());
}

#[tokio::test]
async fn commit_conflict_leaves_source_untouched_and_entry_queued() {
    let dir = tempfile::tempdir().unwrap();
    let old_path = dir.path().join("old.rar");
    let occupied = dir.path().join("Season 1.rar");
    std::fs::write(&old_path, b"source").unwrap();
    std::fs::write(&occupied, b"already here").unwrap();

    let renamer = make_renamer(dir.path(), None);
    renamer
        .queue
        .add(QueueEntry {
            current_name: "old.rar".to_string(),
            new_name: "Season 1.rar".to_string(),
            full_path: old_path.clone(),
            is_selected: true,
        })
        .unwrap();

    let summary = renamer
        .commit_rename(&[rename_request(&old_path, "Season 1.rar")])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 1);

    // Source and occupant are both untouched, and the entry is retryable
    assert_eq!(std::fs::read(&old_path).unwrap(), b"source");
    assert_eq!(std::fs::read(&occupied).unwrap(), b"already here");
    assert_eq!(renamer.queue_entries().len(), 1);

    // The failure was recorded with its reason
    let entries = renamer.ledger.entries();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].success);
    assert_eq!(entries[0].error.as_deref(), Some("target already exists"));
}

#[tokio::test]
async fn commit_missing_source_drops_queue_entry() {
    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("gone.rar");

    let renamer = make_renamer(dir.path(), None);
    renamer
        .queue
        .add(QueueEntry {
            current_name: "gone.rar".to_string(),
            new_name: "Season 1.rar".to_string(),
            full_path: gone.clone(),
            is_selected: true,
        })
        .unwrap();

    let summary = renamer
        .commit_rename(&[rename_request(&gone, "Season 1.rar")])
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);

    // Nothing left to retry
    assert!(renamer.queue_entries().is_empty());
    let entries = renamer.ledger.entries();
    assert_eq!(entries[0].error.as_deref(), Some("source no longer exists"));
}

#[tokio::test]
async fn undo_refuses_to_overwrite_reoccupied_old_path() {
    let dir = tempfile::tempdir().unwrap();
    let old_path = dir.path().join("old.rar");
    std::fs::write(&old_path, b"v1").unwrap();

    let renamer = make_renamer(dir.path(), None);
    renamer
        .commit_rename(&[rename_request(&old_path, "Season 1.rar")])
        .await
        .unwrap();

    // Something new takes the original path before the undo
    std::fs::write(&old_path, b"newcomer").unwrap();

    let successes = renamer.successful_entries();
    let summary = renamer.undo(&successes).await.unwrap();
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 1);

    // The newcomer is untouched and the ledger entry is retained
    assert_eq!(std::fs::read(&old_path).unwrap(), b"newcomer");
    assert_eq!(renamer.successful_entries().len(), 1);
}

#[tokio::test]
async fn undo_with_vanished_file_retains_entry() {
    let dir = tempfile::tempdir().unwrap();
    let old_path = dir.path().join("old.rar");
    std::fs::write(&old_path, b"v1").unwrap();

    let renamer = make_renamer(dir.path(), None);
    renamer
        .commit_rename(&[rename_request(&old_path, "Season 1.rar")])
        .await
        .unwrap();

    std::fs::remove_file(dir.path().join("Season 1.rar")).unwrap();

    let successes = renamer.successful_entries();
    let summary = renamer.undo(&successes).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(renamer.successful_entries().len(), 1);
}

// --- queue surface ---

#[tokio::test]
async fn add_to_queue_dedupes_and_skips_unrenameable() {
    let dir = tempfile::tempdir().unwrap();
    let renamer = make_renamer(dir.path(), None);

    let ready = crate::types::ScanResult::ready("Season 1");
    let broken = crate::types::ScanResult::without_folder(ScanStatus::Corrupted);
    let item_a = ScanItem::from_scan(&dir.path().join("a.rar"), &ready, "", "");
    let item_b = ScanItem::from_scan(&dir.path().join("b.rar"), &broken, "", "");

    let added = renamer.add_to_queue(&[item_a.clone(), item_b]).unwrap();
    assert_eq!(added, 1);

    // Same path again is a no-op
    let added = renamer.add_to_queue(&[item_a]).unwrap();
    assert_eq!(added, 0);
    assert_eq!(renamer.queue_entries().len(), 1);
    assert!(renamer.has_queue());

    renamer.clear_queue().unwrap();
    assert!(!renamer.has_queue());
    assert!(!dir.path().join("queue.json").exists());
}
