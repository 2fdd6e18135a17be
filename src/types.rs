//! Core types for rar-renamer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Unique identifier for a scan session
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(pub i64);

impl ScanId {
    /// Create a new ScanId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ScanId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ScanId> for i64 {
    fn from(id: ScanId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ScanId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Classified outcome of inspecting one archive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Archive has a single top-level folder and can be renamed after it
    Ready,
    /// Archive listing succeeded but no top-level folder entry exists
    NoRootFolder,
    /// Archive is password protected or encrypted
    PasswordProtected,
    /// Archive is corrupted or otherwise unreadable
    Corrupted,
    /// No listing tool available for the lifetime of this process
    ToolMissing,
    /// Listing did not finish within the per-file timeout
    Timeout,
}

impl ScanStatus {
    /// Returns `true` for the status that permits renaming
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Ready => "ready",
            Self::NoRootFolder => "no root folder",
            Self::PasswordProtected => "password protected",
            Self::Corrupted => "corrupted",
            Self::ToolMissing => "listing tool missing",
            Self::Timeout => "timed out",
        };
        f.write_str(label)
    }
}

/// Result of inspecting a single archive
///
/// Constructed only through [`ScanResult::ready`] and
/// [`ScanResult::without_folder`], which maintain the invariant that a root
/// folder name is present exactly when the status is [`ScanStatus::Ready`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanResult {
    root_folder: Option<String>,
    status: ScanStatus,
}

impl ScanResult {
    /// A successful inspection with the given root folder name
    pub fn ready(root_folder: impl Into<String>) -> Self {
        Self {
            root_folder: Some(root_folder.into()),
            status: ScanStatus::Ready,
        }
    }

    /// An inspection that ended in any non-ready status
    ///
    /// Passing [`ScanStatus::Ready`] here would break the invariant, so it
    /// is downgraded to [`ScanStatus::NoRootFolder`].
    pub fn without_folder(status: ScanStatus) -> Self {
        let status = if status == ScanStatus::Ready {
            ScanStatus::NoRootFolder
        } else {
            status
        };
        Self {
            root_folder: None,
            status,
        }
    }

    /// The archive's root folder name, present iff the status is ready
    pub fn root_folder(&self) -> Option<&str> {
        self.root_folder.as_deref()
    }

    /// The classified status of this inspection
    pub fn status(&self) -> ScanStatus {
        self.status
    }
}

/// One row of scan output bound to a source file
///
/// Created when a scan completes for a path; the affix-derived `new_name`
/// is recomputed via [`ScanItem::apply_affixes`] whenever prefix/suffix
/// change, and the identity fields are transferred when the file is renamed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanItem {
    /// Current file name (no directory)
    pub current_name: String,
    /// Absolute path of the backing file
    pub full_path: PathBuf,
    /// Root folder name extracted from the archive, if any
    pub folder_name: Option<String>,
    /// Derived target name, present when a folder name is known
    pub new_name: Option<String>,
    /// Classified scan status for display
    pub status: ScanStatus,
    /// Whether this row has enough information to be renamed
    pub can_rename: bool,
    /// Selection flag, owned by the presentation layer
    pub is_selected: bool,
}

impl ScanItem {
    /// Build a row from an inspection result and the session's affixes
    pub fn from_scan(path: &Path, result: &ScanResult, prefix: &str, suffix: &str) -> Self {
        let current_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folder_name = result.root_folder().map(str::to_owned);
        let new_name = folder_name
            .as_deref()
            .map(|folder| compose_new_name(prefix, folder, suffix));
        let can_rename = folder_name.is_some();
        Self {
            current_name,
            full_path: path.to_path_buf(),
            folder_name,
            new_name,
            status: result.status(),
            can_rename,
            is_selected: can_rename,
        }
    }

    /// Recompute `new_name` after an affix change
    ///
    /// Rows without a folder name are left untouched.
    pub fn apply_affixes(&mut self, prefix: &str, suffix: &str) {
        if let Some(folder) = &self.folder_name {
            self.new_name = Some(compose_new_name(prefix, folder, suffix));
        }
    }

    /// Transfer this row's identity to its post-rename location
    ///
    /// Called after the backing file was moved: `current_name` and
    /// `full_path` now describe the new location and the selection flag is
    /// cleared.
    pub fn transfer_identity(&mut self, new_path: &Path) {
        self.current_name = file_name_of(new_path);
        self.full_path = new_path.to_path_buf();
        self.is_selected = false;
    }
}

/// A file accepted into the persistent rename queue
///
/// Queue entries survive scan sessions and process restarts. They are
/// deduplicated by `full_path`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Current file name (no directory)
    pub current_name: String,
    /// Target file name
    pub new_name: String,
    /// Absolute path of the backing file
    pub full_path: PathBuf,
    /// Selection flag, owned by the presentation layer
    pub is_selected: bool,
}

impl QueueEntry {
    /// Build a queue entry from a scan row
    ///
    /// Returns `None` when the row has no derived target name.
    pub fn from_item(item: &ScanItem) -> Option<Self> {
        let new_name = item.new_name.clone()?;
        Some(Self {
            current_name: item.current_name.clone(),
            new_name,
            full_path: item.full_path.clone(),
            is_selected: true,
        })
    }
}

/// Immutable record of one rename attempt
///
/// `error` is present only when `success` is false; the constructors
/// maintain this.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the attempt was made
    pub timestamp: DateTime<Utc>,
    /// Path before the rename
    pub old_path: PathBuf,
    /// Path after the rename (intended path for failed attempts)
    pub new_path: PathBuf,
    /// File name before the rename
    pub old_name: String,
    /// File name after the rename
    pub new_name: String,
    /// Whether the rename succeeded
    pub success: bool,
    /// Failure description, present only when `success` is false
    pub error: Option<String>,
}

impl LogEntry {
    /// Record a successful rename
    pub fn succeeded(old_path: PathBuf, new_path: PathBuf) -> Self {
        let old_name = file_name_of(&old_path);
        let new_name = file_name_of(&new_path);
        Self {
            timestamp: Utc::now(),
            old_path,
            new_path,
            old_name,
            new_name,
            success: true,
            error: None,
        }
    }

    /// Record a failed rename attempt
    pub fn failed(old_path: PathBuf, new_path: PathBuf, error: impl Into<String>) -> Self {
        let old_name = file_name_of(&old_path);
        let new_name = file_name_of(&new_path);
        Self {
            timestamp: Utc::now(),
            old_path,
            new_path,
            old_name,
            new_name,
            success: false,
            error: Some(error.into()),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// State of a scan session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Actively dispatching and inspecting archives
    Running,
    /// Paused by the user; in-flight inspections run to completion
    Paused,
    /// All archives inspected
    Completed,
    /// Cancelled by the user with a partial result set
    Cancelled,
    /// Aborted by an unexpected error
    Failed,
}

impl SessionState {
    /// Returns `true` once the session has reached a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Per-scan parameters supplied by the caller
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Worker-count override; positive values win over drive detection
    #[serde(default)]
    pub thread_override: Option<usize>,
    /// Text prepended to the folder name when composing the target name
    #[serde(default)]
    pub prefix: String,
    /// Text appended to the folder name when composing the target name
    #[serde(default)]
    pub suffix: String,
}

/// One rename to attempt during commit
///
/// Bridges the two curation surfaces — live scan rows and persisted queue
/// entries — into the single input `commit_rename` takes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenameRequest {
    /// Current file name (no directory)
    pub current_name: String,
    /// Target file name
    pub new_name: String,
    /// Absolute path of the backing file
    pub full_path: PathBuf,
}

impl RenameRequest {
    /// Build a request from a scan row; `None` when the row is not renameable
    pub fn from_item(item: &ScanItem) -> Option<Self> {
        let new_name = item.new_name.clone()?;
        Some(Self {
            current_name: item.current_name.clone(),
            new_name,
            full_path: item.full_path.clone(),
        })
    }
}

impl From<&QueueEntry> for RenameRequest {
    fn from(entry: &QueueEntry) -> Self {
        Self {
            current_name: entry.current_name.clone(),
            new_name: entry.new_name.clone(),
            full_path: entry.full_path.clone(),
        }
    }
}

/// Aggregate outcome of a commit or undo batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSummary {
    /// Number of items that succeeded
    pub succeeded: usize,
    /// Number of items that failed
    pub failed: usize,
}

/// Event emitted during scan and rename lifecycles
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Scan session started
    ScanStarted {
        /// Session ID
        session: ScanId,
        /// Number of archives queued for inspection
        total: usize,
        /// Worker count chosen by the parallelism policy
        workers: usize,
    },

    /// A batch of scan results is ready
    ///
    /// Batches arrive in the order their size thresholds were reached;
    /// items within a batch are in completion order, not input order.
    ScanBatch {
        /// Session ID
        session: ScanId,
        /// The completed rows, at most one batch worth
        items: Vec<ScanItem>,
        /// Running total of inspected archives
        scanned: usize,
        /// Total number of archives in the session
        total: usize,
    },

    /// Scan session paused
    ScanPaused {
        /// Session ID
        session: ScanId,
    },

    /// Scan session resumed
    ScanResumed {
        /// Session ID
        session: ScanId,
    },

    /// Scan session inspected every archive
    ScanCompleted {
        /// Session ID
        session: ScanId,
        /// Number of archives inspected
        scanned: usize,
        /// Number of rows that can be renamed
        renameable: usize,
    },

    /// Scan session cancelled with a partial result set
    ScanCancelled {
        /// Session ID
        session: ScanId,
        /// Number of archives inspected before cancellation
        scanned: usize,
    },

    /// Scan session aborted by an unexpected error
    ScanFailed {
        /// Session ID
        session: ScanId,
        /// Error message
        error: String,
    },

    /// One file renamed successfully
    Renamed {
        /// Path before the rename
        old_path: PathBuf,
        /// Path after the rename
        new_path: PathBuf,
    },

    /// One rename attempt failed
    RenameFailed {
        /// The file that could not be renamed
        path: PathBuf,
        /// Failure description
        error: String,
    },

    /// One rename reversed successfully
    Undone {
        /// The restored original path
        old_path: PathBuf,
        /// The path the file was moved back from
        new_path: PathBuf,
    },

    /// One reversal attempt failed
    UndoFailed {
        /// The recorded new path that could not be reversed
        path: PathBuf,
        /// Failure description
        error: String,
    },

    /// The persistent queue changed
    QueueChanged {
        /// Number of entries now in the queue
        len: usize,
    },
}

/// Compose the target file name from the session affixes and a folder name
pub fn compose_new_name(prefix: &str, folder: &str, suffix: &str) -> String {
    format!("{prefix}{folder}{suffix}.rar")
}
