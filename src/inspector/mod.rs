//! Archive inspection via the external `7z` listing binary
//!
//! The inspector runs `7z l -slt <archive>` per file and classifies the
//! outcome. It is a total function over its inputs: every failure mode —
//! missing tool, timeout, password protection, corruption, no root folder —
//! comes back as a [`ScanResult`], never as an error.

mod parser;

pub use parser::find_root_folder;

use crate::config::ToolsConfig;
use crate::types::{ScanResult, ScanStatus};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Binary names probed on PATH, in preference order.
///
/// `7zz` is the official standalone Linux/macOS build, `7za` the
/// reduced "standalone" build; all three speak the same `l -slt` dialect.
const TOOL_CANDIDATES: &[&str] = &["7z", "7zz", "7za"];

/// Inspects archives by listing them with an external 7-Zip binary
///
/// The tool path is resolved once at construction and treated as immutable
/// for the life of the inspector. If no binary is available, every scan
/// returns [`ScanStatus::ToolMissing`] without spawning anything.
///
/// # Examples
///
/// ```no_run
/// use rar_renamer::inspector::ArchiveInspector;
/// use rar_renamer::config::ToolsConfig;
/// use std::path::Path;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let inspector =
///     ArchiveInspector::from_config(&ToolsConfig::default(), Duration::from_secs(30));
/// let result = inspector.scan(Path::new("show.rar")).await;
/// println!("{:?}", result.status());
/// # }
/// ```
pub struct ArchiveInspector {
    tool: Option<PathBuf>,
    timeout: Duration,
}

impl ArchiveInspector {
    /// Create an inspector with an explicit tool path (or none)
    pub fn new(tool: Option<PathBuf>, timeout: Duration) -> Self {
        Self { tool, timeout }
    }

    /// Resolve the listing tool from configuration
    ///
    /// An explicitly configured path always wins. Otherwise the PATH is
    /// searched for the known binary names, unless PATH search is disabled.
    pub fn from_config(tools: &ToolsConfig, timeout: Duration) -> Self {
        let tool = if let Some(path) = &tools.sevenzip_path {
            Some(path.clone())
        } else if tools.search_path {
            TOOL_CANDIDATES
                .iter()
                .find_map(|name| which::which(name).ok())
        } else {
            None
        };

        match &tool {
            Some(path) => debug!(tool = %path.display(), "listing tool resolved"),
            None => warn!("no listing tool found; all scans will report it missing"),
        }

        Self::new(tool, timeout)
    }

    /// The resolved tool path, if any
    pub fn tool_path(&self) -> Option<&Path> {
        self.tool.as_deref()
    }

    /// Inspect one archive and classify the outcome
    ///
    /// Spawns `<tool> l -slt <path>` with no interactive input, captures
    /// stdout/stderr, and enforces the per-file timeout by killing the
    /// child. The path is passed as a plain argument, never through a shell.
    pub async fn scan(&self, path: &Path) -> ScanResult {
        let Some(tool) = &self.tool else {
            return ScanResult::without_folder(ScanStatus::ToolMissing);
        };

        let child = Command::new(tool)
            .arg("l")
            .arg("-slt")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "failed to spawn listing tool");
                return classify_exception(&e.to_string());
            }
        };

        // kill_on_drop tears the child down when the timeout drops the
        // wait_with_output future, so nothing is left orphaned.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(archive = %path.display(), error = %e, "listing tool I/O failed");
                return classify_exception(&e.to_string());
            }
            Err(_elapsed) => {
                debug!(archive = %path.display(), timeout = ?self.timeout, "listing timed out");
                return ScanResult::without_folder(ScanStatus::Timeout);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(
                archive = %path.display(),
                exit = ?output.status.code(),
                "listing tool exited non-zero"
            );
            return ScanResult::without_folder(parser::classify_failure(&stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parser::find_root_folder(&stdout) {
            Some(folder) => ScanResult::ready(folder),
            None => ScanResult::without_folder(ScanStatus::NoRootFolder),
        }
    }
}

/// Map an invocation/parsing exception onto the status taxonomy
///
/// Exceptions mentioning password/encryption read as password protection;
/// everything else reads as a corrupted archive.
fn classify_exception(message: &str) -> ScanResult {
    if parser::is_password_error(message) {
        ScanResult::without_folder(ScanStatus::PasswordProtected)
    } else {
        ScanResult::without_folder(ScanStatus::Corrupted)
    }
}
