//! Configuration types for rar-renamer

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Scan behavior configuration (batching, pausing, timeouts)
///
/// Groups settings related to how scan sessions run. Used as a nested
/// sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of results delivered per batch event (default: 50)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Interval at which paused workers re-check the pause flag (default: 100ms)
    #[serde(default = "default_pause_poll_interval", with = "duration_millis")]
    pub pause_poll_interval: Duration,

    /// Per-archive listing timeout (default: 30s)
    #[serde(default = "default_scan_timeout", with = "duration_millis")]
    pub scan_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            pause_poll_interval: default_pause_poll_interval(),
            scan_timeout: default_scan_timeout(),
        }
    }
}

/// External tool configuration
///
/// Groups settings for the external archive-listing binary.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to 7z executable (auto-detected if None)
    #[serde(default)]
    pub sevenzip_path: Option<PathBuf>,

    /// Whether to search PATH for the listing binary if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sevenzip_path: None,
            search_path: true,
        }
    }
}

/// Persistence configuration for the rename queue and ledger files
///
/// Both files are plain JSON arrays, loaded wholesale at startup and
/// rewritten wholesale on every mutation. A missing file is an empty store,
/// not an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backing file for the persistent rename queue (default: "queue.json")
    #[serde(default = "default_queue_path")]
    pub queue_path: PathBuf,

    /// Backing file for the rename ledger (default: "rename_log.json")
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            queue_path: default_queue_path(),
            ledger_path: default_ledger_path(),
        }
    }
}

/// Main configuration for [`RarRenamer`](crate::RarRenamer)
///
/// Fields are organized into logical sub-configs:
/// - [`scan`](ScanConfig) — batching, pause polling, timeouts
/// - [`tools`](ToolsConfig) — the external listing binary
/// - [`persistence`](PersistenceConfig) — queue and ledger file locations
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scan behavior settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Queue and ledger storage locations
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

// Convenience accessors for the most commonly read settings.
impl Config {
    /// Batch size for scan result delivery
    pub fn batch_size(&self) -> usize {
        self.scan.batch_size
    }

    /// Per-archive listing timeout
    pub fn scan_timeout(&self) -> Duration {
        self.scan.scan_timeout
    }
}

fn default_batch_size() -> usize {
    50
}

fn default_pause_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_scan_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_queue_path() -> PathBuf {
    PathBuf::from("queue.json")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("rename_log.json")
}

/// Serialize `Duration` fields as integer milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
