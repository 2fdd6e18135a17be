//! Worker-count policy for scan sessions
//!
//! The worker count is derived from the kind of storage backing the scan
//! directory: solid-state drives tolerate far more concurrent listing
//! processes than rotational ones. A user-supplied override always wins.

use crate::error::ScanError;
use std::path::Path;
use tracing::debug;

/// Hard bounds applied to user-supplied worker overrides
pub const WORKER_LIMIT: std::ops::RangeInclusive<usize> = 1..=256;

/// Kind of storage backing a directory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveKind {
    /// Solid-state storage
    SolidState,
    /// Rotational (spinning) storage
    Rotational,
    /// Classification ran but could not determine the media type
    Unknown,
}

/// Compute the worker count for scanning `directory`.
///
/// - A positive `override_workers` is returned unchanged — user intent wins.
/// - Solid-state (or undetermined) storage: `cores × 4`.
/// - Rotational storage: `max(16, cores)`.
/// - If classification itself fails (permissions, unsupported platform,
///   device enumeration error): `cores × 2`.
///
/// The result is deterministic for identical inputs. Callers are expected
/// to clamp overrides with [`clamp_workers`] before passing them in.
pub fn optimal_workers(directory: &Path, override_workers: Option<usize>) -> usize {
    if let Some(n) = override_workers
        && n > 0
    {
        return n;
    }

    let cores = num_cpus::get();
    match classify_drive(directory) {
        Ok(DriveKind::Rotational) => {
            debug!(dir = %directory.display(), cores, "rotational drive detected");
            std::cmp::max(16, cores)
        }
        Ok(kind) => {
            debug!(dir = %directory.display(), cores, ?kind, "treating drive as solid-state");
            cores * 4
        }
        Err(e) => {
            debug!(dir = %directory.display(), cores, error = %e, "drive detection failed");
            cores * 2
        }
    }
}

/// Clamp a user-supplied worker override into the supported range
pub fn clamp_workers(workers: usize) -> usize {
    workers.clamp(*WORKER_LIMIT.start(), *WORKER_LIMIT.end())
}

/// Classify the storage backing `directory`.
///
/// On Linux this resolves the directory's block device through
/// `/sys/dev/block` and reads the kernel's `queue/rotational` flag. Other
/// platforms report classification as unsupported, which lands callers on
/// the `cores × 2` fallback.
#[cfg(target_os = "linux")]
pub fn classify_drive(directory: &Path) -> Result<DriveKind, ScanError> {
    use std::os::unix::fs::MetadataExt;

    let metadata = std::fs::metadata(directory)
        .map_err(|e| ScanError::DriveDetection(format!("stat {}: {}", directory.display(), e)))?;

    let dev = metadata.dev();
    let (major, minor) = (libc::major(dev), libc::minor(dev));

    // /sys/dev/block/<maj>:<min> resolves to the partition's sysfs node;
    // the rotational flag lives on the owning disk, one level up.
    let dev_link = format!("/sys/dev/block/{major}:{minor}");
    let dev_dir = std::fs::canonicalize(&dev_link)
        .map_err(|e| ScanError::DriveDetection(format!("resolve {dev_link}: {e}")))?;

    let candidates = [
        dev_dir.join("queue/rotational"),
        dev_dir
            .parent()
            .map(|p| p.join("queue/rotational"))
            .unwrap_or_default(),
    ];

    for flag_path in &candidates {
        match std::fs::read_to_string(flag_path) {
            Ok(flag) => {
                return Ok(match flag.trim() {
                    "0" => DriveKind::SolidState,
                    "1" => DriveKind::Rotational,
                    _ => DriveKind::Unknown,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(ScanError::DriveDetection(format!(
                    "read {}: {}",
                    flag_path.display(),
                    e
                )));
            }
        }
    }

    Ok(DriveKind::Unknown)
}

/// Classify the storage backing `directory`.
///
/// Unsupported on this platform; callers land on the `cores × 2` fallback.
#[cfg(not(target_os = "linux"))]
pub fn classify_drive(_directory: &Path) -> Result<DriveKind, ScanError> {
    Err(ScanError::DriveDetection(
        "drive-type classification is not supported on this platform".to_string(),
    ))
}
