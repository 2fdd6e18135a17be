//! Parser for the listing tool's `-slt` technical output

use crate::types::ScanStatus;

/// Find the archive's root folder in a `7z l -slt` listing.
///
/// The technical listing is a sequence of records, each introduced by a
/// `Path = <value>` line and optionally carrying a later `Folder = <+|->`
/// line for the same record. The first record that is flagged as a folder
/// and whose path contains no path separator is the root folder; parsing
/// stops there and later entries are never inspected.
///
/// Returns the root folder name with trailing separators trimmed, or `None`
/// when the listing contains no top-level folder entry.
pub fn find_root_folder(stdout: &str) -> Option<String> {
    let mut current_path: Option<&str> = None;

    for line in stdout.lines() {
        if let Some(value) = line.strip_prefix("Path = ") {
            current_path = Some(value);
        } else if let Some(flag) = line.strip_prefix("Folder = ")
            && flag.trim() == "+"
            && let Some(path) = current_path
            && !path.contains('/')
            && !path.contains('\\')
            && !path.is_empty()
        {
            return Some(path.trim_end_matches(['/', '\\']).to_string());
        }
    }

    None
}

/// Check if tool output indicates a password/encryption problem
pub fn is_password_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("password") || lower.contains("encrypt")
}

/// Classify a failed listing (non-zero exit) from its stderr text.
///
/// Password/encryption indicators win; CRC/data-error indicators and
/// anything unrecognized both read as a corrupted archive.
pub fn classify_failure(stderr: &str) -> ScanStatus {
    if is_password_error(stderr) {
        ScanStatus::PasswordProtected
    } else {
        ScanStatus::Corrupted
    }
}
