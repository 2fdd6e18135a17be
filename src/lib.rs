//! # rar-renamer
//!
//! Backend library for batch-renaming RAR archives after their internal
//! root folder name.
//!
//! ## Design Philosophy
//!
//! rar-renamer is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Non-destructive by default** - Archives are only listed, never
//!   modified; every rename is recorded and reversible until pruned
//!
//! A scan session fans out one external `7z l -slt` listing per archive
//! across a bounded worker pool, classifies each archive (ready, password
//! protected, corrupted, timed out, no root folder), and streams results to
//! subscribers in batches. Accepted files can be renamed to
//! `prefix + root folder + suffix + ".rar"`, and completed renames can be
//! selectively undone from a persisted ledger.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rar_renamer::{Config, RarRenamer, ScanOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let renamer = RarRenamer::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = renamer.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Kick off a scan of a directory of .rar files
//!     let options = ScanOptions {
//!         prefix: "[tv] ".to_string(),
//!         ..Default::default()
//!     };
//!     let session = renamer.start_scan("/data/archives", options).await?;
//!     println!("scanning as session {}", session);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive inspection via the external listing tool
pub mod inspector;
/// Worker-count policy based on drive type
pub mod parallelism;
/// Core renamer implementation (decomposed into focused submodules)
pub mod renamer;
/// Queue and ledger persistence
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, PersistenceConfig, ScanConfig, ToolsConfig};
pub use error::{Error, RenameError, Result, ScanError};
pub use inspector::ArchiveInspector;
pub use parallelism::{DriveKind, clamp_workers, optimal_workers};
pub use renamer::{RarRenamer, apply_affixes, refresh_items};
pub use types::{
    Event, LogEntry, OperationSummary, QueueEntry, RenameRequest, ScanId, ScanItem, ScanOptions,
    ScanResult, ScanStatus, SessionState,
};
