//! JSON backup and restore of the whole clinic store.
//!
//! Export snapshots all four tables into one `BackupDocument`. Import checks
//! the raw document's shape before touching anything, then replaces the
//! store contents in a single transaction.

mod document;
mod engine;
mod export;
mod restore;

use crate::db::{DatabaseError, CURRENT_SCHEMA_VERSION};
use thiserror::Error;

/// Format version written by this build; imports accept `1..=BACKUP_VERSION`.
/// A backup carries the schema version of the store it came from.
pub const BACKUP_VERSION: u32 = CURRENT_SCHEMA_VERSION;

// ═══════════════════════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Incompatible backup version: {found} (supported up to {supported})")]
    IncompatibleVersion { found: String, supported: u32 },

    #[error("Malformed backup: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use document::*;
pub use engine::*;
pub use export::*;
pub use restore::*;
