use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::repository;
use crate::db::store::RecordCounts;

use super::{check_structure, decode_document, BackupDocument, BackupError, COLLECTION_KEYS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorePreview {
    pub version: Option<u64>,
    pub timestamp: Option<String>,
    pub counts: RecordCounts,
    pub total_size_bytes: u64,
    pub compatible: bool,
    pub compatibility_message: Option<String>,
}

/// Parse backup text and decode it. Invalid JSON is `Malformed`.
pub fn parse_backup(text: &str) -> Result<BackupDocument, BackupError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| BackupError::Malformed(e.to_string()))?;
    decode_document(value)
}

/// Replace the store contents with `document`.
///
/// Clears all four tables, then inserts professionals, tags, patients and
/// appointments. Run it inside a transaction: any failure must leave the
/// previous contents in place.
pub fn restore_document(
    conn: &Connection,
    document: &BackupDocument,
) -> Result<RecordCounts, BackupError> {
    repository::clear_all_tables(conn)?;

    for prof in &document.profissionais {
        repository::insert_professional(conn, prof)?;
    }
    for tag in &document.tags {
        repository::insert_tag(conn, tag)?;
    }
    for patient in &document.pacientes {
        repository::insert_patient(conn, patient)?;
    }
    for appt in &document.atendimentos {
        repository::insert_appointment(conn, appt)?;
    }

    let counts = RecordCounts::read(conn)?;
    tracing::info!(
        version = document.version,
        professionals = counts.professionals,
        patients = counts.patients,
        appointments = counts.appointments,
        tags = counts.tags,
        "Backup restored"
    );
    Ok(counts)
}

/// Preview a backup file without touching any store.
pub fn preview_backup(path: &Path) -> Result<RestorePreview, BackupError> {
    let text = std::fs::read_to_string(path)?;
    let total_size_bytes = std::fs::metadata(path)?.len();
    let value: Value =
        serde_json::from_str(&text).map_err(|e| BackupError::Malformed(e.to_string()))?;

    let count = |key: &str| -> u32 {
        value
            .get(key)
            .and_then(Value::as_array)
            .map_or(0, |items| u32::try_from(items.len()).unwrap_or(u32::MAX))
    };
    let [professionals, appointments, patients, tags] = COLLECTION_KEYS.map(count);

    // Same checks as an import, minus the write.
    let (compatible, compatibility_message) =
        match check_structure(&value).and_then(|_| decode_document(value.clone())) {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        };

    Ok(RestorePreview {
        version: value.get("version").and_then(Value::as_u64),
        timestamp: value
            .get("timestamp")
            .and_then(Value::as_str)
            .map(String::from),
        counts: RecordCounts {
            professionals,
            patients,
            appointments,
            tags,
        },
        total_size_bytes,
        compatible,
        compatibility_message,
    })
}
