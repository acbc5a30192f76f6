use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::config;
use crate::db::repository;

use super::{BackupDocument, BackupError, BACKUP_VERSION};

/// Snapshot every table in insertion order.
pub fn export_snapshot(
    conn: &Connection,
    at: DateTime<Utc>,
) -> Result<BackupDocument, BackupError> {
    let document = BackupDocument {
        profissionais: repository::list_professionals(conn)?,
        atendimentos: repository::list_appointments(conn)?,
        pacientes: repository::list_patients(conn)?,
        tags: repository::list_tags(conn)?,
        version: BACKUP_VERSION,
        timestamp: at,
    };

    tracing::info!(
        professionals = document.profissionais.len(),
        patients = document.pacientes.len(),
        appointments = document.atendimentos.len(),
        tags = document.tags.len(),
        "Backup snapshot taken"
    );
    Ok(document)
}

/// Two-space indented JSON, as downloaded by the web client.
pub fn to_pretty_json(document: &BackupDocument) -> Result<String, BackupError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Write `document` into `dir` as `routini-backup-<day>.json`, where the day
/// is the UTC date of the document's timestamp.
pub fn write_backup_file(document: &BackupDocument, dir: &Path) -> Result<PathBuf, BackupError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(config::backup_file_name(document.timestamp.date_naive()));
    std::fs::write(&path, to_pretty_json(document)?)?;
    tracing::info!(path = %path.display(), "Backup written");
    Ok(path)
}
