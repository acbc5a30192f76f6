use std::path::{Path, PathBuf};

use crate::db::store::{ClinicStore, RecordCounts};
use crate::models::dates;

use super::{
    export_snapshot, parse_backup, restore_document, write_backup_file, BackupDocument, BackupError,
};

/// Backup operations bound to one store.
#[derive(Debug, Clone)]
pub struct BackupEngine {
    store: ClinicStore,
}

impl BackupEngine {
    pub fn new(store: ClinicStore) -> Self {
        Self { store }
    }

    pub async fn export(&self) -> Result<BackupDocument, BackupError> {
        self.store
            .read(|conn| export_snapshot(conn, dates::now()))
            .await
    }

    /// Export and write `routini-backup-<day>.json` into `dir`.
    pub async fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, BackupError> {
        let document = self.export().await?;
        write_backup_file(&document, dir)
    }

    /// Validate `text` as a backup document, then replace the store contents
    /// in one transaction. A rejected document never reaches the store.
    pub async fn import_json(&self, text: &str) -> Result<RecordCounts, BackupError> {
        let document = parse_backup(text).inspect_err(|e| {
            tracing::warn!(error = %e, "Backup rejected");
        })?;
        self.store
            .transaction(move |conn| restore_document(conn, &document))
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Backup import rolled back"))
    }

    pub async fn import_file(&self, path: &Path) -> Result<RecordCounts, BackupError> {
        let text = tokio::fs::read_to_string(path).await?;
        self.import_json(&text).await
    }
}
