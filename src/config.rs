use std::path::PathBuf;

use chrono::NaiveDate;

/// Application-level constants
pub const APP_NAME: &str = "Routini";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "ROUTINI_DB";

/// Get the application data directory
/// ~/Routini/ on all platforms; falls back to the working directory when
/// no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default clinic database file
pub fn database_path() -> PathBuf {
    std::env::var_os(DB_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| app_data_dir().join("routini.db"))
}

/// Default directory for exported backups
pub fn backups_dir() -> PathBuf {
    app_data_dir().join("backups")
}

/// `routini-backup-2025-03-10.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("routini-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "routini=info,routini_lib=info"
}
