pub mod sqlite;
pub mod repository;
pub mod store;

pub use sqlite::*;
pub use repository::*;
pub use store::ClinicStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid date in {field}: {value}")]
    InvalidDate { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity_type: &str, id: &str) -> Self {
        DatabaseError::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
