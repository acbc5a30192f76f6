//! `ClinicStore`: the single owner of the clinic database connection.
//!
//! SQLite work is blocking, so every async entry point moves it onto
//! tokio's blocking pool and holds the connection lock for the whole unit.
//! `transaction` commits all writes of its closure together or none.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::repository::{self, Table};
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::dates;
use crate::models::*;
use crate::validation;

/// Per-table row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub professionals: u32,
    pub patients: u32,
    pub appointments: u32,
    pub tags: u32,
}

impl RecordCounts {
    pub fn total(&self) -> u32 {
        self.professionals + self.patients + self.appointments + self.tags
    }

    pub fn read(conn: &Connection) -> Result<Self, DatabaseError> {
        Ok(Self {
            professionals: repository::count_rows(conn, Table::Professionals)?,
            patients: repository::count_rows(conn, Table::Patients)?,
            appointments: repository::count_rows(conn, Table::Appointments)?,
            tags: repository::count_rows(conn, Table::Tags)?,
        })
    }
}

#[derive(Clone)]
pub struct ClinicStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ClinicStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClinicStore").field("path", &self.path).finish()
    }
}

/// Run `op` inside one SQLite transaction. An `Err` from `op` drops the
/// transaction, which rolls it back.
pub fn run_in_transaction<T, E, F>(conn: &mut Connection, op: F) -> Result<T, E>
where
    E: From<DatabaseError>,
    F: FnOnce(&Connection) -> Result<T, E>,
{
    let tx = conn
        .transaction()
        .map_err(|e| E::from(DatabaseError::Transaction(format!("begin failed: {e}"))))?;
    let value = op(&tx)?;
    tx.commit()
        .map_err(|e| E::from(DatabaseError::Transaction(format!("commit failed: {e}"))))?;
    Ok(value)
}

impl ClinicStore {
    /// Open (or create) the database file at `path` and migrate it.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::ConstraintViolation(format!(
                    "cannot create {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = open_database(path)?;
        tracing::info!(path = %path.display(), "Clinic store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Arc::new(Mutex::new(open_memory_database()?)),
            path: None,
        })
    }

    /// Database file location; `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection. Fails if another clone of the store is alive.
    pub fn close(self) -> Result<(), DatabaseError> {
        let mutex = Arc::try_unwrap(self.conn).map_err(|_| {
            DatabaseError::Transaction("store is still shared, cannot close".into())
        })?;
        let conn = mutex
            .into_inner()
            .map_err(|_| DatabaseError::Transaction("connection lock poisoned".into()))?;
        conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e))?;
        tracing::debug!("Clinic store closed");
        Ok(())
    }

    async fn with_connection<T, E, F>(&self, f: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                E::from(DatabaseError::Transaction("connection lock poisoned".into()))
            })?;
            f(&mut guard)
        })
        .await
        .map_err(|e| E::from(DatabaseError::Transaction(format!("blocking task aborted: {e}"))))?
    }

    /// Run a read-only operation against the connection.
    pub async fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
    {
        self.with_connection(move |conn| op(conn)).await
    }

    /// Run `op` as one atomic unit of work.
    pub async fn transaction<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
    {
        self.with_connection(move |conn| run_in_transaction(conn, op)).await
    }

    // ── Professionals ──────────────────────────────────────

    pub async fn add_professional(
        &self,
        prof: Professional,
    ) -> Result<Professional, DatabaseError> {
        validation::validate_professional(&prof)?;
        self.transaction(move |conn| {
            repository::insert_professional(conn, &prof)?;
            tracing::info!(id = %prof.id, "Professional added");
            Ok(prof)
        })
        .await
    }

    pub async fn update_professional(
        &self,
        id: &str,
        update: ProfessionalUpdate,
    ) -> Result<Professional, DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| {
            let prof = repository::update_professional(conn, &id, update)?;
            validation::validate_professional(&prof)?;
            Ok(prof)
        })
        .await
    }

    pub async fn delete_professional(&self, id: &str) -> Result<(), DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| repository::delete_professional(conn, &id))
            .await
    }

    /// Delete a professional and every appointment referencing it.
    pub async fn delete_professional_with_appointments(
        &self,
        id: &str,
    ) -> Result<usize, DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| {
            repository::delete_professional(conn, &id)?;
            let removed = repository::delete_appointments_for_professional(conn, &id)?;
            tracing::info!(
                id = %id,
                appointments = removed,
                "Professional deleted with appointments"
            );
            Ok(removed)
        })
        .await
    }

    pub async fn get_professional(&self, id: &str) -> Result<Option<Professional>, DatabaseError> {
        let id = id.to_string();
        self.read(move |conn| repository::get_professional(conn, &id)).await
    }

    pub async fn list_professionals(&self) -> Result<Vec<Professional>, DatabaseError> {
        self.read(repository::list_professionals).await
    }

    // ── Patients ───────────────────────────────────────────

    /// Sanitize free-text fields, validate, then insert.
    pub async fn add_patient(&self, patient: Patient) -> Result<Patient, DatabaseError> {
        let patient = validation::sanitize_patient(patient);
        validation::validate_patient(&patient, dates::today())?;
        self.transaction(move |conn| {
            repository::insert_patient(conn, &patient)?;
            tracing::info!(id = %patient.id, "Patient added");
            Ok(patient)
        })
        .await
    }

    pub async fn update_patient(
        &self,
        id: &str,
        update: PatientUpdate,
    ) -> Result<Patient, DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| {
            let mut patient = repository::get_patient(conn, &id)?
                .ok_or_else(|| DatabaseError::not_found("Patient", &id))?;
            update.apply_to(&mut patient, dates::now());
            let patient = validation::sanitize_patient(patient);
            validation::validate_patient(&patient, dates::today())?;
            repository::save_patient(conn, &patient)?;
            Ok(patient)
        })
        .await
    }

    pub async fn delete_patient(&self, id: &str) -> Result<(), DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| repository::delete_patient(conn, &id))
            .await
    }

    /// Delete a patient and every appointment referencing it.
    pub async fn delete_patient_with_appointments(&self, id: &str) -> Result<usize, DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| {
            repository::delete_patient(conn, &id)?;
            let removed = repository::delete_appointments_for_patient(conn, &id)?;
            tracing::info!(id = %id, appointments = removed, "Patient deleted with appointments");
            Ok(removed)
        })
        .await
    }

    pub async fn get_patient(&self, id: &str) -> Result<Option<Patient>, DatabaseError> {
        let id = id.to_string();
        self.read(move |conn| repository::get_patient(conn, &id)).await
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError> {
        self.read(repository::list_patients).await
    }

    // ── Appointments ───────────────────────────────────────

    pub async fn add_appointment(&self, appt: Appointment) -> Result<Appointment, DatabaseError> {
        validation::validate_appointment(&appt, dates::today())?;
        self.transaction(move |conn| {
            repository::insert_appointment(conn, &appt)?;
            tracing::info!(id = %appt.id, "Appointment added");
            Ok(appt)
        })
        .await
    }

    pub async fn update_appointment(
        &self,
        id: &str,
        update: AppointmentUpdate,
    ) -> Result<Appointment, DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| {
            let appt = repository::update_appointment(conn, &id, update)?;
            validation::validate_appointment(&appt, dates::today())?;
            Ok(appt)
        })
        .await
    }

    /// Physical delete. Cancelling keeps the record; see `CancellationEngine`.
    pub async fn delete_appointment(&self, id: &str) -> Result<(), DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| repository::delete_appointment(conn, &id))
            .await
    }

    pub async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, DatabaseError> {
        let id = id.to_string();
        self.read(move |conn| repository::get_appointment(conn, &id)).await
    }

    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, DatabaseError> {
        self.read(repository::list_appointments).await
    }

    pub async fn query_appointments<P>(
        &self,
        predicate: P,
    ) -> Result<Vec<Appointment>, DatabaseError>
    where
        P: Fn(&Appointment) -> bool + Send + 'static,
    {
        self.read(move |conn| repository::query_appointments(conn, predicate))
            .await
    }

    // ── Tags ───────────────────────────────────────────────

    pub async fn add_tag(&self, tag: Tag) -> Result<Tag, DatabaseError> {
        validation::validate_tag(&tag)?;
        self.transaction(move |conn| {
            repository::insert_tag(conn, &tag)?;
            Ok(tag)
        })
        .await
    }

    pub async fn update_tag(&self, id: &str, update: TagUpdate) -> Result<Tag, DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| {
            let tag = repository::update_tag(conn, &id, update)?;
            validation::validate_tag(&tag)?;
            Ok(tag)
        })
        .await
    }

    pub async fn delete_tag(&self, id: &str) -> Result<(), DatabaseError> {
        let id = id.to_string();
        self.transaction(move |conn| repository::delete_tag(conn, &id)).await
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, DatabaseError> {
        self.read(repository::list_tags).await
    }

    // ── Whole store ────────────────────────────────────────

    pub async fn record_counts(&self) -> Result<RecordCounts, DatabaseError> {
        self.read(RecordCounts::read).await
    }

    pub async fn count(&self, table: Table) -> Result<u32, DatabaseError> {
        self.read(move |conn| repository::count_rows(conn, table)).await
    }

    /// Empty every table in one transaction.
    pub async fn clear_all(&self) -> Result<(), DatabaseError> {
        self.transaction(|conn| {
            repository::clear_all_tables(conn)?;
            tracing::info!("Clinic store cleared");
            Ok(())
        })
        .await
    }
}
