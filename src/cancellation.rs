//! Soft cancellation of appointments.
//!
//! Cancelling never deletes: the record stays with `cancelado = true`, the
//! reason and instant, and a `[CANCELADO] <motivo>` line in its notes.
//! A series is every appointment of the same professional and patient.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::repository;
use crate::db::store::ClinicStore;
use crate::db::DatabaseError;
use crate::models::dates;
use crate::models::*;

/// Cancel one appointment and persist it.
pub fn cancel_appointment(
    conn: &Connection,
    id: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<Appointment, DatabaseError> {
    let mut appt = repository::get_appointment(conn, id)?
        .ok_or_else(|| DatabaseError::not_found("Appointment", id))?;
    appt.cancel(reason, now)?;
    repository::save_appointment(conn, &appt)?;
    tracing::info!(id = %appt.id, "Appointment cancelled");
    Ok(appt)
}

/// Cancel every active appointment of the pair that starts strictly after
/// `reference`. Returns how many were cancelled.
pub fn cancel_future_appointments(
    conn: &Connection,
    reference: DateTime<Utc>,
    key: &RecurrenceKey,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    if reason.trim().is_empty() {
        return Err(DatabaseError::Validation(
            "cancellation reason must not be empty".into(),
        ));
    }

    let mut cancelled = 0;
    for mut appt in repository::list_appointments_for_pair(conn, key)? {
        if appt.start <= reference || appt.is_cancelled() {
            continue;
        }
        appt.cancel(reason, now)?;
        repository::save_appointment(conn, &appt)?;
        cancelled += 1;
    }

    tracing::info!(
        professional_id = %key.professional_id,
        patient_id = %key.patient_id,
        cancelled,
        "Following appointments cancelled"
    );
    Ok(cancelled)
}

/// Cancel `id` and, when `include_following` is set, the rest of its series
/// after it. Returns the total number cancelled.
pub fn cancel_from(
    conn: &Connection,
    id: &str,
    reason: &str,
    include_following: bool,
    now: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let trigger = cancel_appointment(conn, id, reason, now)?;
    let following = match trigger.recurrence_key() {
        Some(key) if include_following => {
            cancel_future_appointments(conn, trigger.start, &key, reason, now)?
        }
        _ => 0,
    };
    Ok(1 + following)
}

/// Async front for the cancellation rules; each call is one transaction.
#[derive(Debug, Clone)]
pub struct CancellationEngine {
    store: ClinicStore,
}

impl CancellationEngine {
    pub fn new(store: ClinicStore) -> Self {
        Self { store }
    }

    pub async fn cancel(&self, id: &str, reason: &str) -> Result<Appointment, DatabaseError> {
        let (id, reason) = (id.to_string(), reason.to_string());
        self.store
            .transaction(move |conn| cancel_appointment(conn, &id, &reason, dates::now()))
            .await
    }

    pub async fn cancel_following(
        &self,
        reference: DateTime<Utc>,
        professional_id: &str,
        patient_id: &str,
        reason: &str,
    ) -> Result<usize, DatabaseError> {
        let key = RecurrenceKey {
            professional_id: professional_id.to_string(),
            patient_id: patient_id.to_string(),
        };
        let reason = reason.to_string();
        self.store
            .transaction(move |conn| {
                cancel_future_appointments(conn, reference, &key, &reason, dates::now())
            })
            .await
    }

    pub async fn cancel_from(
        &self,
        id: &str,
        reason: &str,
        include_following: bool,
    ) -> Result<usize, DatabaseError> {
        let (id, reason) = (id.to_string(), reason.to_string());
        self.store
            .transaction(move |conn| {
                cancel_from(conn, &id, &reason, include_following, dates::now())
            })
            .await
    }
}
