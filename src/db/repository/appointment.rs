use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::dates::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use crate::models::*;

const SELECT_APPOINTMENT: &str =
    "SELECT id, professional_id, patient_id, kind, start_at, end_at, notes, status,
            cancelled, cancellation_reason, cancelled_at, recurrence_id
     FROM appointments";

/// Raw column values; dates are still text here.
struct AppointmentRow {
    id: String,
    professional_id: String,
    patient_id: Option<String>,
    kind: String,
    start_at: String,
    end_at: String,
    notes: Option<String>,
    status: Option<String>,
    cancelled: bool,
    cancellation_reason: Option<String>,
    cancelled_at: Option<String>,
    recurrence_id: Option<String>,
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let cancellation = if row.cancelled {
        let reason = row
            .cancellation_reason
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                DatabaseError::Validation(format!(
                    "cancelled appointment {} has no cancellation reason",
                    row.id
                ))
            })?;
        CancellationState::Cancelled {
            reason,
            at: parse_optional_timestamp("appointments.cancelled_at", row.cancelled_at)?,
        }
    } else {
        CancellationState::Active
    };

    Ok(Appointment {
        start: parse_timestamp("appointments.start_at", &row.start_at)?,
        end: parse_timestamp("appointments.end_at", &row.end_at)?,
        id: row.id,
        professional_id: row.professional_id,
        patient_id: row.patient_id,
        kind: Role::from_str(&row.kind)?,
        notes: row.notes,
        status: row.status.as_deref().map(AppointmentStatus::from_str).transpose()?,
        cancellation,
        recurrence_id: row.recurrence_id,
    })
}

fn read_appointments(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        Ok(AppointmentRow {
            id: row.get(0)?,
            professional_id: row.get(1)?,
            patient_id: row.get(2)?,
            kind: row.get(3)?,
            start_at: row.get(4)?,
            end_at: row.get(5)?,
            notes: row.get(6)?,
            status: row.get(7)?,
            cancelled: row.get(8)?,
            cancellation_reason: row.get(9)?,
            cancelled_at: row.get(10)?,
            recurrence_id: row.get(11)?,
        })
    })?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

fn cancellation_columns(appt: &Appointment) -> (bool, Option<&str>, Option<String>) {
    match &appt.cancellation {
        CancellationState::Active => (false, None, None),
        CancellationState::Cancelled { reason, at } => {
            (true, Some(reason.as_str()), at.as_ref().map(format_timestamp))
        }
    }
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    let (cancelled, reason, cancelled_at) = cancellation_columns(appt);
    conn.execute(
        "INSERT INTO appointments (id, professional_id, patient_id, kind, start_at, end_at,
         notes, status, cancelled, cancellation_reason, cancelled_at, recurrence_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appt.id,
            appt.professional_id,
            appt.patient_id,
            appt.kind.as_str(),
            format_timestamp(&appt.start),
            format_timestamp(&appt.end),
            appt.notes,
            appt.status.map(|s| s.as_str()),
            cancelled,
            reason,
            cancelled_at,
            appt.recurrence_id,
        ],
    )?;
    Ok(())
}

/// Overwrites every column of an existing appointment, cancellation included.
pub fn save_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    let (cancelled, reason, cancelled_at) = cancellation_columns(appt);
    let changed = conn.execute(
        "UPDATE appointments SET professional_id = ?1, patient_id = ?2, kind = ?3,
         start_at = ?4, end_at = ?5, notes = ?6, status = ?7, cancelled = ?8,
         cancellation_reason = ?9, cancelled_at = ?10, recurrence_id = ?11
         WHERE id = ?12",
        params![
            appt.professional_id,
            appt.patient_id,
            appt.kind.as_str(),
            format_timestamp(&appt.start),
            format_timestamp(&appt.end),
            appt.notes,
            appt.status.map(|s| s.as_str()),
            cancelled,
            reason,
            cancelled_at,
            appt.recurrence_id,
            appt.id,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", &appt.id));
    }
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &str) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("{SELECT_APPOINTMENT} WHERE id = ?1");
    Ok(read_appointments(conn, &sql, &[&id])?.into_iter().next())
}

/// All appointments in insertion order.
pub fn list_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!("{SELECT_APPOINTMENT} ORDER BY rowid");
    read_appointments(conn, &sql, &[])
}

/// Appointments matching `predicate`, evaluated on normalized records.
pub fn query_appointments<P>(
    conn: &Connection,
    predicate: P,
) -> Result<Vec<Appointment>, DatabaseError>
where
    P: Fn(&Appointment) -> bool,
{
    Ok(list_appointments(conn)?
        .into_iter()
        .filter(|a| predicate(a))
        .collect())
}

/// Every appointment of one professional+patient pair, cancelled or not.
pub fn list_appointments_for_pair(
    conn: &Connection,
    key: &RecurrenceKey,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "{SELECT_APPOINTMENT} WHERE professional_id = ?1 AND patient_id = ?2 ORDER BY rowid"
    );
    read_appointments(conn, &sql, &[&key.professional_id, &key.patient_id])
}

pub fn update_appointment(
    conn: &Connection,
    id: &str,
    update: AppointmentUpdate,
) -> Result<Appointment, DatabaseError> {
    let mut appt = get_appointment(conn, id)?
        .ok_or_else(|| DatabaseError::not_found("Appointment", id))?;
    update.apply_to(&mut appt);
    save_appointment(conn, &appt)?;
    Ok(appt)
}

/// Physically removes an appointment. Cancellation goes through the
/// cancellation engine instead.
pub fn delete_appointment(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

/// Removes every appointment of a professional; returns how many went.
pub fn delete_appointments_for_professional(
    conn: &Connection,
    professional_id: &str,
) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM appointments WHERE professional_id = ?1",
        params![professional_id],
    )?)
}

/// Removes every appointment of a patient; returns how many went.
pub fn delete_appointments_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM appointments WHERE patient_id = ?1",
        params![patient_id],
    )?)
}
