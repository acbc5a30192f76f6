use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::dates::{format_timestamp, parse_day_or_timestamp, parse_timestamp};
use crate::models::*;

const SELECT_PATIENT: &str =
    "SELECT id, name, birth_date, diagnosis, responsible_name, responsible_phone,
            responsible_email, clinical_notes, care_team, status, tags, photo,
            team_notes, created_at, updated_at
     FROM patients";

/// Raw column values; dates are still text here.
struct PatientRow {
    id: String,
    name: String,
    birth_date: String,
    diagnosis: String,
    responsible_name: String,
    responsible_phone: String,
    responsible_email: String,
    clinical_notes: String,
    care_team: String,
    status: String,
    tags: String,
    photo: Option<String>,
    team_notes: String,
    created_at: String,
    updated_at: String,
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        birth_date: parse_day_or_timestamp("patients.birth_date", &row.birth_date)?,
        created_at: parse_timestamp("patients.created_at", &row.created_at)?,
        updated_at: parse_timestamp("patients.updated_at", &row.updated_at)?,
        id: row.id,
        name: row.name,
        diagnosis: row.diagnosis,
        responsible: ResponsibleParty {
            name: row.responsible_name,
            phone: row.responsible_phone,
            email: row.responsible_email,
        },
        clinical_notes: row.clinical_notes,
        care_team: serde_json::from_str(&row.care_team)?,
        status: PatientStatus::from_str(&row.status)?,
        tags: serde_json::from_str(&row.tags)?,
        photo: row.photo,
        team_notes: serde_json::from_str(&row.team_notes)?,
    })
}

fn read_patients(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        Ok(PatientRow {
            id: row.get(0)?,
            name: row.get(1)?,
            birth_date: row.get(2)?,
            diagnosis: row.get(3)?,
            responsible_name: row.get(4)?,
            responsible_phone: row.get(5)?,
            responsible_email: row.get(6)?,
            clinical_notes: row.get(7)?,
            care_team: row.get(8)?,
            status: row.get(9)?,
            tags: row.get(10)?,
            photo: row.get(11)?,
            team_notes: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    })?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, birth_date, diagnosis, responsible_name,
         responsible_phone, responsible_email, clinical_notes, care_team, status, tags,
         photo, team_notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            patient.id,
            patient.name,
            format_timestamp(&patient.birth_date),
            patient.diagnosis,
            patient.responsible.name,
            patient.responsible.phone,
            patient.responsible.email,
            patient.clinical_notes,
            serde_json::to_string(&patient.care_team)?,
            patient.status.as_str(),
            serde_json::to_string(&patient.tags)?,
            patient.photo,
            serde_json::to_string(&patient.team_notes)?,
            format_timestamp(&patient.created_at),
            format_timestamp(&patient.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &str) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("{SELECT_PATIENT} WHERE id = ?1");
    Ok(read_patients(conn, &sql, &[&id])?.into_iter().next())
}

/// All patients in insertion order.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!("{SELECT_PATIENT} ORDER BY rowid");
    read_patients(conn, &sql, &[])
}

pub fn query_patients<P>(conn: &Connection, predicate: P) -> Result<Vec<Patient>, DatabaseError>
where
    P: Fn(&Patient) -> bool,
{
    Ok(list_patients(conn)?
        .into_iter()
        .filter(|p| predicate(p))
        .collect())
}

/// Overwrites every column of an existing patient.
pub fn save_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET name = ?1, birth_date = ?2, diagnosis = ?3,
         responsible_name = ?4, responsible_phone = ?5, responsible_email = ?6,
         clinical_notes = ?7, care_team = ?8, status = ?9, tags = ?10, photo = ?11,
         team_notes = ?12, created_at = ?13, updated_at = ?14
         WHERE id = ?15",
        params![
            patient.name,
            format_timestamp(&patient.birth_date),
            patient.diagnosis,
            patient.responsible.name,
            patient.responsible.phone,
            patient.responsible.email,
            patient.clinical_notes,
            serde_json::to_string(&patient.care_team)?,
            patient.status.as_str(),
            serde_json::to_string(&patient.tags)?,
            patient.photo,
            serde_json::to_string(&patient.team_notes)?,
            format_timestamp(&patient.created_at),
            format_timestamp(&patient.updated_at),
            patient.id,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", &patient.id));
    }
    Ok(())
}

pub fn update_patient(
    conn: &Connection,
    id: &str,
    update: PatientUpdate,
) -> Result<Patient, DatabaseError> {
    let mut patient = get_patient(conn, id)?
        .ok_or_else(|| DatabaseError::not_found("Patient", id))?;
    update.apply_to(&mut patient, crate::models::dates::now());
    save_patient(conn, &patient)?;
    Ok(patient)
}

/// Deletes a patient. Appointments referencing it are left in place.
pub fn delete_patient(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}
