use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

const SELECT_PROFESSIONAL: &str =
    "SELECT id, name, role, availability, color FROM professionals";

struct ProfessionalRow {
    id: String,
    name: String,
    role: String,
    availability: String,
    color: String,
}

fn professional_from_row(row: ProfessionalRow) -> Result<Professional, DatabaseError> {
    Ok(Professional {
        id: row.id,
        name: row.name,
        role: Role::from_str(&row.role)?,
        availability: serde_json::from_str(&row.availability)?,
        color: row.color,
    })
}

fn read_professionals(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Professional>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        Ok(ProfessionalRow {
            id: row.get(0)?,
            name: row.get(1)?,
            role: row.get(2)?,
            availability: row.get(3)?,
            color: row.get(4)?,
        })
    })?;

    let mut professionals = Vec::new();
    for row in rows {
        professionals.push(professional_from_row(row?)?);
    }
    Ok(professionals)
}

pub fn insert_professional(conn: &Connection, prof: &Professional) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO professionals (id, name, role, availability, color)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            prof.id,
            prof.name,
            prof.role.as_str(),
            serde_json::to_string(&prof.availability)?,
            prof.color,
        ],
    )?;
    Ok(())
}

pub fn get_professional(
    conn: &Connection,
    id: &str,
) -> Result<Option<Professional>, DatabaseError> {
    let sql = format!("{SELECT_PROFESSIONAL} WHERE id = ?1");
    Ok(read_professionals(conn, &sql, &[&id])?.into_iter().next())
}

/// All professionals in insertion order.
pub fn list_professionals(conn: &Connection) -> Result<Vec<Professional>, DatabaseError> {
    let sql = format!("{SELECT_PROFESSIONAL} ORDER BY rowid");
    read_professionals(conn, &sql, &[])
}

pub fn query_professionals<P>(
    conn: &Connection,
    predicate: P,
) -> Result<Vec<Professional>, DatabaseError>
where
    P: Fn(&Professional) -> bool,
{
    Ok(list_professionals(conn)?
        .into_iter()
        .filter(|p| predicate(p))
        .collect())
}

/// Merges `update` into the stored professional and returns the result.
pub fn update_professional(
    conn: &Connection,
    id: &str,
    update: ProfessionalUpdate,
) -> Result<Professional, DatabaseError> {
    let mut prof = get_professional(conn, id)?
        .ok_or_else(|| DatabaseError::not_found("Professional", id))?;
    update.apply_to(&mut prof);

    conn.execute(
        "UPDATE professionals SET name = ?1, role = ?2, availability = ?3, color = ?4
         WHERE id = ?5",
        params![
            prof.name,
            prof.role.as_str(),
            serde_json::to_string(&prof.availability)?,
            prof.color,
            prof.id,
        ],
    )?;
    Ok(prof)
}

/// Deletes a professional. Appointments referencing it are left in place.
pub fn delete_professional(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM professionals WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Professional", id));
    }
    Ok(())
}
