use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

fn read_tags(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Tag>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        Ok(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            description: row.get(3)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_tag(conn: &Connection, tag: &Tag) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO tags (id, name, color, description) VALUES (?1, ?2, ?3, ?4)",
        params![tag.id, tag.name, tag.color, tag.description],
    )?;
    Ok(())
}

pub fn get_tag(conn: &Connection, id: &str) -> Result<Option<Tag>, DatabaseError> {
    Ok(read_tags(
        conn,
        "SELECT id, name, color, description FROM tags WHERE id = ?1",
        &[&id],
    )?
    .into_iter()
    .next())
}

pub fn list_tags(conn: &Connection) -> Result<Vec<Tag>, DatabaseError> {
    read_tags(
        conn,
        "SELECT id, name, color, description FROM tags ORDER BY rowid",
        &[],
    )
}

pub fn update_tag(conn: &Connection, id: &str, update: TagUpdate) -> Result<Tag, DatabaseError> {
    let mut tag = get_tag(conn, id)?.ok_or_else(|| DatabaseError::not_found("Tag", id))?;
    update.apply_to(&mut tag);
    conn.execute(
        "UPDATE tags SET name = ?1, color = ?2, description = ?3 WHERE id = ?4",
        params![tag.name, tag.color, tag.description, tag.id],
    )?;
    Ok(tag)
}

pub fn delete_tag(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Tag", id));
    }
    Ok(())
}
