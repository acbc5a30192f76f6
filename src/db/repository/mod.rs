//! Repository layer: entity-scoped database operations.
//!
//! Every function takes a `&Connection`, so the same code runs standalone or
//! inside a `Transaction` (which derefs to `Connection`).

mod appointment;
mod patient;
mod professional;
mod tag;

use rusqlite::Connection;

use super::DatabaseError;

pub use appointment::*;
pub use patient::*;
pub use professional::*;
pub use tag::*;

/// The four entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Professionals,
    Patients,
    Appointments,
    Tags,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Professionals,
        Table::Patients,
        Table::Appointments,
        Table::Tags,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Professionals => "professionals",
            Table::Patients => "patients",
            Table::Appointments => "appointments",
            Table::Tags => "tags",
        }
    }
}

pub fn count_rows(conn: &Connection, table: Table) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.name()),
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn clear_table(conn: &Connection, table: Table) -> Result<usize, DatabaseError> {
    Ok(conn.execute(&format!("DELETE FROM {}", table.name()), [])?)
}

/// Empties all four tables. Callers wanting atomicity run this inside a transaction.
pub fn clear_all_tables(conn: &Connection) -> Result<(), DatabaseError> {
    for table in Table::ALL {
        clear_table(conn, table)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use rusqlite::params;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_professional(conn: &Connection, name: &str) -> Professional {
        let prof = Professional::new(
            name,
            Role::TherapeuticCompanion,
            vec![Availability { day: 1, shift: Shift::Morning }],
        );
        insert_professional(conn, &prof).unwrap();
        prof
    }

    fn make_patient(conn: &Connection, name: &str) -> Patient {
        let mut patient = Patient::new(name, NaiveDate::from_ymd_opt(2017, 8, 14).unwrap());
        patient.care_team.push(CareAssignment {
            professional_id: "prof-x".into(),
            role: CareRole::TherapeuticCompanion,
        });
        patient.team_notes.push("gosta de música".into());
        insert_patient(conn, &patient).unwrap();
        patient
    }

    fn make_appointment(conn: &Connection, prof: &str, patient: Option<&str>) -> Appointment {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let appt = Appointment::new(
            prof,
            patient.map(String::from),
            Role::TherapeuticCompanion,
            start,
            start + Duration::hours(1),
        );
        insert_appointment(conn, &appt).unwrap();
        appt
    }

    #[test]
    fn professional_insert_and_retrieve() {
        let conn = test_db();
        let prof = make_professional(&conn, "Carla");
        let loaded = get_professional(&conn, &prof.id).unwrap().unwrap();
        assert_eq!(loaded, prof);
        assert_eq!(loaded.color, "#FF7F0E");
    }

    #[test]
    fn professional_update_merges_fields() {
        let conn = test_db();
        let prof = make_professional(&conn, "Carla");
        let updated = update_professional(
            &conn,
            &prof.id,
            ProfessionalUpdate {
                role: Some(Role::SpeechTherapist),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "Carla");
        assert_eq!(updated.color, Role::SpeechTherapist.color());
        assert_eq!(updated.availability.len(), 1);
        assert_eq!(get_professional(&conn, &prof.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn update_and_delete_missing_ids_are_not_found() {
        let conn = test_db();
        let err = update_professional(&conn, "nope", ProfessionalUpdate::default()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        assert!(matches!(
            delete_patient(&conn, "nope").unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
        assert!(matches!(
            delete_appointment(&conn, "nope").unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
        assert!(matches!(
            update_tag(&conn, "nope", TagUpdate::default()).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let conn = test_db();
        let prof = make_professional(&conn, "Carla");
        assert!(insert_professional(&conn, &prof).is_err());
    }

    #[test]
    fn patient_round_trip_yields_typed_dates() {
        let conn = test_db();
        let patient = make_patient(&conn, "Bruno");
        let loaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(loaded.birth_day(), NaiveDate::from_ymd_opt(2017, 8, 14).unwrap());
        assert_eq!(loaded.birth_date, patient.birth_date);
        // Stored text is millisecond precision.
        assert_eq!(
            loaded.created_at.timestamp_millis(),
            patient.created_at.timestamp_millis()
        );
        assert_eq!(loaded.care_team, patient.care_team);
        assert_eq!(loaded.team_notes, vec!["gosta de música".to_string()]);
    }

    #[test]
    fn appointment_round_trip_yields_typed_dates() {
        let conn = test_db();
        let appt = make_appointment(&conn, "prof-1", Some("pac-1"));
        let loaded = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(loaded, appt);
        assert!(loaded.end > loaded.start);
    }

    #[test]
    fn corrupt_stored_date_surfaces_invalid_date() {
        let conn = test_db();
        let appt = make_appointment(&conn, "prof-1", None);
        conn.execute(
            "UPDATE appointments SET start_at = 'ontem' WHERE id = ?1",
            params![appt.id],
        )
        .unwrap();
        let err = get_appointment(&conn, &appt.id).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidDate { .. }));
    }

    #[test]
    fn cancelled_row_without_reason_is_rejected() {
        let conn = test_db();
        let appt = make_appointment(&conn, "prof-1", Some("pac-1"));
        conn.execute(
            "UPDATE appointments SET cancelled = 1, cancellation_reason = NULL WHERE id = ?1",
            params![appt.id],
        )
        .unwrap();
        let err = get_appointment(&conn, &appt.id).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(list_appointments(&conn).is_err());
    }

    #[test]
    fn deleting_professional_leaves_appointments() {
        let conn = test_db();
        let prof = make_professional(&conn, "Carla");
        let appt = make_appointment(&conn, &prof.id, None);
        delete_professional(&conn, &prof.id).unwrap();
        assert!(get_appointment(&conn, &appt.id).unwrap().is_some());
    }

    #[test]
    fn bulk_delete_dependents() {
        let conn = test_db();
        make_appointment(&conn, "prof-1", Some("pac-1"));
        make_appointment(&conn, "prof-1", Some("pac-2"));
        make_appointment(&conn, "prof-2", Some("pac-1"));
        assert_eq!(delete_appointments_for_professional(&conn, "prof-1").unwrap(), 2);
        assert_eq!(delete_appointments_for_patient(&conn, "pac-1").unwrap(), 1);
        assert_eq!(count_rows(&conn, Table::Appointments).unwrap(), 0);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let conn = test_db();
        let names = ["Zeca", "Ana", "Maria"];
        for name in names {
            make_professional(&conn, name);
        }
        let listed: Vec<_> = list_professionals(&conn)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn query_filters_with_predicate() {
        let conn = test_db();
        make_appointment(&conn, "prof-1", Some("pac-1"));
        make_appointment(&conn, "prof-1", None);
        let with_patient = query_appointments(&conn, |a| a.patient_id.is_some()).unwrap();
        assert_eq!(with_patient.len(), 1);
    }

    #[test]
    fn pair_listing_matches_exactly() {
        let conn = test_db();
        make_appointment(&conn, "prof-1", Some("pac-1"));
        make_appointment(&conn, "prof-1", Some("pac-2"));
        let key = RecurrenceKey {
            professional_id: "prof-1".into(),
            patient_id: "pac-1".into(),
        };
        assert_eq!(list_appointments_for_pair(&conn, &key).unwrap().len(), 1);
    }

    #[test]
    fn clear_all_tables_empties_everything() {
        let conn = test_db();
        make_professional(&conn, "Carla");
        make_patient(&conn, "Bruno");
        insert_tag(&conn, &Tag::new("TEA", "#00ff00")).unwrap();
        clear_all_tables(&conn).unwrap();
        for table in Table::ALL {
            assert_eq!(count_rows(&conn, table).unwrap(), 0, "{}", table.name());
        }
    }

    #[test]
    fn tag_update_merges() {
        let conn = test_db();
        let tag = Tag::new("TEA", "#00ff00");
        insert_tag(&conn, &tag).unwrap();
        let updated = update_tag(
            &conn,
            &tag.id,
            TagUpdate {
                description: Some(Some("Transtorno do espectro autista".into())),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "TEA");
        assert_eq!(get_tag(&conn, &tag.id).unwrap().unwrap(), updated);
    }
}
