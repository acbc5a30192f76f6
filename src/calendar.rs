//! Calendar projection: appointments joined with their professional and
//! patient, styled per professional role, ready for the calendar widget.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::store::ClinicStore;
use crate::db::DatabaseError;
use crate::models::dates;
use crate::models::*;

/// Colors and icon for one role's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleStyle {
    pub bg: &'static str,
    pub border: &'static str,
    pub text: &'static str,
    pub icon: &'static str,
}

const fn style(
    bg: &'static str,
    border: &'static str,
    text: &'static str,
    icon: &'static str,
) -> RoleStyle {
    RoleStyle { bg, border, text, icon }
}

pub fn style_for(role: Role) -> RoleStyle {
    match role {
        Role::ClinicalPsychologist => style("#e0f2fe", "#0284c7", "#0c4a6e", "🩺"),
        Role::SpeechTherapist => style("#fef3c7", "#d97706", "#78350f", "👄"),
        Role::OccupationalTherapist => style("#dcfce7", "#16a34a", "#14532d", "🤲"),
        Role::BehaviorAnalyst => style("#fce7f3", "#db2777", "#831843", "🎯"),
        Role::TherapeuticCompanion => style("#f3e8ff", "#9333ea", "#581c87", "👥"),
        Role::ClinicalSupervisor => style("#fef9c3", "#ca8a04", "#713f12", "👨‍💼"),
        Role::PhysicalEducator => style("#fee2e2", "#dc2626", "#7f1d1d", "🏃"),
        Role::MusicTherapist => style("#f3f4f6", "#4b5563", "#1f2937", "🎵"),
        Role::Pedagogue => style("#d9f99d", "#65a30d", "#365314", "📚"),
        Role::Nutritionist => style("#e0f2fe", "#0ea5e9", "#0c4a6e", "🥗"),
        Role::Physician => style("#fee2e2", "#dc2626", "#7f1d1d", "👨‍⚕️"),
        Role::ClinicalCoordinator => style("#f5f5f4", "#292524", "#1c1917", "👨‍💼"),
        Role::Receptionist => style("#e0f7fe", "#0891b2", "#164e63", "👩‍💼"),
        Role::Intern => style("#f3e8ff", "#9333ea", "#581c87", "👨‍🎓"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventProps {
    pub tooltip: String,
    pub icon: String,
    pub profissional: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub background_color: String,
    pub border_color: String,
    pub text_color: String,
    pub profissional_id: String,
    pub paciente_id: String,
    /// The professional's role, not the appointment's.
    pub tipo: Role,
    pub observacoes: String,
    pub extended_props: EventProps,
}

fn to_event(appt: &Appointment, prof: &Professional, patient: &Patient) -> CalendarEvent {
    let style = style_for(prof.role);
    CalendarEvent {
        id: appt.id.clone(),
        title: format!("{} - {}", patient.name, prof.name),
        start: dates::format_timestamp(&appt.start),
        end: dates::format_timestamp(&appt.end),
        background_color: style.bg.into(),
        border_color: style.border.into(),
        text_color: style.text.into(),
        profissional_id: prof.id.clone(),
        paciente_id: patient.id.clone(),
        tipo: prof.role,
        observacoes: appt.notes.clone().unwrap_or_default(),
        extended_props: EventProps {
            tooltip: format!(
                "{} {}<br><span class=\"text-gray-500\">{}</span>",
                style.icon, patient.name, prof.name
            ),
            icon: style.icon.into(),
            profissional: prof.name.clone(),
        },
    }
}

/// Project appointments into calendar events.
///
/// Cancelled appointments are dropped, as are appointments whose
/// professional or patient no longer exists. Input order is kept.
pub fn project_events(
    professionals: &[Professional],
    patients: &[Patient],
    appointments: &[Appointment],
) -> Vec<CalendarEvent> {
    let profs: HashMap<&str, &Professional> =
        professionals.iter().map(|p| (p.id.as_str(), p)).collect();
    let pats: HashMap<&str, &Patient> = patients.iter().map(|p| (p.id.as_str(), p)).collect();

    let events: Vec<CalendarEvent> = appointments
        .iter()
        .filter(|a| !a.is_cancelled())
        .filter_map(|a| {
            let prof = profs.get(a.professional_id.as_str())?;
            let patient = pats.get(a.patient_id.as_deref()?)?;
            Some(to_event(a, prof, patient))
        })
        .collect();

    tracing::debug!(
        appointments = appointments.len(),
        events = events.len(),
        "Calendar projected"
    );
    events
}

pub fn find_event<'a>(events: &'a [CalendarEvent], id: &str) -> Option<&'a CalendarEvent> {
    events.iter().find(|e| e.id == id)
}

/// Next active appointments starting at or after `from`, earliest first.
pub fn upcoming_appointments(
    appointments: &[Appointment],
    from: DateTime<Utc>,
    max: usize,
) -> Vec<Appointment> {
    let mut upcoming: Vec<Appointment> = appointments
        .iter()
        .filter(|a| !a.is_cancelled() && a.start >= from)
        .cloned()
        .collect();
    upcoming.sort_by_key(|a| a.start);
    upcoming.truncate(max);
    upcoming
}

/// Active appointments starting within `[day_start, day_end]`, earliest first.
pub fn day_agenda(
    appointments: &[Appointment],
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
) -> Vec<Appointment> {
    let mut agenda: Vec<Appointment> = appointments
        .iter()
        .filter(|a| !a.is_cancelled() && a.start >= day_start && a.start <= day_end)
        .cloned()
        .collect();
    agenda.sort_by_key(|a| a.start);
    agenda
}

/// Reads a consistent snapshot of the store and projects it.
#[derive(Debug, Clone)]
pub struct CalendarProjection {
    store: ClinicStore,
}

impl CalendarProjection {
    pub fn new(store: ClinicStore) -> Self {
        Self { store }
    }

    pub async fn events(&self) -> Result<Vec<CalendarEvent>, DatabaseError> {
        self.store
            .read(|conn| {
                let professionals = crate::db::repository::list_professionals(conn)?;
                let patients = crate::db::repository::list_patients(conn)?;
                let appointments = crate::db::repository::list_appointments(conn)?;
                Ok(project_events(&professionals, &patients, &appointments))
            })
            .await
    }

    pub async fn upcoming(
        &self,
        from: DateTime<Utc>,
        max: usize,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let appointments = self.store.list_appointments().await?;
        Ok(upcoming_appointments(&appointments, from, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn start(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn fixture() -> (Vec<Professional>, Vec<Patient>) {
        let prof = Professional::new("Paula", Role::TherapeuticCompanion, vec![]);
        let patient = Patient::new("Xavier", NaiveDate::from_ymd_opt(2016, 5, 2).unwrap());
        (vec![prof], vec![patient])
    }

    fn appt(prof: &str, patient: Option<&str>, at: DateTime<Utc>) -> Appointment {
        Appointment::new(
            prof,
            patient.map(String::from),
            Role::Physician,
            at,
            at + Duration::hours(1),
        )
    }

    #[test]
    fn event_carries_style_and_labels() {
        let (profs, pats) = fixture();
        let mut a = appt(&profs[0].id, Some(&pats[0].id), start(10, 9));
        a.notes = Some("trazer jogo".into());
        let events = project_events(&profs, &pats, &[a.clone()]);

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.title, "Xavier - Paula");
        assert_eq!(event.start, "2025-03-10T09:00:00.000Z");
        assert_eq!(event.background_color, "#f3e8ff");
        assert_eq!(event.border_color, "#9333ea");
        assert_eq!(event.text_color, "#581c87");
        assert_eq!(event.tipo, Role::TherapeuticCompanion);
        assert_eq!(event.observacoes, "trazer jogo");
        assert_eq!(
            event.extended_props.tooltip,
            "👥 Xavier<br><span class=\"text-gray-500\">Paula</span>"
        );
        assert_eq!(find_event(&events, &a.id), Some(event));
    }

    #[test]
    fn event_serializes_with_widget_keys() {
        let (profs, pats) = fixture();
        let a = appt(&profs[0].id, Some(&pats[0].id), start(10, 9));
        let value = serde_json::to_value(&project_events(&profs, &pats, &[a])[0]).unwrap();
        assert_eq!(value["backgroundColor"], "#f3e8ff");
        assert_eq!(value["profissionalId"], profs[0].id.as_str());
        assert_eq!(value["tipo"], "AT");
        assert_eq!(value["observacoes"], "");
        assert_eq!(value["extendedProps"]["icon"], "👥");
    }

    #[test]
    fn orphans_and_cancelled_are_dropped() {
        let (profs, pats) = fixture();
        let mut cancelled = appt(&profs[0].id, Some(&pats[0].id), start(10, 9));
        cancelled.cancel("feriado", Utc::now()).unwrap();
        let input = vec![
            appt("ghost", Some(&pats[0].id), start(10, 9)),
            appt(&profs[0].id, Some("ghost"), start(10, 9)),
            appt(&profs[0].id, None, start(10, 9)),
            cancelled,
            appt(&profs[0].id, Some(&pats[0].id), start(12, 9)),
            appt(&profs[0].id, Some(&pats[0].id), start(11, 9)),
        ];
        let events = project_events(&profs, &pats, &input);
        let starts: Vec<_> = events.iter().map(|e| e.start.as_str()).collect();
        assert_eq!(starts, ["2025-03-12T09:00:00.000Z", "2025-03-11T09:00:00.000Z"]);
    }

    #[test]
    fn every_role_has_an_icon() {
        for role in Role::ALL {
            assert!(!style_for(*role).icon.is_empty(), "{role}");
        }
    }

    #[test]
    fn upcoming_sorts_filters_and_truncates() {
        let mut cancelled = appt("p", None, start(11, 9));
        cancelled.cancel("feriado", Utc::now()).unwrap();
        let input = vec![
            appt("p", None, start(14, 9)),
            appt("p", None, start(9, 9)),
            cancelled,
            appt("p", None, start(12, 9)),
            appt("p", None, start(10, 9)),
        ];
        let upcoming = upcoming_appointments(&input, start(10, 9), 2);
        let starts: Vec<_> = upcoming.iter().map(|a| a.start).collect();
        assert_eq!(starts, [start(10, 9), start(12, 9)]);
    }

    #[test]
    fn day_agenda_is_inclusive() {
        let input = vec![
            appt("p", None, start(10, 18)),
            appt("p", None, start(10, 0)),
            appt("p", None, start(11, 0)),
            appt("p", None, start(9, 23)),
        ];
        let agenda = day_agenda(&input, start(10, 0), start(11, 0));
        let starts: Vec<_> = agenda.iter().map(|a| a.start).collect();
        assert_eq!(starts, [start(10, 0), start(10, 18), start(11, 0)]);
    }

    #[tokio::test]
    async fn projection_reads_from_store() {
        let store = ClinicStore::open_in_memory().unwrap();
        let prof = store
            .add_professional(Professional::new("Paula", Role::Pedagogue, vec![]))
            .await
            .unwrap();
        let mut patient = Patient::new("Xavier", NaiveDate::from_ymd_opt(2016, 5, 2).unwrap());
        patient.diagnosis = "Dislexia em acompanhamento".into();
        patient.responsible = ResponsibleParty {
            name: "Rita".into(),
            phone: "21998765432".into(),
            email: "rita@example.com".into(),
        };
        let patient = store.add_patient(patient).await.unwrap();
        store
            .add_appointment(appt(&prof.id, Some(&patient.id), start(10, 9)))
            .await
            .unwrap();

        let projection = CalendarProjection::new(store);
        let events = projection.events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].extended_props.icon, "📚");
        assert_eq!(projection.upcoming(start(1, 0), 5).await.unwrap().len(), 1);
    }
}
