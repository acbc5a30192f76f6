use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dates;
use super::enums::{AppointmentStatus, Role};
use crate::db::DatabaseError;

/// Prefix written into an appointment's notes when it is cancelled.
pub const CANCELLATION_NOTE_PREFIX: &str = "[CANCELADO]";

/// Cancellation status of an appointment. `Active -> Cancelled` is the only
/// transition and `Cancelled` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CancellationState {
    #[default]
    Active,
    Cancelled {
        reason: String,
        /// Backups from older installations carry no cancellation instant.
        at: Option<DateTime<Utc>>,
    },
}

/// Implicit recurrence group: every appointment between the same professional
/// and patient belongs to the same series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecurrenceKey {
    pub professional_id: String,
    pub patient_id: String,
}

/// A scheduled session (`atendimento`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AppointmentRecord", into = "AppointmentRecord")]
pub struct Appointment {
    pub id: String,
    pub professional_id: String,
    pub patient_id: Option<String>,
    pub kind: Role,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub cancellation: CancellationState,
    /// Round-tripped for compatibility; nothing groups on it.
    pub recurrence_id: Option<String>,
}

impl Appointment {
    pub fn new(
        professional_id: impl Into<String>,
        patient_id: Option<String>,
        kind: Role,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: super::new_id(),
            professional_id: professional_id.into(),
            patient_id,
            kind,
            start,
            end,
            notes: None,
            status: Some(AppointmentStatus::Scheduled),
            cancellation: CancellationState::Active,
            recurrence_id: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cancellation, CancellationState::Cancelled { .. })
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        match &self.cancellation {
            CancellationState::Cancelled { reason, .. } => Some(reason),
            CancellationState::Active => None,
        }
    }

    pub fn recurrence_key(&self) -> Option<RecurrenceKey> {
        self.patient_id.as_ref().map(|patient_id| RecurrenceKey {
            professional_id: self.professional_id.clone(),
            patient_id: patient_id.clone(),
        })
    }

    /// Apply the cancellation transition: record the reason and instant and
    /// append `[CANCELADO] <reason>` to the notes.
    pub fn cancel(&mut self, reason: &str, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DatabaseError::Validation(
                "cancellation reason must not be empty".into(),
            ));
        }
        if self.is_cancelled() {
            return Err(DatabaseError::Validation(format!(
                "appointment {} is already cancelled",
                self.id
            )));
        }

        let marker = format!("{CANCELLATION_NOTE_PREFIX} {reason}");
        self.notes = Some(match self.notes.take().filter(|n| !n.is_empty()) {
            Some(existing) => format!("{existing}\n{marker}"),
            None => marker,
        });
        self.status = Some(AppointmentStatus::Cancelled);
        self.cancellation = CancellationState::Cancelled {
            reason: reason.to_string(),
            at: Some(at),
        };
        Ok(())
    }
}

/// Partial edit from the scheduling form. Cancellation is not editable here.
#[derive(Debug, Clone, Default)]
pub struct AppointmentUpdate {
    pub professional_id: Option<String>,
    pub patient_id: Option<Option<String>>,
    pub kind: Option<Role>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub notes: Option<Option<String>>,
    pub status: Option<Option<AppointmentStatus>>,
    pub recurrence_id: Option<Option<String>>,
}

impl AppointmentUpdate {
    pub fn apply_to(self, appointment: &mut Appointment) {
        if let Some(v) = self.professional_id {
            appointment.professional_id = v;
        }
        if let Some(v) = self.patient_id {
            appointment.patient_id = v;
        }
        if let Some(v) = self.kind {
            appointment.kind = v;
        }
        if let Some(v) = self.start {
            appointment.start = v;
        }
        if let Some(v) = self.end {
            appointment.end = v;
        }
        if let Some(v) = self.notes {
            appointment.notes = v;
        }
        if let Some(v) = self.status {
            appointment.status = v;
        }
        if let Some(v) = self.recurrence_id {
            appointment.recurrence_id = v;
        }
    }
}

/// Flat wire shape of an appointment inside a backup document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentRecord {
    id: String,
    profissional_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    paciente_id: Option<String>,
    tipo: Role,
    #[serde(with = "dates::timestamp")]
    inicio: DateTime<Utc>,
    #[serde(with = "dates::timestamp")]
    fim: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    observacoes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    cancelado: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    motivo_cancelamento: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "dates::optional_timestamp"
    )]
    data_cancelamento: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorrencia_id: Option<String>,
}

impl TryFrom<AppointmentRecord> for Appointment {
    type Error = DatabaseError;

    fn try_from(record: AppointmentRecord) -> Result<Self, Self::Error> {
        let cancellation = if record.cancelado {
            let reason = record
                .motivo_cancelamento
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| {
                    DatabaseError::Validation(format!(
                        "cancelled appointment {} has no cancellation reason",
                        record.id
                    ))
                })?;
            CancellationState::Cancelled {
                reason,
                at: record.data_cancelamento,
            }
        } else {
            CancellationState::Active
        };

        Ok(Appointment {
            id: record.id,
            professional_id: record.profissional_id,
            patient_id: record.paciente_id,
            kind: record.tipo,
            start: record.inicio,
            end: record.fim,
            notes: record.observacoes,
            status: record.status,
            cancellation,
            recurrence_id: record.recorrencia_id,
        })
    }
}

impl From<Appointment> for AppointmentRecord {
    fn from(appt: Appointment) -> Self {
        let (cancelado, motivo_cancelamento, data_cancelamento) = match appt.cancellation {
            CancellationState::Active => (false, None, None),
            CancellationState::Cancelled { reason, at } => (true, Some(reason), at),
        };
        AppointmentRecord {
            id: appt.id,
            profissional_id: appt.professional_id,
            paciente_id: appt.patient_id,
            tipo: appt.kind,
            inicio: appt.start,
            fim: appt.end,
            observacoes: appt.notes,
            status: appt.status,
            cancelado,
            motivo_cancelamento,
            data_cancelamento,
            recorrencia_id: appt.recurrence_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Appointment {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        Appointment::new(
            "prof-1",
            Some("pac-1".into()),
            Role::TherapeuticCompanion,
            start,
            start + chrono::Duration::hours(1),
        )
    }

    #[test]
    fn cancel_sets_notes_when_empty() {
        let mut appt = sample();
        let at = Utc::now();
        appt.cancel("paciente viajou", at).unwrap();
        assert_eq!(appt.notes.as_deref(), Some("[CANCELADO] paciente viajou"));
        assert_eq!(appt.cancellation_reason(), Some("paciente viajou"));
        assert_eq!(appt.status, Some(AppointmentStatus::Cancelled));
    }

    #[test]
    fn cancel_appends_to_existing_notes() {
        let mut appt = sample();
        appt.notes = Some("trazer material".into());
        appt.cancel("feriado", Utc::now()).unwrap();
        assert_eq!(
            appt.notes.as_deref(),
            Some("trazer material\n[CANCELADO] feriado")
        );
    }

    #[test]
    fn cancel_requires_reason() {
        let mut appt = sample();
        let err = appt.cancel("   ", Utc::now()).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(!appt.is_cancelled());
    }

    #[test]
    fn cancelled_is_terminal() {
        let mut appt = sample();
        appt.cancel("feriado", Utc::now()).unwrap();
        let err = appt.cancel("outro motivo", Utc::now()).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert_eq!(appt.cancellation_reason(), Some("feriado"));
    }

    #[test]
    fn wire_shape_is_flat() {
        let mut appt = sample();
        appt.cancel("feriado", Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
            .unwrap();
        let value = serde_json::to_value(&appt).unwrap();
        assert_eq!(value["profissionalId"], "prof-1");
        assert_eq!(value["inicio"], "2025-03-10T09:00:00.000Z");
        assert_eq!(value["cancelado"], true);
        assert_eq!(value["motivoCancelamento"], "feriado");
        assert_eq!(value["dataCancelamento"], "2025-03-01T12:00:00.000Z");
        assert!(value.get("recorrenciaId").is_none());
    }

    #[test]
    fn active_appointment_omits_cancelled_flag() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("cancelado").is_none());
        assert!(value.get("motivoCancelamento").is_none());
    }

    #[test]
    fn legacy_cancelled_record_without_instant_decodes() {
        let json = r#"{
            "id": "a1", "profissionalId": "prof-1", "pacienteId": "pac-1", "tipo": "AT",
            "inicio": "2025-03-10T12:00:00.000Z", "fim": "2025-03-10T13:00:00.000Z",
            "cancelado": true, "motivoCancelamento": "alta"
        }"#;
        let appt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(
            appt.cancellation,
            CancellationState::Cancelled { reason: "alta".into(), at: None }
        );
    }

    #[test]
    fn cancelled_record_without_reason_is_rejected() {
        let json = r#"{
            "id": "a1", "profissionalId": "prof-1", "tipo": "AT",
            "inicio": "2025-03-10T12:00:00.000Z", "fim": "2025-03-10T13:00:00.000Z",
            "cancelado": true
        }"#;
        assert!(serde_json::from_str::<Appointment>(json).is_err());
    }

    #[test]
    fn recurrence_key_requires_patient() {
        let mut appt = sample();
        assert!(appt.recurrence_key().is_some());
        appt.patient_id = None;
        assert!(appt.recurrence_key().is_none());
    }
}
