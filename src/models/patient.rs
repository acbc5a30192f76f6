use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dates;
use super::enums::{CareRole, PatientStatus};

/// Person answering for the patient (`responsavel`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibleParty {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "telefone", default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// A professional assigned to the patient's care team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareAssignment {
    #[serde(rename = "id")]
    pub professional_id: String,
    #[serde(rename = "tipo")]
    pub role: CareRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(
        rename = "dataNascimento",
        default = "dates::now",
        with = "dates::day_or_now"
    )]
    pub birth_date: DateTime<Utc>,
    #[serde(rename = "diagnostico", default)]
    pub diagnosis: String,
    #[serde(rename = "responsavel", default)]
    pub responsible: ResponsibleParty,
    #[serde(rename = "observacoesClinicas", default)]
    pub clinical_notes: String,
    #[serde(rename = "profissionais", default)]
    pub care_team: Vec<CareAssignment>,
    #[serde(default)]
    pub status: PatientStatus,
    /// Tag ids.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "foto", default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(rename = "anotacoesEquipe", default)]
    pub team_notes: Vec<String>,
    #[serde(
        rename = "createdAt",
        default = "dates::now",
        with = "dates::timestamp_or_now"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "updatedAt",
        default = "dates::now",
        with = "dates::timestamp_or_now"
    )]
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// New active patient born on `birth_day` (stored as midnight UTC).
    pub fn new(name: impl Into<String>, birth_day: NaiveDate) -> Self {
        let now = dates::now();
        Self {
            id: super::new_id(),
            name: name.into(),
            birth_date: dates::midnight_utc(birth_day),
            diagnosis: String::new(),
            responsible: ResponsibleParty::default(),
            clinical_notes: String::new(),
            care_team: Vec::new(),
            status: PatientStatus::Active,
            tags: Vec::new(),
            photo: None,
            team_notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PatientStatus::Active
    }

    pub fn birth_day(&self) -> NaiveDate {
        self.birth_date.date_naive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub diagnosis: Option<String>,
    pub responsible: Option<ResponsibleParty>,
    pub clinical_notes: Option<String>,
    pub care_team: Option<Vec<CareAssignment>>,
    pub status: Option<PatientStatus>,
    pub tags: Option<Vec<String>>,
    pub photo: Option<Option<String>>,
    pub team_notes: Option<Vec<String>>,
}

impl PatientUpdate {
    /// Merge into `patient` and bump `updated_at`.
    pub fn apply_to(self, patient: &mut Patient, at: DateTime<Utc>) {
        if let Some(v) = self.name {
            patient.name = v;
        }
        if let Some(v) = self.birth_date {
            patient.birth_date = v;
        }
        if let Some(v) = self.diagnosis {
            patient.diagnosis = v;
        }
        if let Some(v) = self.responsible {
            patient.responsible = v;
        }
        if let Some(v) = self.clinical_notes {
            patient.clinical_notes = v;
        }
        if let Some(v) = self.care_team {
            patient.care_team = v;
        }
        if let Some(v) = self.status {
            patient.status = v;
        }
        if let Some(v) = self.tags {
            patient.tags = v;
        }
        if let Some(v) = self.photo {
            patient.photo = v;
        }
        if let Some(v) = self.team_notes {
            patient.team_notes = v;
        }
        patient.updated_at = at;
    }
}
