use serde::{Deserialize, Serialize};

use super::enums::{Role, Shift};

/// One weekly slot a professional is available (`dia` 0 = Sunday … 6 = Saturday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(rename = "dia")]
    pub day: u8,
    #[serde(rename = "turno")]
    pub shift: Shift,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professional {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "funcao")]
    pub role: Role,
    #[serde(rename = "disponibilidade", default)]
    pub availability: Vec<Availability>,
    #[serde(rename = "cor", default)]
    pub color: String,
}

impl Professional {
    pub fn new(name: impl Into<String>, role: Role, availability: Vec<Availability>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            role,
            availability,
            color: role.color().into(),
        }
    }
}

/// Partial edit of a professional. A role change re-derives the color.
#[derive(Debug, Clone, Default)]
pub struct ProfessionalUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub availability: Option<Vec<Availability>>,
}

impl ProfessionalUpdate {
    pub fn apply_to(self, professional: &mut Professional) {
        if let Some(name) = self.name {
            professional.name = name;
        }
        if let Some(role) = self.role {
            professional.role = role;
            professional.color = role.color().into();
        }
        if let Some(availability) = self.availability {
            professional.availability = availability;
        }
    }
}
