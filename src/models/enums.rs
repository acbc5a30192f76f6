use crate::db::DatabaseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
///
/// The string form is both the SQLite column value and the backup wire value,
/// so serde goes through `as_str`/`from_str` as well.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(
    /// A professional's function in the clinic (`funcao`).
    Role {
        BehaviorAnalyst => "Analista do Comportamento",
        TherapeuticCompanion => "AT",
        ClinicalSupervisor => "Supervisor Clínico",
        ClinicalPsychologist => "Psicólogo Clínico",
        OccupationalTherapist => "Terapeuta Ocupacional",
        SpeechTherapist => "Fonoaudiólogo",
        PhysicalEducator => "Educador Físico",
        MusicTherapist => "Musicoterapeuta",
        Pedagogue => "Pedagogo",
        Nutritionist => "Nutricionista",
        Physician => "Médico",
        ClinicalCoordinator => "Coordenador Clínico",
        Receptionist => "Recepcionista",
        Intern => "Estagiário",
    }
);

impl Role {
    /// Display color stored on a professional with this role.
    pub fn color(&self) -> &'static str {
        match self {
            Self::BehaviorAnalyst => "#1F77B4",
            Self::TherapeuticCompanion => "#FF7F0E",
            Self::ClinicalSupervisor => "#2CA02C",
            Self::ClinicalPsychologist => "#9467BD",
            Self::OccupationalTherapist => "#8C564B",
            Self::SpeechTherapist => "#17BECF",
            Self::PhysicalEducator => "#D62728",
            Self::MusicTherapist => "#E377C2",
            Self::Pedagogue => "#BCBD22",
            Self::Nutritionist => "#98DF8A",
            Self::Physician => "#7F7F7F",
            Self::ClinicalCoordinator => "#1A1A1A",
            Self::Receptionist => "#AEC7E8",
            Self::Intern => "#C5B0D5",
        }
    }
}

str_enum!(Shift {
    Morning => "manhã",
    Afternoon => "tarde",
    Evening => "noite",
});

str_enum!(PatientStatus {
    Active => "ativo",
    Inactive => "inativo",
});

impl Default for PatientStatus {
    fn default() -> Self {
        Self::Active
    }
}

str_enum!(
    /// Kind of care a professional provides to a specific patient.
    CareRole {
        TherapeuticCompanion => "AT",
        SpeechTherapy => "Fono",
        OccupationalTherapy => "TO",
        Psychotherapist => "Psicoterapeuta",
        BehaviorAnalyst => "Analista do Comportamento",
        PhysicalEducator => "Educador Físico",
    }
);

str_enum!(AppointmentStatus {
    Scheduled => "agendado",
    Completed => "realizado",
    Cancelled => "cancelado",
    Rescheduled => "remarcado",
});
