use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::dates;
use crate::models::*;

use super::{BackupError, BACKUP_VERSION};

/// Top-level array keys of a backup document.
pub const COLLECTION_KEYS: [&str; 4] = ["profissionais", "atendimentos", "pacientes", "tags"];

/// Full snapshot of the store as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub profissionais: Vec<Professional>,
    pub atendimentos: Vec<Appointment>,
    pub pacientes: Vec<Patient>,
    pub tags: Vec<Tag>,
    pub version: u32,
    #[serde(with = "dates::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Lenient incoming shape: every collection may be absent or `null`.
#[derive(Deserialize)]
struct IncomingDocument {
    #[serde(default)]
    profissionais: Option<Vec<Professional>>,
    #[serde(default)]
    atendimentos: Option<Vec<Appointment>>,
    #[serde(default)]
    pacientes: Option<Vec<Patient>>,
    #[serde(default)]
    tags: Option<Vec<Tag>>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check the raw document's shape and return its version.
///
/// Nothing is decoded into records here; this runs before any write.
pub fn check_structure(value: &Value) -> Result<u32, BackupError> {
    let obj = value.as_object().ok_or_else(|| {
        BackupError::Malformed(format!("expected a JSON object, found {}", json_kind(value)))
    })?;

    let raw_version = obj.get("version");
    let version = raw_version
        .and_then(Value::as_u64)
        .filter(|v| (1..=u64::from(BACKUP_VERSION)).contains(v))
        .ok_or_else(|| BackupError::IncompatibleVersion {
            found: raw_version.map_or_else(|| "missing".to_string(), Value::to_string),
            supported: BACKUP_VERSION,
        })?;

    for key in COLLECTION_KEYS {
        match obj.get(key) {
            None | Some(Value::Null) | Some(Value::Array(_)) => {}
            Some(other) => {
                return Err(BackupError::Malformed(format!(
                    "`{key}` must be an array, found {}",
                    json_kind(other)
                )))
            }
        }
    }

    // Checked against BACKUP_VERSION above, so it fits.
    Ok(version as u32)
}

/// Structural check followed by typed decoding. Date strings become
/// concrete instants; missing collections become empty.
pub fn decode_document(value: Value) -> Result<BackupDocument, BackupError> {
    let version = check_structure(&value)?;
    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| dates::parse_timestamp("timestamp", raw).ok())
        .unwrap_or_else(dates::now);

    let incoming: IncomingDocument =
        serde_json::from_value(value).map_err(|e| BackupError::Malformed(e.to_string()))?;

    Ok(BackupDocument {
        profissionais: incoming.profissionais.unwrap_or_default(),
        atendimentos: incoming.atendimentos.unwrap_or_default(),
        pacientes: incoming.pacientes.unwrap_or_default(),
        tags: incoming.tags.unwrap_or_default(),
        version,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expect_incompatible(value: Value) -> String {
        match check_structure(&value) {
            Err(BackupError::IncompatibleVersion { found, supported }) => {
                assert_eq!(supported, 2);
                found
            }
            other => panic!("expected IncompatibleVersion, got {other:?}"),
        }
    }

    #[test]
    fn accepts_current_and_older_versions() {
        assert_eq!(check_structure(&json!({"version": 2})).unwrap(), 2);
        assert_eq!(check_structure(&json!({"version": 1, "tags": null})).unwrap(), 1);
    }

    #[test]
    fn rejects_bad_versions() {
        assert_eq!(expect_incompatible(json!({"version": 99})), "99");
        assert_eq!(expect_incompatible(json!({})), "missing");
        assert_eq!(expect_incompatible(json!({"version": 0})), "0");
        assert_eq!(expect_incompatible(json!({"version": "2"})), "\"2\"");
        assert_eq!(expect_incompatible(json!({"version": -1})), "-1");
        assert_eq!(expect_incompatible(json!({"version": 1.5})), "1.5");
    }

    #[test]
    fn rejects_non_array_collections() {
        let err = check_structure(&json!({"version": 2, "pacientes": {}})).unwrap_err();
        assert!(matches!(err, BackupError::Malformed(msg) if msg.contains("pacientes")));
    }

    #[test]
    fn rejects_non_object_document() {
        assert!(matches!(
            check_structure(&json!([1, 2])),
            Err(BackupError::Malformed(_))
        ));
    }

    #[test]
    fn missing_collections_decode_as_empty() {
        let doc = decode_document(json!({"version": 2, "profissionais": null})).unwrap();
        assert!(doc.profissionais.is_empty());
        assert!(doc.atendimentos.is_empty());
        assert!(doc.pacientes.is_empty());
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn legacy_date_strings_are_normalized() {
        let doc = decode_document(json!({
            "version": 1,
            "timestamp": "2024-11-02T18:30:00.000Z",
            "pacientes": [{
                "id": "pac-1",
                "nome": "Bruno",
                "dataNascimento": "2017-08-14T03:00:00.000Z",
                "responsavel": {"nome": "Marta", "telefone": "", "email": ""}
            }, {
                "id": "pac-2",
                "nome": "Lia"
            }],
            "atendimentos": [{
                "id": "a1", "profissionalId": "prof-1", "pacienteId": "pac-1", "tipo": "Fonoaudiólogo",
                "inicio": "2024-11-04T12:00:00.000Z", "fim": "2024-11-04T13:00:00.000Z"
            }]
        }))
        .unwrap();

        assert_eq!(doc.version, 1);
        assert_eq!(dates::format_timestamp(&doc.timestamp), "2024-11-02T18:30:00.000Z");
        assert_eq!(
            dates::format_timestamp(&doc.pacientes[0].birth_date),
            "2017-08-14T03:00:00.000Z"
        );
        assert_eq!(doc.pacientes[1].birth_day(), dates::today());
        assert_eq!(
            dates::format_timestamp(&doc.atendimentos[0].start),
            "2024-11-04T12:00:00.000Z"
        );
    }

    #[test]
    fn unknown_role_is_malformed() {
        let err = decode_document(json!({
            "version": 2,
            "profissionais": [{"id": "p1", "nome": "Ana", "funcao": "Astronauta"}]
        }))
        .unwrap_err();
        assert!(matches!(err, BackupError::Malformed(_)));
    }
}
