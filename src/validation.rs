//! Form-level checks for records entering the store.
//!
//! Failures are reported as `DatabaseError::Validation`, one message per
//! offending field (`campo: motivo`) joined with `; `.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;

use crate::db::DatabaseError;
use crate::models::*;

const MAX_TEXT_LEN: usize = 1000;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{2}\) \d{5}-\d{4}$").expect("phone regex"));
static PHONE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2})(\d{5})(\d{4})").expect("phone digits regex"));
static SCRIPT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("script url regex"));
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+=").expect("event handler regex"));

// ─── Sanitizers ───────────────────────────────────────────────────────────────

/// Trim, strip markup-ish fragments and cap the length.
pub fn sanitize_text(value: &str) -> String {
    let without_tags: String = value.trim().chars().filter(|c| *c != '<' && *c != '>').collect();
    let without_urls = SCRIPT_URL.replace_all(&without_tags, "");
    let cleaned = EVENT_HANDLER.replace_all(&without_urls, "");
    cleaned.chars().take(MAX_TEXT_LEN).collect()
}

pub fn sanitize_email(value: &str) -> String {
    sanitize_text(value).to_lowercase()
}

/// Keep digits only and format an 11-digit number as `(11) 98765-4321`.
pub fn sanitize_phone(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    PHONE_DIGITS
        .replace(&digits, "($1) $2-$3")
        .chars()
        .take(15)
        .collect()
}

pub fn sanitize_patient(mut patient: Patient) -> Patient {
    patient.name = sanitize_text(&patient.name);
    patient.diagnosis = sanitize_text(&patient.diagnosis);
    patient.clinical_notes = sanitize_text(&patient.clinical_notes);
    patient.responsible.name = sanitize_text(&patient.responsible.name);
    patient.responsible.phone = sanitize_phone(&patient.responsible.phone);
    patient.responsible.email = sanitize_email(&patient.responsible.email);
    patient
}

// ─── Field checks ─────────────────────────────────────────────────────────────

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Dates between 1900-01-01 and the end of next year.
pub fn is_plausible_date(date: NaiveDate, today: NaiveDate) -> bool {
    let min = NaiveDate::from_ymd_opt(1900, 1, 1);
    let max = NaiveDate::from_ymd_opt(today.year() + 1, 12, 31);
    match (min, max) {
        (Some(min), Some(max)) => date >= min && date <= max,
        _ => false,
    }
}

fn check_length(
    errors: &mut Vec<String>,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    message: &str,
) {
    let len = value.trim().chars().count();
    if len < min || len > max {
        errors.push(format!("{field}: {message}"));
    }
}

fn finish(errors: Vec<String>) -> Result<(), DatabaseError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DatabaseError::Validation(errors.join("; ")))
    }
}

// ─── Record checks ────────────────────────────────────────────────────────────

pub fn validate_professional(prof: &Professional) -> Result<(), DatabaseError> {
    let mut errors = Vec::new();
    check_length(&mut errors, "nome", &prof.name, 2, 100, "Nome deve ter entre 2 e 100 caracteres");
    if prof.availability.iter().any(|a| a.day > 6) {
        errors.push("disponibilidade: dia deve estar entre 0 e 6".into());
    }
    finish(errors)
}

pub fn validate_patient(patient: &Patient, today: NaiveDate) -> Result<(), DatabaseError> {
    let mut errors = Vec::new();
    check_length(
        &mut errors,
        "nome",
        &patient.name,
        2,
        100,
        "Nome deve ter entre 2 e 100 caracteres",
    );
    if !is_plausible_date(patient.birth_day(), today) {
        errors.push("dataNascimento: Data de nascimento inválida".into());
    }
    check_length(
        &mut errors,
        "diagnostico",
        &patient.diagnosis,
        10,
        500,
        "Diagnóstico deve ter entre 10 e 500 caracteres",
    );
    check_length(
        &mut errors,
        "responsavel.nome",
        &patient.responsible.name,
        2,
        100,
        "Nome do responsável é obrigatório",
    );
    if !is_valid_phone(&patient.responsible.phone) {
        errors.push("responsavel.telefone: Telefone inválido".into());
    }
    if !is_valid_email(&patient.responsible.email) {
        errors.push("responsavel.email: Email inválido".into());
    }
    finish(errors)
}

pub fn validate_appointment(appt: &Appointment, today: NaiveDate) -> Result<(), DatabaseError> {
    let mut errors = Vec::new();
    if appt.professional_id.trim().is_empty() {
        errors.push("profissionalId: Profissional é obrigatório".into());
    }
    if appt.patient_id.as_deref().is_some_and(|p| p.trim().is_empty()) {
        errors.push("pacienteId: Paciente inválido".into());
    }
    let plausible = |ts: &DateTime<Utc>| is_plausible_date(ts.date_naive(), today);
    if !plausible(&appt.start) {
        errors.push("inicio: Data de início inválida".into());
    }
    if !plausible(&appt.end) {
        errors.push("fim: Data de fim inválida".into());
    }
    if appt.end <= appt.start {
        errors.push("fim: Fim deve ser posterior ao início".into());
    }
    finish(errors)
}

pub fn validate_tag(tag: &Tag) -> Result<(), DatabaseError> {
    let mut errors = Vec::new();
    check_length(&mut errors, "nome", &tag.name, 1, 100, "Nome é obrigatório");
    if tag.color.trim().is_empty() {
        errors.push("cor: Cor é obrigatória".into());
    }
    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn valid_patient() -> Patient {
        let mut patient = Patient::new("Bruno Lima", NaiveDate::from_ymd_opt(2017, 8, 14).unwrap());
        patient.diagnosis = "TEA nível 1 de suporte".into();
        patient.responsible = ResponsibleParty {
            name: "Marta Lima".into(),
            phone: "(11) 98765-4321".into(),
            email: "marta@example.com".into(),
        };
        patient
    }

    #[test]
    fn sanitize_text_strips_markup() {
        assert_eq!(sanitize_text("  <b>Ana</b> "), "bAna/b");
        assert_eq!(sanitize_text("JavaScript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_text("x onclick=y"), "x y");
        assert_eq!(sanitize_text(&"a".repeat(1500)).len(), 1000);
    }

    #[test]
    fn sanitize_phone_formats_mobile_numbers() {
        assert_eq!(sanitize_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(sanitize_phone("(11) 98765-4321"), "(11) 98765-4321");
        assert_eq!(sanitize_phone("12-34"), "1234");
    }

    #[test]
    fn sanitize_email_lowercases() {
        assert_eq!(sanitize_email(" Marta@Example.COM "), "marta@example.com");
    }

    #[test]
    fn valid_patient_passes() {
        assert!(validate_patient(&valid_patient(), today()).is_ok());
    }

    #[test]
    fn patient_errors_are_collected_per_field() {
        let mut patient = valid_patient();
        patient.diagnosis = "curto".into();
        patient.responsible.phone = "123".into();
        patient.responsible.email = "sem-arroba".into();
        let err = validate_patient(&patient, today()).unwrap_err();
        let DatabaseError::Validation(message) = err else {
            panic!("expected validation error");
        };
        assert!(message.contains("diagnostico"));
        assert!(message.contains("responsavel.telefone"));
        assert!(message.contains("responsavel.email"));
        assert!(!message.contains("nome:"));
    }

    #[test]
    fn birth_date_bounds() {
        assert!(!is_plausible_date(NaiveDate::from_ymd_opt(1899, 12, 31).unwrap(), today()));
        assert!(is_plausible_date(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(), today()));
        assert!(!is_plausible_date(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(), today()));
    }

    #[test]
    fn professional_name_and_days() {
        let mut prof = Professional::new("A", Role::Pedagogue, vec![]);
        assert!(validate_professional(&prof).is_err());
        prof.name = "Ana".into();
        prof.availability.push(Availability { day: 7, shift: Shift::Evening });
        assert!(validate_professional(&prof).is_err());
        prof.availability[0].day = 6;
        assert!(validate_professional(&prof).is_ok());
    }

    #[test]
    fn appointment_must_end_after_start() {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let mut appt =
            Appointment::new("prof-1", None, Role::Physician, start, start + Duration::hours(1));
        assert!(validate_appointment(&appt, today()).is_ok());
        appt.end = start;
        assert!(validate_appointment(&appt, today()).is_err());
        appt.end = start + Duration::hours(1);
        appt.professional_id = " ".into();
        assert!(validate_appointment(&appt, today()).is_err());
    }

    #[test]
    fn tag_requires_name_and_color() {
        assert!(validate_tag(&Tag::new("TEA", "#aabbcc")).is_ok());
        assert!(validate_tag(&Tag::new("", "#aabbcc")).is_err());
        assert!(validate_tag(&Tag::new("TEA", "")).is_err());
    }
}
