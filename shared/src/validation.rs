use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").expect("email pattern compiles"));

// Brazilian mobile: two-digit area code plus nine digits.
pub const PHONE_DIGITS: usize = 11;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(error("name_required", "O nome é obrigatório."));
    }
    if name.chars().any(|c| c.is_ascii_digit()) {
        return Err(error("name_has_digits", "O nome não pode conter números."));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(error("email_required", "O e-mail é obrigatório."));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(error("invalid_email_format", "Digite um e-mail válido."));
    }
    Ok(())
}

pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_digits(phone).len() != PHONE_DIGITS {
        return Err(error("invalid_phone", "Digite um telefone válido."));
    }
    Ok(())
}

/// Formats partial input as the user types: `41`, `(41) 9997`,
/// `(41) 99971-0062`. Digits past the eleventh are dropped.
pub fn format_phone(input: &str) -> String {
    let digits: String = phone_digits(input).chars().take(PHONE_DIGITS).collect();
    if digits.len() <= 2 {
        return digits;
    }

    let (area, rest) = digits.split_at(2);
    if rest.len() <= 5 {
        format!("({}) {}", area, rest)
    } else {
        let (prefix, line) = rest.split_at(5);
        format!("({}) {}-{}", area, prefix, line)
    }
}

/// Contact form filled in before the wheel unlocks.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ContactSubmission {
    #[serde(alias = "nome")]
    pub name: String,
    pub email: String,
    #[serde(alias = "telefone")]
    pub phone: String,
    #[serde(default, alias = "aceitarComunicacao")]
    pub accept_communication: bool,
    #[serde(default, alias = "aceitarPrivacidade")]
    pub accept_privacy: bool,
}

/// Document stored for a valid submission. Field names are the storage
/// schema's.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContactDocument {
    pub nome: String,
    pub email: String,
    pub telefone: String,
}

impl ContactSubmission {
    pub fn payload(&self) -> ContactDocument {
        ContactDocument {
            nome: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            telefone: format_phone(&self.phone),
        }
    }
}

impl Validate for ContactSubmission {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_name(&self.name) {
            errors.add("name", e);
        }
        if let Err(e) = validate_email(&self.email) {
            errors.add("email", e);
        }
        if let Err(e) = validate_phone(&self.phone) {
            errors.add("phone", e);
        }
        if !self.accept_communication {
            errors.add(
                "accept_communication",
                error("consent_required", "É necessário aceitar comunicações."),
            );
        }
        if !self.accept_privacy {
            errors.add(
                "accept_privacy",
                error(
                    "consent_required",
                    "É necessário aceitar a política de privacidade.",
                ),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ContactSubmission {
        ContactSubmission {
            name: "Maria Souza".to_string(),
            email: "maria@example.com.br".to_string(),
            phone: "(41) 99971-0062".to_string(),
            accept_communication: true,
            accept_privacy: true,
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_every_field_is_reported() {
        let errors = ContactSubmission::default().validate().unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "email", "phone", "accept_communication", "accept_privacy"] {
            assert!(fields.contains_key(field), "{}", field);
        }
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_name("   ").unwrap_err().code, "name_required");
        assert_eq!(validate_name("R2D2").unwrap_err().code, "name_has_digits");
        assert!(validate_name("José").is_ok());
    }

    #[test]
    fn test_email_pattern() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("a@b.c").is_err());
        assert!(validate_email("a b@c.com").is_err());
        assert!(validate_email("no-at.com").is_err());
    }

    #[test]
    fn test_phone_needs_eleven_digits() {
        assert!(validate_phone("41999710062").is_ok());
        assert!(validate_phone("(41) 9997-1006").is_err());
        assert!(validate_phone("419997100621").is_err());
    }

    #[test]
    fn test_format_phone_progressively() {
        assert_eq!(format_phone("4"), "4");
        assert_eq!(format_phone("41"), "41");
        assert_eq!(format_phone("419"), "(41) 9");
        assert_eq!(format_phone("4199971"), "(41) 99971");
        assert_eq!(format_phone("41999710"), "(41) 99971-0");
        assert_eq!(format_phone("41999710062"), "(41) 99971-0062");
        assert_eq!(format_phone("(41) 99971-00629999"), "(41) 99971-0062");
    }

    #[test]
    fn test_payload_uses_storage_field_names() {
        let mut submission = valid();
        submission.phone = "41999710062".to_string();
        let json = serde_json::to_value(submission.payload()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nome": "Maria Souza",
                "email": "maria@example.com.br",
                "telefone": "(41) 99971-0062"
            })
        );
    }

    #[test]
    fn test_portuguese_field_names_are_accepted() {
        let submission: ContactSubmission = serde_json::from_str(
            r#"{ "nome": "Ana", "email": "ana@x.com", "telefone": "41999710062",
                 "aceitarComunicacao": true, "aceitarPrivacidade": true }"#,
        )
        .unwrap();
        assert!(submission.validate().is_ok());
    }
}
