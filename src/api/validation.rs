use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::time::is_academic_year;

/// Rejects malformed identifiers before any query runs. `label` names the id in the message,
/// e.g. "student" gives "Invalid student ID format".
pub(crate) fn validate_uuid(value: &str, label: &str) -> Result<(), ApiError> {
    match Uuid::parse_str(value) {
        Ok(_) => Ok(()),
        Err(_) => Err(ApiError::BadRequest(format!("Invalid {label} ID format"))),
    }
}

pub(crate) fn validate_academic_year(value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(year) if !is_academic_year(year) => Err(ApiError::BadRequest(
            "Invalid academic year format, expected YYYY-YYYY".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_validation_names_the_entity() {
        assert!(validate_uuid("0b9f6a2e-3c1d-4f5e-8a7b-9c0d1e2f3a4b", "student").is_ok());
        match validate_uuid("12345", "objective") {
            Err(ApiError::BadRequest(message)) => assert_eq!(message, "Invalid objective ID format"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn academic_year_is_optional_but_checked() {
        assert!(validate_academic_year(None).is_ok());
        assert!(validate_academic_year(Some("2025-2026")).is_ok());
        assert!(validate_academic_year(Some("2025")).is_err());
    }
}
