//! Boundary validation for inbound report messages.
//!
//! Absent optional patient fields are not validation failures; they are
//! handled by normalization. Only messages the pipeline cannot meaningfully
//! process are rejected here.

use std::fmt;

use super::models::ReportMessage;
use super::traits::Validator;

/// Validation error with a field path and a readable message.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create error for empty required field
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{label} must not be empty"))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors with formatted output.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// One line per error, prefixed with a count.
    pub fn to_message(&self) -> String {
        let details: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        format!("{} validation error(s): {}", self.errors.len(), details.join("; "))
    }

    /// Convert to Result - Ok if no errors, Err with formatted message if errors exist
    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.to_message())
        }
    }
}

/// Validate that a string is not empty after trimming
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

impl Validator for ReportMessage {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.doctor_name, "doctorName", "Doctor name", &mut errors);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(doctor_name: &str) -> ReportMessage {
        ReportMessage {
            doctor_name: doctor_name.into(),
            specialization: String::new(),
            period: String::new(),
            total_patients: 0,
            patient_details: Vec::new(),
        }
    }

    #[test]
    fn test_valid_message() {
        assert!(message("Smith").validate().is_ok());
    }

    #[test]
    fn test_blank_doctor_name_is_rejected() {
        let error = message("   ").validate().unwrap_err();
        assert!(error.contains("doctorName"));
        assert!(error.starts_with("1 validation error(s)"));
    }

    #[test]
    fn test_validation_errors_collects() {
        let mut errors = ValidationErrors::new();
        validate_required("", "a", "A", &mut errors);
        validate_required("x", "b", "B", &mut errors);
        validate_required(" ", "c", "C", &mut errors);
        assert_eq!(errors.len(), 2);
        assert!(errors.into_result().unwrap_err().contains("[c] C must not be empty"));
    }
}
