//! Field normalization: optional patient fields become fixed placeholder text.
//!
//! Normalization is total. Absence is a valid input and never an error.

use super::models::{NormalizedRow, PatientRecord};

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

/// `dd.MM.yyyy`
pub const DATE_FORMAT: &str = "%d.%m.%Y";
/// `dd.MM.yyyy HH:mm`
pub const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Used when a doctor name has nothing left after sanitizing.
pub const FALLBACK_FILE_NAME: &str = "unknown";

const MAX_FILE_NAME_BYTES: usize = 120;

/// Map one patient record to display-ready cells.
pub fn normalize(record: &PatientRecord) -> NormalizedRow {
    NormalizedRow {
        first_name: text_or_unknown(record.first_name.as_deref()),
        last_name: text_or_unknown(record.last_name.as_deref()),
        date_of_birth: record
            .date_of_birth
            .map(|date| date.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        appointment_date: record.appointment_date.format(DATE_TIME_FORMAT).to_string(),
        symptoms: text_or_unknown(record.symptoms.as_deref()),
    }
}

/// Normalize every record, preserving order.
pub fn normalize_all(records: &[PatientRecord]) -> Vec<NormalizedRow> {
    records.iter().map(normalize).collect()
}

fn text_or_unknown(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Path-safe form of a doctor name for use inside a file name.
///
/// Filesystem-reserved and control characters are replaced with `_`, so the
/// result never contains a path separator.
pub fn file_safe_name(name: &str) -> String {
    let options = sanitize_filename::Options {
        truncate: true,
        windows: true,
        replacement: "_",
    };
    let sanitized = sanitize_filename::sanitize_with_options(name.trim(), options);
    let trimmed = sanitized.trim_matches(|c: char| c == '.' || c.is_whitespace());

    if trimmed.is_empty() {
        return FALLBACK_FILE_NAME.to_string();
    }

    truncate_at_char_boundary(trimmed, MAX_FILE_NAME_BYTES).to_string()
}

fn truncate_at_char_boundary(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> PatientRecord {
        PatientRecord {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1),
            appointment_date: NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            symptoms: Some("Chest pain".into()),
        }
    }

    #[test]
    fn test_present_fields_are_formatted() {
        let row = normalize(&record());
        assert_eq!(
            row.cells(),
            ["Jane", "Doe", "01.05.1990", "10.01.2024 09:00", "Chest pain"]
        );
    }

    #[test]
    fn test_absent_fields_become_placeholders() {
        let row = normalize(&PatientRecord {
            first_name: None,
            last_name: None,
            date_of_birth: None,
            symptoms: None,
            ..record()
        });

        assert_eq!(row.first_name, UNKNOWN);
        assert_eq!(row.last_name, UNKNOWN);
        assert_eq!(row.date_of_birth, NOT_AVAILABLE);
        assert_eq!(row.symptoms, UNKNOWN);
        assert_eq!(row.appointment_date, "10.01.2024 09:00");
    }

    #[test]
    fn test_empty_text_is_unknown() {
        let row = normalize(&PatientRecord {
            first_name: Some(String::new()),
            symptoms: Some("   ".into()),
            ..record()
        });
        assert_eq!(row.first_name, UNKNOWN);
        assert_eq!(row.symptoms, UNKNOWN);
    }

    #[test]
    fn test_normalize_all_keeps_order() {
        let second = PatientRecord {
            first_name: Some("Zed".into()),
            ..record()
        };
        let rows = normalize_all(&[record(), second]);
        assert_eq!(rows[0].first_name, "Jane");
        assert_eq!(rows[1].first_name, "Zed");
    }

    #[test]
    fn test_file_safe_name() {
        assert_eq!(file_safe_name("Smith"), "Smith");
        assert_eq!(file_safe_name("Dr. John Smith"), "Dr. John Smith");
        assert!(!file_safe_name("../../etc/passwd").contains('/'));
        assert!(!file_safe_name("a\\b:c*d?e").contains(['\\', ':', '*', '?']));
        assert_eq!(file_safe_name("   "), FALLBACK_FILE_NAME);
        assert!(!matches!(file_safe_name("..").as_str(), "." | ".." | ""));
    }

    #[test]
    fn test_file_safe_name_truncates_on_char_boundary() {
        let long = "Ж".repeat(200);
        let safe = file_safe_name(&long);
        assert!(safe.len() <= MAX_FILE_NAME_BYTES);
        assert!(safe.chars().all(|c| c == 'Ж'));
    }
}
