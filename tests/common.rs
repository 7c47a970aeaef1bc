#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use doctor_report_worker::report::ReportMessage;
use std::fs;
use std::path::Path;

/// Two visits, the second with every optional field missing.
pub const SCENARIO_A: &str = r#"{
    "doctorName": "Smith",
    "specialization": "Cardiology",
    "period": "2024-Q1",
    "totalPatients": 2,
    "patientDetails": [
        {
            "firstName": "Jane",
            "lastName": "Doe",
            "dateOfBirth": "1990-05-01",
            "appointmentDate": "2024-01-10T09:00",
            "symptoms": "Chest pain"
        },
        {
            "firstName": null,
            "lastName": "Lee",
            "dateOfBirth": null,
            "appointmentDate": "2024-02-15T14:30",
            "symptoms": null
        }
    ]
}"#;

/// No visits at all.
pub const SCENARIO_B: &str = r#"{
    "doctorName": "Smith",
    "specialization": "Cardiology",
    "period": "2024-Q1",
    "totalPatients": 0,
    "patientDetails": []
}"#;

pub fn message(json: &str) -> ReportMessage {
    serde_json::from_str(json).expect("fixture must decode")
}

pub fn generation_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// File names in `dir`, sorted; empty if the directory does not exist.
pub fn files_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
