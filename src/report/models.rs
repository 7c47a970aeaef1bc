//! Inbound report message and the display rows derived from it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use super::dates;

/// A doctor activity report as delivered by the bus.
///
/// Field names follow the publisher's camelCase contract; the PascalCase
/// spelling used by .NET publishers is accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMessage {
    #[serde(alias = "DoctorName")]
    pub doctor_name: String,
    #[serde(alias = "Specialization", default, deserialize_with = "null_as_default")]
    pub specialization: String,
    #[serde(alias = "Period", default, deserialize_with = "null_as_default")]
    pub period: String,
    /// Trusted as given; never recomputed from `patient_details`.
    #[serde(alias = "TotalPatients")]
    pub total_patients: u32,
    /// Display order.
    #[serde(alias = "PatientDetails", default, deserialize_with = "null_as_default")]
    pub patient_details: Vec<PatientRecord>,
}

impl ReportMessage {
    /// Returns `(given_total, listed)` when the stated total disagrees with the list.
    pub fn total_mismatch(&self) -> Option<(u32, usize)> {
        let listed = self.patient_details.len();
        if u64::from(self.total_patients) == listed as u64 {
            None
        } else {
            Some((self.total_patients, listed))
        }
    }
}

/// One patient visit inside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(alias = "FirstName", default)]
    pub first_name: Option<String>,
    #[serde(alias = "LastName", default)]
    pub last_name: Option<String>,
    #[serde(alias = "DateOfBirth", default, with = "dates::optional_date")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(alias = "AppointmentDate", with = "dates::date_time")]
    pub appointment_date: NaiveDateTime,
    #[serde(alias = "Symptoms", default)]
    pub symptoms: Option<String>,
}

/// Display-ready cell values for one patient row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub appointment_date: String,
    pub symptoms: String,
}

impl NormalizedRow {
    /// Cells in table column order.
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.first_name,
            &self.last_name,
            &self.date_of_birth,
            &self.appointment_date,
            &self.symptoms,
        ]
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
