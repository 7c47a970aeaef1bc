//! Traits at the seams of the report pipeline.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use super::render::RenderedDocument;
use super::ReportError;

/// Trait for validating inbound objects before they reach the pipeline.
pub trait Validator {
    /// Validate the state of the object.
    fn validate(&self) -> Result<(), String>;
}

/// Destination for rendered reports.
pub trait ReportSink {
    /// Store `document` and return where it landed.
    fn persist(
        &self,
        document: &RenderedDocument,
        doctor_name: &str,
        now: NaiveDateTime,
    ) -> Result<PathBuf, ReportError>;
}
