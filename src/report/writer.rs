//! Document writer: lays out, encodes and atomically persists a report.
//!
//! The PDF is written in full to a hidden temporary file inside the output
//! directory and then claimed under its final name with a no-clobber rename.
//! Readers never observe a partial file, and an existing report is never
//! overwritten: a taken name gets a numeric suffix instead.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::{Builder, NamedTempFile};

use super::engine::PdfRenderEngine;
use super::layout::layout;
use super::normalize::file_safe_name;
use super::render::RenderedDocument;
use super::traits::ReportSink;
use super::ReportError;

pub const FILE_PREFIX: &str = "DoctorReport";
/// `yyyyMMddHHmmss`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
pub const MAX_NAME_ATTEMPTS: usize = 100;

/// Base file name (without collision suffix) for a report.
pub fn report_file_name(doctor_name: &str, now: NaiveDateTime) -> String {
    format!(
        "{FILE_PREFIX}_{}_{}.pdf",
        file_safe_name(doctor_name),
        now.format(TIMESTAMP_FORMAT)
    )
}

fn candidate_name(doctor_name: &str, now: NaiveDateTime, attempt: usize) -> String {
    if attempt == 0 {
        return report_file_name(doctor_name, now);
    }
    format!(
        "{FILE_PREFIX}_{}_{}_{attempt}.pdf",
        file_safe_name(doctor_name),
        now.format(TIMESTAMP_FORMAT)
    )
}

/// Writes rendered reports into a single output directory.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    output_dir: PathBuf,
}

impl DocumentWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist `document` and return the path of the new file.
    pub fn write(
        &self,
        document: &RenderedDocument,
        doctor_name: &str,
        now: NaiveDateTime,
    ) -> Result<PathBuf, ReportError> {
        let laid_out = layout(document)?;
        let pdf = PdfRenderEngine::encode(&laid_out, now)?;

        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let staged = self.stage(&pdf)?;
        self.claim(staged, doctor_name, now)
    }

    fn stage(&self, pdf: &[u8]) -> Result<NamedTempFile, ReportError> {
        let write_error = |source: io::Error| ReportError::Write {
            path: self.output_dir.clone(),
            source,
        };

        let mut staged = Builder::new()
            .prefix(".DoctorReport_")
            .suffix(".pdf.part")
            .tempfile_in(&self.output_dir)
            .map_err(write_error)?;

        staged.write_all(pdf).map_err(write_error)?;
        staged.flush().map_err(write_error)?;
        staged.as_file().sync_all().map_err(write_error)?;

        Ok(staged)
    }

    fn claim(
        &self,
        mut staged: NamedTempFile,
        doctor_name: &str,
        now: NaiveDateTime,
    ) -> Result<PathBuf, ReportError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let target = self.output_dir.join(candidate_name(doctor_name, now, attempt));
            match staged.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("Report name {} taken, trying next", target.display());
                    staged = err.file;
                }
                Err(err) => {
                    return Err(ReportError::Write {
                        path: target,
                        source: err.error,
                    })
                }
            }
        }

        Err(ReportError::NameExhausted {
            base: report_file_name(doctor_name, now),
            attempts: MAX_NAME_ATTEMPTS,
        })
    }
}

impl ReportSink for DocumentWriter {
    fn persist(
        &self,
        document: &RenderedDocument,
        doctor_name: &str,
        now: NaiveDateTime,
    ) -> Result<PathBuf, ReportError> {
        self.write(document, doctor_name, now)
    }
}
