//! Report module - turns a doctor report message into a persisted PDF.
//!
//! - `models` - inbound message and normalized rows
//! - `normalize` - placeholder substitution and file-safe names
//! - `render` - document model (title, summary, patient table)
//! - `layout` - pagination into positioned drawing operations
//! - `engine` - PDF encoding
//! - `writer` - atomic, collision-free persistence

pub mod dates;
pub mod engine;
pub mod fonts;
pub mod layout;
pub mod models;
pub mod normalize;
pub mod render;
pub mod traits;
pub mod validation;
pub mod writer;

pub use engine::PdfRenderEngine;
pub use layout::{layout, LaidOutDocument, LayoutError};
pub use models::{NormalizedRow, PatientRecord, ReportMessage};
pub use normalize::{file_safe_name, normalize, normalize_all};
pub use render::{render, render_rows, RenderedDocument};
pub use traits::{ReportSink, Validator};
pub use writer::{report_file_name, DocumentWriter};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while producing a report file.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to lay out report: {0}")]
    Layout(#[from] LayoutError),
    #[error("failed to encode PDF: {0}")]
    Encode(String),
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no free file name for {base} after {attempts} attempts")]
    NameExhausted { base: String, attempts: usize },
}

/// Coarse failure class of a [`ReportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The document could not be produced.
    Render,
    /// The document could not be stored.
    Io,
}

impl ReportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Layout(_) | Self::Encode(_) => FailureKind::Render,
            Self::CreateDir { .. } | Self::Write { .. } | Self::NameExhausted { .. } => {
                FailureKind::Io
            }
        }
    }

    pub fn is_io(&self) -> bool {
        self.kind() == FailureKind::Io
    }
}
