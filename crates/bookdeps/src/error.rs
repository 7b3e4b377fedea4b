//! Error types for dependency analysis
//!
//! Only input problems are errors. A formula that cannot be resolved is a
//! normal "no reference" outcome and never shows up here.

use std::path::PathBuf;

use bookdeps_xlsx::XlsxError;
use thiserror::Error;

/// Result type for analysis operations
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// A workbook that could not be loaded
#[derive(Debug, Error)]
#[error("Failed to load workbook '{name}'")]
pub struct LoadError {
    /// Display name of the offending workbook
    pub name: String,
    /// What went wrong
    #[source]
    pub kind: LoadErrorKind,
}

/// Why a workbook could not be loaded
#[derive(Debug, Error)]
pub enum LoadErrorKind {
    /// The container is unreadable or corrupt
    #[error(transparent)]
    Xlsx(#[from] XlsxError),

    /// Not an Office Open XML workbook
    #[error("Unsupported format (expected .xlsx or .xlsm)")]
    UnsupportedFormat,
}

/// Errors that abort an analysis run
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A workbook could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// No eligible spreadsheet in the input
    #[error("No spreadsheet files found in the input")]
    EmptyInput,

    /// Two inputs share a display name
    #[error("Duplicate workbook name: {0}")]
    DuplicateName(String),

    /// An input path could not be read
    #[error("Failed to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input archive could not be opened
    #[error("Failed to read archive '{}'", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}
