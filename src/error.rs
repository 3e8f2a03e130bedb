use std::path::PathBuf;

use thiserror::Error;

/// Failures of the data layer that callers need to tell apart.
///
/// Loader and export functions return `anyhow::Result`; these variants sit
/// underneath as the root cause so that `load_or_sample` can recognise a
/// missing file with `downcast_ref`.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("missing value in column '{column}' at record {row}")]
    NullValue { column: &'static str, row: usize },

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType {
        column: &'static str,
        data_type: String,
    },
}
