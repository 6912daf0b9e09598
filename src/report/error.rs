use std::path::PathBuf;

use thiserror::Error;

/// Errors from building, saving or loading an analysis report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("report file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("{chunks} chunks but {results} results")]
    LengthMismatch { chunks: usize, results: usize },
}

/// Result alias for report operations.
pub type ReportResult<T> = Result<T, ReportError>;
