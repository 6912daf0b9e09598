use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid transcript JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid transcript CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("transcript not found at {path}")]
    NotFound { path: PathBuf },

    #[error("transcript at {path} contains no non-empty messages")]
    Empty { path: PathBuf },
}

pub type TranscriptResult<T> = Result<T, TranscriptError>;

/// Errors returned by window configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window size must be greater than zero")]
    ZeroSize,

    #[error("overlap {overlap} must be smaller than window size {size}")]
    OverlapTooLarge { size: usize, overlap: usize },
}
