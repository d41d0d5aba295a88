use std::path::PathBuf;

use thiserror::Error;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised while turning a file into a batch of records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unsupported file format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("Parse error at line {line}: {what}")]
    Parse { line: usize, what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
