use thiserror::Error;

use pt_source::SourceError;

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors surfaced by [`crate::ChangeMonitor::start`]. Once the monitor is
/// running, read failures are logged and retried instead of raised.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
