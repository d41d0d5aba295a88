use thiserror::Error;

use pt_monitor::MonitorError;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced when starting the pipeline. The running pipeline raises
/// none: tick failures are contained by the monitor, and the controller and
/// reconciler are error-free on well-formed input.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),
}
