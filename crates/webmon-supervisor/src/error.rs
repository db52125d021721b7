//! Supervisor error types.

use thiserror::Error;

/// Errors that end the supervision loop.
///
/// Probe failures never show up here; they are policy-driven and absorbed
/// by the loop.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("process error: {0}")]
    Process(#[from] webmon_process::ProcessError),
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;
