//! Process supervisor error types.

use thiserror::Error;

/// Errors that can occur while managing the supervised process.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("empty launch command")]
    EmptyCommand,
}

pub type ProcessResult<T> = Result<T, ProcessError>;
