//! webmon-process: lifecycle of the single supervised child process.
//!
//! [`CommandSupervisor`] launches the configured command and hands out a
//! [`ChildProcess`] handle. The handle is a single-owner value: restarting
//! consumes it and yields a new one, so no stale handle can linger.

pub mod error;
pub mod supervisor;

pub use error::{ProcessError, ProcessResult};
pub use supervisor::{ChildProcess, CommandSupervisor, ProcessControl, ProcessSpec};
