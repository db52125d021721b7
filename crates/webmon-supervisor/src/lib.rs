//! webmon-supervisor: the supervision loop.
//!
//! Ties the other crates together: liveness check, probe, classification,
//! policy lookup, sequential retries, escalation, and one event-log line
//! per decision.
//!
//! # Cycle
//!
//! ```text
//! CheckingLiveness ──dead──▶ restart, log, next cycle
//!        │ alive
//!        ▼
//!     Probing ──▶ Retrying (while attempts < max && outcome unchanged)
//!                     │
//!                     ▼
//!                  Deciding ──▶ failure (+ restart) | success
//! ```
//!
//! Cancellation is observed only between cycles; on exit the supervised
//! process is terminated.

pub mod error;
pub mod event;
pub mod event_log;
pub mod monitor;

pub use error::{SupervisorError, SupervisorResult};
pub use event::{Attempt, SupervisionEvent};
pub use event_log::{EventSink, FileEventLog, MemorySink};
pub use monitor::{CycleOutcome, Supervisor, SupervisorSettings};
