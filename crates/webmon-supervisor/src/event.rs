//! Decision events emitted by the supervision loop.

use serde::Serialize;

use webmon_core::OutcomeKey;

/// One probe attempt within a retry cycle. Never kept past the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub attempt: u32,
    pub max_attempts: u32,
    pub outcome: OutcomeKey,
}

/// A decision worth one line in the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SupervisionEvent {
    /// The supervised process was started when the loop began.
    Launched,
    /// The process was found dead at the start of a cycle and restarted.
    RestartedNotRunning,
    /// A probe in the retry phase still showed the original outcome.
    Attempt(Attempt),
    /// All attempts exhausted and the outcome still matches.
    Failed(Attempt),
    /// The process was restarted because of a failing outcome.
    RestartedOnOutcome { outcome: OutcomeKey },
    /// The cycle ended healthy or with a changed outcome.
    Success { outcome: OutcomeKey, attempts: u32 },
    /// The loop shut down and the process was terminated.
    Stopped,
}

impl SupervisionEvent {
    /// Stable snake_case label, matching the `event` field in the log.
    pub fn kind(&self) -> &'static str {
        match self {
            SupervisionEvent::Launched => "launched",
            SupervisionEvent::RestartedNotRunning => "restarted_not_running",
            SupervisionEvent::Attempt(_) => "attempt",
            SupervisionEvent::Failed(_) => "failed",
            SupervisionEvent::RestartedOnOutcome { .. } => "restarted_on_outcome",
            SupervisionEvent::Success { .. } => "success",
            SupervisionEvent::Stopped => "stopped",
        }
    }

    /// Human-readable description of the decision.
    pub fn message(&self) -> String {
        match self {
            SupervisionEvent::Launched => "supervised process launched".to_string(),
            SupervisionEvent::RestartedNotRunning => {
                "restarted (process was not running)".to_string()
            }
            SupervisionEvent::Attempt(a) => format!(
                "Attempt {}/{}, Status: {}",
                a.attempt,
                a.max_attempts,
                a.outcome.status_label()
            ),
            SupervisionEvent::Failed(a) => format!(
                "Attempt {}/{}, Status: {} - Failed (all attempts exhausted, still failing)",
                a.attempt,
                a.max_attempts,
                a.outcome.status_label()
            ),
            SupervisionEvent::RestartedOnOutcome { outcome } => {
                format!("restarted due to {outcome}")
            }
            SupervisionEvent::Success { outcome, attempts } => format!(
                "Successful response: Status {} after {attempts} attempts",
                outcome.status_label()
            ),
            SupervisionEvent::Stopped => "supervisor stopped".to_string(),
        }
    }
}
