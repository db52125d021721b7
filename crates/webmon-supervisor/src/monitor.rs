//! Supervision loop: drives one child process and one health endpoint.
//!
//! Each cycle is fully sequential: at most one probe in flight, retries
//! strictly one after another, and restarts issued only from this loop.
//! The only suspension points inside a cycle are the probe itself and the
//! fixed delay between retries.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use webmon_core::{Action, OutcomeKey, PolicyTable, WebmonConfig, classify};
use webmon_health::Probe;
use webmon_process::ProcessControl;

use crate::error::SupervisorResult;
use crate::event::{Attempt, SupervisionEvent};
use crate::event_log::EventSink;

/// Default pause between two probes of the same cycle.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Timing knobs of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Hard timeout of each probe.
    pub wait_time: Duration,
    /// Pause before each retry probe.
    pub retry_delay: Duration,
}

impl SupervisorSettings {
    pub fn new(wait_time: Duration) -> Self {
        Self {
            wait_time,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// What a single cycle ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The process was dead; it was restarted and no probe was made.
    RestartedNotRunning,
    /// Final outcome was healthy, or differed from the first probe.
    Succeeded { status: OutcomeKey, attempts: u32 },
    /// The first outcome persisted through every attempt.
    Failed {
        outcome: OutcomeKey,
        attempts: u32,
        max_attempts: u32,
        restarted: bool,
    },
}

/// The supervision loop and everything it exclusively owns.
pub struct Supervisor<P, C, S> {
    policy: PolicyTable,
    settings: SupervisorSettings,
    prober: P,
    control: C,
    sink: S,
}

impl<P, C, S> Supervisor<P, C, S>
where
    P: Probe,
    C: ProcessControl,
    S: EventSink,
{
    pub fn new(config: WebmonConfig, prober: P, control: C, sink: S) -> Self {
        Self {
            settings: SupervisorSettings::new(config.wait_time),
            policy: config.policy,
            prober,
            control,
            sink,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.settings.retry_delay = delay;
        self
    }

    pub fn settings(&self) -> SupervisorSettings {
        self.settings
    }

    /// Start the supervised process and supervise it until `shutdown`
    /// turns `true`.
    ///
    /// Shutdown is checked before every cycle, never mid-probe. On the way
    /// out the process is terminated. Only a failure to launch the process
    /// ends the loop with an error.
    pub async fn run(mut self, shutdown: watch::Receiver<bool>) -> SupervisorResult<()> {
        let mut handle = self.control.start()?;
        self.emit(SupervisionEvent::Launched);
        info!(
            wait_ms = self.settings.wait_time.as_millis() as u64,
            policies = self.policy.len(),
            "supervision loop started"
        );

        loop {
            let stop = *shutdown.borrow();
            if stop {
                debug!("shutdown requested; leaving supervision loop");
                break;
            }
            let (next, outcome) = self.cycle(handle).await?;
            handle = next;
            debug!(?outcome, "cycle complete");
        }

        self.control.terminate(&mut handle).await;
        self.emit(SupervisionEvent::Stopped);
        info!("supervision loop stopped");
        Ok(())
    }

    /// Run one full cycle against `handle`, returning the handle to use
    /// next (a fresh one if the process was restarted).
    pub async fn cycle(
        &mut self,
        mut handle: C::Handle,
    ) -> SupervisorResult<(C::Handle, CycleOutcome)> {
        // CheckingLiveness
        if !self.control.is_alive(&mut handle) {
            let handle = self.control.restart(handle).await?;
            warn!("supervised process was not running; restarted");
            self.emit(SupervisionEvent::RestartedNotRunning);
            return Ok((handle, CycleOutcome::RestartedNotRunning));
        }

        // Probing. The entry is fixed for the whole cycle.
        let original = self.probe_once().await;
        let entry = self.policy.lookup(original);
        let max_attempts = entry.max_attempts();
        let mut attempts = 1;
        let mut current = original;

        // Retrying. Leaves early as soon as the outcome changes, even with
        // attempts left.
        while attempts < max_attempts && current == original {
            self.emit(SupervisionEvent::Attempt(Attempt {
                attempt: attempts,
                max_attempts,
                outcome: current,
            }));
            attempts += 1;
            if attempts >= max_attempts {
                break;
            }
            tokio::time::sleep(self.settings.retry_delay).await;
            current = self.probe_once().await;
        }

        // Deciding
        if current == original && !original.is_healthy() {
            warn!(
                outcome = %original,
                attempts,
                max_attempts,
                action = ?entry.action,
                "all attempts exhausted, still failing"
            );
            self.emit(SupervisionEvent::Failed(Attempt {
                attempt: attempts,
                max_attempts,
                outcome: current,
            }));

            let restarted = entry.action == Action::Restart;
            if restarted {
                handle = self.control.restart(handle).await?;
                info!(outcome = %original, "supervised process restarted");
                self.emit(SupervisionEvent::RestartedOnOutcome { outcome: original });
            }

            Ok((
                handle,
                CycleOutcome::Failed {
                    outcome: original,
                    attempts,
                    max_attempts,
                    restarted,
                },
            ))
        } else {
            debug!(status = %current, attempts, "cycle succeeded");
            self.emit(SupervisionEvent::Success {
                outcome: current,
                attempts,
            });
            Ok((
                handle,
                CycleOutcome::Succeeded {
                    status: current,
                    attempts,
                },
            ))
        }
    }

    async fn probe_once(&self) -> OutcomeKey {
        let outcome = classify(self.prober.probe(self.settings.wait_time).await);
        debug!(%outcome, "probe classified");
        outcome
    }

    fn emit(&mut self, event: SupervisionEvent) {
        if let Err(e) = self.sink.record(&event) {
            error!(
                error = %e,
                event = event.kind(),
                message = %event.message(),
                "event log unwritable; decision not persisted"
            );
        }
    }
}
