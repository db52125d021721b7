//! Child process lifecycle: start, liveness, terminate, restart.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::{ProcessError, ProcessResult};

/// Placeholder in launch arguments replaced by the supervised port.
pub const PORT_PLACEHOLDER: &str = "{port}";

/// Default time a child gets to exit after `SIGTERM` before it is killed.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Lifecycle operations on the supervised process.
///
/// The loop is the only caller; it owns the handle exclusively and
/// never issues two operations concurrently.
pub trait ProcessControl: Send {
    type Handle: Send;

    /// Launch a new instance. Failure is fatal for the supervisor.
    fn start(&mut self) -> ProcessResult<Self::Handle>;

    /// Non-blocking liveness check, queried fresh on every call.
    fn is_alive(&mut self, handle: &mut Self::Handle) -> bool;

    /// Request graceful termination. A no-op on an already-dead handle.
    fn terminate(&mut self, handle: &mut Self::Handle) -> impl Future<Output = ()> + Send;

    /// Terminate (if alive) then start. The old handle is consumed.
    fn restart(
        &mut self,
        mut handle: Self::Handle,
    ) -> impl Future<Output = ProcessResult<Self::Handle>> + Send {
        async move {
            self.terminate(&mut handle).await;
            drop(handle);
            self.start()
        }
    }
}

/// What to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
        }
    }

    /// Build from a full command line: the first word is the program.
    pub fn from_command(command: &[String]) -> ProcessResult<Self> {
        let (program, args) = command.split_first().ok_or(ProcessError::EmptyCommand)?;
        let mut spec = Self::new(program.clone());
        spec.args = args.to_vec();
        Ok(spec)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Bind the spec to the port the service must listen on: `{port}` in
    /// any argument is substituted and `PORT` is exported.
    pub fn with_port(mut self, port: u16) -> Self {
        let port_str = port.to_string();
        for arg in &mut self.args {
            if arg.contains(PORT_PLACEHOLDER) {
                *arg = arg.replace(PORT_PLACEHOLDER, &port_str);
            }
        }
        self.env.push(("PORT".to_string(), port_str));
        self
    }
}

/// Handle to one running (or exited) child.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    pid: Option<u32>,
}

impl ChildProcess {
    /// OS pid captured at launch.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

/// [`ProcessControl`] backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct CommandSupervisor {
    spec: ProcessSpec,
    grace: Duration,
}

impl CommandSupervisor {
    pub fn new(spec: ProcessSpec) -> Self {
        Self {
            spec,
            grace: DEFAULT_GRACE,
        }
    }

    /// Override the `SIGTERM` grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }
}

impl ProcessControl for CommandSupervisor {
    type Handle = ChildProcess;

    fn start(&mut self) -> ProcessResult<ChildProcess> {
        let mut cmd = Command::new(&self.spec.program);
        cmd.args(&self.spec.args)
            .envs(self.spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.spec.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| ProcessError::Launch {
            program: self.spec.program.clone(),
            source,
        })?;
        let pid = child.id();
        info!(?pid, program = %self.spec.program, "supervised process started");
        Ok(ChildProcess { child, pid })
    }

    fn is_alive(&mut self, handle: &mut ChildProcess) -> bool {
        match handle.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(pid = ?handle.pid, %status, "supervised process has exited");
                false
            }
            Err(e) => {
                warn!(pid = ?handle.pid, error = %e, "liveness check failed; treating as dead");
                false
            }
        }
    }

    fn terminate(&mut self, handle: &mut ChildProcess) -> impl Future<Output = ()> + Send {
        let grace = self.grace;
        async move {
            if !self.is_alive(handle) {
                return;
            }

            request_stop(&mut handle.child);

            match tokio::time::timeout(grace, handle.child.wait()).await {
                Ok(Ok(status)) => {
                    info!(pid = ?handle.pid, %status, "supervised process terminated");
                }
                Ok(Err(e)) => {
                    warn!(pid = ?handle.pid, error = %e, "failed to reap supervised process");
                }
                Err(_) => {
                    warn!(pid = ?handle.pid, ?grace, "supervised process ignored SIGTERM; killing");
                    if let Err(e) = handle.child.kill().await {
                        warn!(pid = ?handle.pid, error = %e, "failed to kill supervised process");
                    }
                }
            }
        }
    }
}

#[cfg(unix)]
fn request_stop(child: &mut Child) {
    // `id()` is None once the child has been reaped.
    let Some(pid) = child.id() else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions; the pid belongs
    // to a child we spawned and have not reaped yet.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        warn!(pid, error = %std::io::Error::last_os_error(), "SIGTERM failed; falling back to kill");
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) {
    let _ = child.start_kill();
}
