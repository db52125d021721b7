//! webmond: the webmon daemon.
//!
//! Launches the supervised service, then probes its health endpoint in a
//! loop, retrying and restarting according to the policy in `webmon.json`.
//! Every decision is appended to `webmon.log`; operational diagnostics go
//! to stderr through `tracing`.
//!
//! # Usage
//!
//! ```text
//! webmond 8080 --config webmon.json -- python server.py {port}
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use webmon_core::WebmonConfig;
use webmon_health::HttpProber;
use webmon_process::{CommandSupervisor, ProcessSpec};
use webmon_supervisor::{FileEventLog, Supervisor};

mod shutdown;

use shutdown::Signals;

/// Launch command used when none is given after `--`.
const DEFAULT_COMMAND: &[&str] = &["python", "server.py", "{port}"];

#[derive(Parser)]
#[command(
    name = "webmond",
    about = "webmon: supervise a flaky web service through its health endpoint",
    version
)]
struct Cli {
    /// Port the supervised service listens on.
    port: u16,

    /// Policy configuration (JSON, or TOML if the name ends in .toml).
    #[arg(long, default_value = "webmon.json")]
    config: PathBuf,

    /// Append-only decision log.
    #[arg(long, default_value = "webmon.log")]
    log_file: PathBuf,

    /// Health endpoint path.
    #[arg(long, default_value = webmon_health::checker::DEFAULT_PATH)]
    path: String,

    /// Milliseconds the service gets to exit after SIGTERM before it is killed.
    #[arg(long, default_value = "5000")]
    grace_ms: u64,

    /// Command that launches the service. `{port}` is replaced by PORT.
    #[arg(last = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,webmond=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = WebmonConfig::from_file(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let command: Vec<String> = if cli.command.is_empty() {
        DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect()
    } else {
        cli.command
    };
    let spec = ProcessSpec::from_command(&command)?.with_port(cli.port);
    let control = CommandSupervisor::new(spec).with_grace(Duration::from_millis(cli.grace_ms));
    let prober = HttpProber::local(cli.port, cli.path);

    info!(
        endpoint = %prober.endpoint(),
        command = ?command,
        log = %cli.log_file.display(),
        "webmon starting"
    );

    let supervisor = Supervisor::new(config, prober, control, FileEventLog::new(&cli.log_file));

    // ── Shutdown signal ────────────────────────────────────────
    let signals = Signals::install().context("installing signal handlers")?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        signals.recv().await;
        info!("shutdown signal received; finishing current cycle");
        let _ = shutdown_tx.send(true);
    });

    supervisor
        .run(shutdown_rx)
        .await
        .context("supervised process could not be launched")?;

    println!("webmon terminated.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["webmond", "8080"]).unwrap();
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.config, PathBuf::from("webmon.json"));
        assert_eq!(cli.log_file, PathBuf::from("webmon.log"));
        assert_eq!(cli.path, "/getbalance");
        assert_eq!(cli.grace_ms, 5000);
        assert!(cli.command.is_empty());
    }

    #[test]
    fn cli_trailing_command() {
        let cli = Cli::try_parse_from([
            "webmond", "9000", "--config", "policy.toml", "--", "python", "server.py", "{port}",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("policy.toml"));
        assert_eq!(cli.command, vec!["python", "server.py", "{port}"]);
    }

    #[test]
    fn cli_requires_port() {
        assert!(Cli::try_parse_from(["webmond"]).is_err());
        assert!(Cli::try_parse_from(["webmond", "not-a-port"]).is_err());
        assert!(Cli::try_parse_from(["webmond", "70000"]).is_err());
    }
}
