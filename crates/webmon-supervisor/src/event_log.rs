//! Append-only event log.
//!
//! Every decision becomes one self-contained JSON line:
//!
//! ```text
//! {"timestamp":"2026-10-16T12:00:00.123+02:00","event":"attempt","attempt":1,"max_attempts":3,"outcome":"http403","message":"Attempt 1/3, Status: 403"}
//! ```
//!
//! The file is opened in append mode for every line and never truncated.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Local, SecondsFormat};
use serde::Serialize;

use crate::event::SupervisionEvent;

/// Destination for decision events.
///
/// A write failure is reported to the caller, which must keep going.
pub trait EventSink: Send {
    fn record(&mut self, event: &SupervisionEvent) -> io::Result<()>;
}

#[derive(Serialize)]
struct LogLine<'a> {
    timestamp: String,
    #[serde(flatten)]
    event: &'a SupervisionEvent,
    message: String,
}

/// JSON-lines log file.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render one event as a log line, without the trailing newline.
    pub fn render(event: &SupervisionEvent) -> io::Result<String> {
        let line = LogLine {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            event,
            message: event.message(),
        };
        serde_json::to_string(&line).map_err(io::Error::other)
    }
}

impl EventSink for FileEventLog {
    fn record(&mut self, event: &SupervisionEvent) -> io::Result<()> {
        let mut line = Self::render(event)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<SupervisionEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<SupervisionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of recorded events of the given kind.
    pub fn count(&self, kind: &str) -> usize {
        self.events().iter().filter(|e| e.kind() == kind).count()
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, event: &SupervisionEvent) -> io::Result<()> {
        self.events
            .lock()
            .map_err(|_| io::Error::other("memory sink poisoned"))?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Attempt;
    use webmon_core::OutcomeKey;

    #[test]
    fn file_log_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webmon.log");
        let mut log = FileEventLog::new(&path);

        log.record(&SupervisionEvent::Launched).unwrap();
        log.record(&SupervisionEvent::Attempt(Attempt {
            attempt: 1,
            max_attempts: 3,
            outcome: OutcomeKey::Http(403),
        }))
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "attempt");
        assert_eq!(second["outcome"], "http403");
        assert_eq!(second["message"], "Attempt 1/3, Status: 403");
        assert!(second["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn file_log_never_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webmon.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let mut log = FileEventLog::new(&path);
        log.record(&SupervisionEvent::Stopped).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn unwritable_log_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = FileEventLog::new(dir.path().join("missing-dir").join("webmon.log"));
        assert!(log.record(&SupervisionEvent::Launched).is_err());
    }

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.record(&SupervisionEvent::Launched).unwrap();
        writer.record(&SupervisionEvent::Stopped).unwrap();
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.count("stopped"), 1);
    }
}
