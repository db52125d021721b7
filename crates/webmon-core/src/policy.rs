//! Policy table: per-outcome retry counts and escalation actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::outcome::OutcomeKey;

/// Escalation taken once the retries of a cycle are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Log the failure and carry on.
    #[default]
    Nothing,
    /// Terminate the supervised process and start a fresh one.
    Restart,
}

/// Retry count and escalation action for one outcome key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyEntry {
    pub retry_times: u32,
    pub action: Action,
}

impl PolicyEntry {
    pub fn new(retry_times: u32, action: Action) -> Self {
        Self { retry_times, action }
    }

    /// Total probes allowed in one cycle: the first one plus the retries.
    pub fn max_attempts(&self) -> u32 {
        self.retry_times.saturating_add(1)
    }
}

/// Read-only mapping from outcome key to policy entry.
///
/// Outcomes without an entry get [`PolicyEntry::default`], i.e. no
/// retries and no escalation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    entries: HashMap<OutcomeKey, PolicyEntry>,
}

impl PolicyTable {
    pub fn new(entries: HashMap<OutcomeKey, PolicyEntry>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, key: OutcomeKey) -> PolicyEntry {
        self.entries.get(&key).copied().unwrap_or_default()
    }

    /// Number of configured entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(OutcomeKey, PolicyEntry)> for PolicyTable {
    fn from_iter<I: IntoIterator<Item = (OutcomeKey, PolicyEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PolicyTable {
        [
            (OutcomeKey::Http(403), PolicyEntry::new(2, Action::Restart)),
            (OutcomeKey::Timeout, PolicyEntry::new(1, Action::Nothing)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn lookup_configured_entry() {
        let t = table();
        assert_eq!(t.lookup(OutcomeKey::Http(403)), PolicyEntry::new(2, Action::Restart));
        assert_eq!(t.lookup(OutcomeKey::Timeout), PolicyEntry::new(1, Action::Nothing));
    }

    #[test]
    fn lookup_unknown_returns_default() {
        let t = table();
        for key in [OutcomeKey::Http(500), OutcomeKey::Http(200), OutcomeKey::TransportError] {
            let entry = t.lookup(key);
            assert_eq!(entry.retry_times, 0);
            assert_eq!(entry.action, Action::Nothing);
        }
    }

    #[test]
    fn empty_table_defaults_everything() {
        let t = PolicyTable::default();
        assert!(t.is_empty());
        assert_eq!(t.lookup(OutcomeKey::Timeout), PolicyEntry::default());
    }

    #[test]
    fn max_attempts_is_one_plus_retries() {
        assert_eq!(PolicyEntry::default().max_attempts(), 1);
        assert_eq!(PolicyEntry::new(2, Action::Restart).max_attempts(), 3);
        assert_eq!(PolicyEntry::new(u32::MAX, Action::Nothing).max_attempts(), u32::MAX);
    }

    #[test]
    fn action_text_form() {
        assert_eq!(serde_json::to_string(&Action::Restart).unwrap(), "\"restart\"");
        let nothing: Action = serde_json::from_str("\"nothing\"").unwrap();
        assert_eq!(nothing, Action::Nothing);
        assert!(serde_json::from_str::<Action>("\"reboot\"").is_err());
    }
}
