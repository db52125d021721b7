//! webmon.json configuration parser.
//!
//! The mapping is flat: `waittime` plus one object per outcome key.
//!
//! ```json
//! {
//!   "webmonconfig": {
//!     "waittime": 1000,
//!     "http403": { "retrytimes": 2, "action": "restart" },
//!     "timeout": { "retrytimes": 1, "action": "nothing" }
//!   }
//! }
//! ```
//!
//! The `webmonconfig` wrapper is optional. A `.toml` file with the same
//! shape is accepted as well.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::outcome::OutcomeKey;
use crate::policy::{Action, PolicyEntry, PolicyTable};

const WRAPPER_KEY: &str = "webmonconfig";

/// Loaded supervisor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebmonConfig {
    /// Probe timeout, converted from `waittime` milliseconds.
    pub wait_time: Duration,
    pub policy: PolicyTable,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    waittime: Option<u64>,
    #[serde(flatten)]
    entries: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    retrytimes: u32,
    #[serde(default)]
    action: Action,
}

impl WebmonConfig {
    /// Load from disk. The format is picked from the extension: `.toml`
    /// is TOML, anything else is JSON.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };
        debug!(
            path = %path.display(),
            wait_ms = config.wait_time.as_millis() as u64,
            entries = config.policy.len(),
            "config loaded"
        );
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(value)
    }

    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let table: toml::Table = toml::from_str(s)?;
        let value = serde_json::to_value(table)?;
        Self::from_value(value)
    }

    /// Build from an already-parsed document.
    pub fn from_value(mut value: Value) -> ConfigResult<Self> {
        if let Some(inner) = value.get_mut(WRAPPER_KEY) {
            value = inner.take();
        }
        let raw: RawConfig = serde_json::from_value(value)?;
        let wait_ms = raw.waittime.ok_or(ConfigError::MissingField("waittime"))?;

        let mut policy = std::collections::HashMap::new();
        for (name, value) in raw.entries {
            let normalized = name.trim().to_ascii_lowercase();
            let key: OutcomeKey = match normalized.parse() {
                Ok(key) => key,
                Err(_) => {
                    warn!(key = %name, "ignoring config key that is not an outcome");
                    continue;
                }
            };
            if !value.is_object() {
                return Err(ConfigError::InvalidEntry {
                    key: name,
                    reason: "expected an object with `retrytimes` and `action`".to_string(),
                });
            }
            let entry: RawEntry =
                serde_json::from_value(value).map_err(|e| ConfigError::InvalidEntry {
                    key: name.clone(),
                    reason: e.to_string(),
                })?;
            if policy
                .insert(key, PolicyEntry::new(entry.retrytimes, entry.action))
                .is_some()
            {
                warn!(%key, "duplicate policy entry after normalization; last one wins");
            }
        }

        Ok(Self {
            wait_time: Duration::from_millis(wait_ms),
            policy: PolicyTable::new(policy),
        })
    }
}
