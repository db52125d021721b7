//! Outcome classification.
//!
//! A probe produces a [`RawProbe`]; [`classify`] maps it onto the
//! canonical [`OutcomeKey`] the policy table is keyed by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a single health probe, before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawProbe {
    /// The endpoint answered with this HTTP status code.
    Status(u16),
    /// No response arrived within the configured wait time.
    Timeout,
    /// The request failed for any other reason (refused, reset, DNS, ...).
    TransportError,
}

/// Canonical classification of a probe result.
///
/// The textual form (`timeout`, `error`, `http<code>`) is the key used
/// in the policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum OutcomeKey {
    Timeout,
    TransportError,
    Http(u16),
}

impl OutcomeKey {
    /// The outcome that counts as healthy.
    pub const HEALTHY: OutcomeKey = OutcomeKey::Http(200);

    /// Whether this is the designated healthy outcome (`http200`).
    pub fn is_healthy(self) -> bool {
        self == Self::HEALTHY
    }

    /// Short status label for log messages: the numeric code for HTTP
    /// outcomes, otherwise `timeout` / `error`.
    pub fn status_label(self) -> String {
        match self {
            OutcomeKey::Http(code) => code.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for OutcomeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKey::Timeout => f.write_str("timeout"),
            OutcomeKey::TransportError => f.write_str("error"),
            OutcomeKey::Http(code) => write!(f, "http{code}"),
        }
    }
}

/// A string that does not name any outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown outcome key: {0:?}")]
pub struct UnknownOutcomeKey(pub String);

impl FromStr for OutcomeKey {
    type Err = UnknownOutcomeKey;

    /// Parse a normalized key. Callers are expected to trim and lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout" => Ok(OutcomeKey::Timeout),
            "error" => Ok(OutcomeKey::TransportError),
            _ => s
                .strip_prefix("http")
                .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|digits| digits.parse::<u16>().ok())
                .map(OutcomeKey::Http)
                .ok_or_else(|| UnknownOutcomeKey(s.to_string())),
        }
    }
}

impl From<OutcomeKey> for String {
    fn from(key: OutcomeKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for OutcomeKey {
    type Error = UnknownOutcomeKey;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Map a raw probe result to its outcome key. Total and side-effect free.
pub fn classify(raw: RawProbe) -> OutcomeKey {
    match raw {
        RawProbe::Status(code) => OutcomeKey::Http(code),
        RawProbe::Timeout => OutcomeKey::Timeout,
        RawProbe::TransportError => OutcomeKey::TransportError,
    }
}
