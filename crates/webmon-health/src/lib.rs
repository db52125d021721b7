//! webmon-health: health probing for the supervised service.
//!
//! A probe is exactly one HTTP GET with a hard timeout. It never retries;
//! retry decisions belong to the supervision loop.
//!
//! # Architecture
//!
//! ```text
//! Probe (trait)
//!   └── HttpProber
//!         └── http_probe() → RawProbe { Status(u16) | Timeout | TransportError }
//! ```

pub mod checker;

pub use checker::{HttpProber, Probe, http_probe};
