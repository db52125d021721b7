//! webmon-core: the pure half of the supervision engine.
//!
//! Everything in this crate is free of I/O apart from reading the config
//! file: probe results are classified into an [`OutcomeKey`], and the
//! [`PolicyTable`] turns an outcome into a retry count and an escalation
//! [`Action`].

pub mod config;
pub mod error;
pub mod outcome;
pub mod policy;

pub use config::WebmonConfig;
pub use error::{ConfigError, ConfigResult};
pub use outcome::{OutcomeKey, RawProbe, classify};
pub use policy::{Action, PolicyEntry, PolicyTable};
