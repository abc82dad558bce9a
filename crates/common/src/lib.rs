//! Shared identifiers and configuration used by every lattice crate.
//!
//! # Invariants
//! - Entity uids and component sids are 1-based; `0` is never handed out.
//! - Configuration is read once at startup and never mutated afterwards.

mod config;
mod types;

pub use config::{ConfigError, EngineConfig};
pub use types::{ComponentSid, ComponentTid, EntityUid};

pub fn crate_info() -> &'static str {
    "lattice-common v0.1.0"
}
