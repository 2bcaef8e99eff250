//! Engine configuration.
//!
//! # Data Flow
//! ```text
//! engine.toml
//!     → loader.rs: toml → EngineConfig (missing sections take defaults)
//!     → validation.rs: every semantic rule, all failures collected
//!     → ObservabilityEngine::new (capacities fixed from here on)
//!
//! engine.toml edited
//!     → watcher.rs: file event in the parent directory
//!     → loader.rs + validation.rs again; invalid edits are logged and dropped
//!     → ObservabilityEngine::apply_config (sampling, SLA, anomaly thresholds)
//! ```
//!
//! # Design Decisions
//! - No config file is required; `EngineConfig::default()` is a working setup
//! - Reloads retune policy only, never buffer capacities
//! - serde handles shape errors, `validate_config` handles value errors

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, AnomalyConfig, BufferConfig, EngineConfig, ObservabilityConfig, SamplingConfig,
    SlaConfig,
};
pub use validation::{config_warnings, validate_config, ValidationError};
