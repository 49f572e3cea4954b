//! # Configuration
//!
//! Configuration values and the runtime settings document.
//!
//! - **[`data`]**: [`ConfigData`], a string-keyed bag of JSON values handed
//!   to plugins, and [`ConfigFormat`] (JSON always; YAML and TOML behind the
//!   `yaml-config` / `toml-config` features).
//! - **[`runtime`]**: [`RuntimeConfig`], the settings the runtime itself
//!   reads (health polling, container policy, configured plugins).
//! - **[`error`]**: [`ConfigError`].
pub mod data;
pub mod error;
pub mod runtime;

pub use data::{ConfigData, ConfigFormat};
pub use error::ConfigError;
pub use runtime::{ContainerSettings, HealthSettings, PluginEntry, RuntimeConfig, validate_plugin_entries};
