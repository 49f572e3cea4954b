//! # Kernel Errors
//!
//! [`Error`] aggregates the per-subsystem errors (container, plugin system,
//! health, configuration) and adds the lifecycle failures raised while the
//! [`Platform`](crate::kernel::Platform) drives plugins through their phases.
use std::fmt;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::di::DiError;
use crate::health::HealthError;
use crate::plugin_system::PluginSystemError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Dependency injection error: {0}")]
    Container(#[from] DiError),

    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("Health check error: {0}")]
    Health(#[from] HealthError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A plugin failed during one of the bootstrap phases.
    #[error("Lifecycle error during {phase} of plugin '{plugin}': {source}")]
    PluginLifecycle {
        phase: LifecyclePhase,
        plugin: String,
        #[source]
        source: PluginSystemError,
    },

    #[error("Error: {0}")]
    Other(String),
}

/// Phase of the platform lifecycle an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Initialize,
    Start,
    Shutdown,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecyclePhase::Initialize => f.write_str("initialize"),
            LifecyclePhase::Start => f.write_str("start"),
            LifecyclePhase::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;
