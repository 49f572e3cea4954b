//! # Plugin System Errors
//!
//! Defines [`PluginSystemError`], covering registry failures (empty or
//! duplicate names, unknown plugins, type mismatches on lookup) and lifecycle
//! failures raised by plugins themselves.
use crate::plugin_system::lifecycle::PluginState;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Plugin name cannot be empty")]
    EmptyName,

    #[error("Plugin '{name}' is already registered")]
    AlreadyRegistered { name: String },

    #[error("Plugin '{name}' not found")]
    NotFound { name: String },

    #[error("Plugin '{name}' is registered as {actual}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Plugin '{plugin_id}' is not initialized")]
    NotInitialized { plugin_id: String },

    #[error("Invalid lifecycle transition for plugin '{plugin_id}': {from} -> {to}")]
    InvalidTransition {
        plugin_id: String,
        from: PluginState,
        to: PluginState,
    },

    #[error("Plugin configuration error for '{plugin_id}': {message}")]
    ConfigurationError { plugin_id: String, message: String },

    #[error("Plugin shutdown error for '{plugin_id}': {message}")]
    ShutdownError { plugin_id: String, message: String },
}

pub type Result<T> = std::result::Result<T, PluginSystemError>;
