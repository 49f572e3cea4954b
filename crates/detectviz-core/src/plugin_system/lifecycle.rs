use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::plugin_system::error::{PluginSystemError, Result};

/// Lifecycle position of a plugin.
///
/// `Uninitialized -> Initialized -> Running -> Stopped`. A stopped plugin may
/// be started again without re-initialization, or re-initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

impl PluginState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginState::Uninitialized => "uninitialized",
            PluginState::Initialized => "initialized",
            PluginState::Running => "running",
            PluginState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thread-safe lifecycle tracker for plugins to embed.
///
/// Plugin methods take `&self`, so the state lives behind a mutex. Each
/// `mark_*` call validates the transition before applying it.
#[derive(Debug)]
pub struct LifecycleState {
    plugin_id: String,
    state: Mutex<PluginState>,
}

impl LifecycleState {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            state: Mutex::new(PluginState::Uninitialized),
        }
    }

    pub fn current(&self) -> PluginState {
        *self.lock()
    }

    pub fn is_running(&self) -> bool {
        self.current() == PluginState::Running
    }

    /// Record a successful `init`. Repeating `init` before `start` is allowed;
    /// initializing a running plugin is not.
    pub fn mark_initialized(&self) -> Result<()> {
        let mut state = self.lock();
        match *state {
            PluginState::Running => Err(PluginSystemError::InvalidTransition {
                plugin_id: self.plugin_id.clone(),
                from: PluginState::Running,
                to: PluginState::Initialized,
            }),
            _ => {
                *state = PluginState::Initialized;
                Ok(())
            }
        }
    }

    /// Check that `start` may proceed and record the plugin as running.
    pub fn mark_running(&self) -> Result<()> {
        let mut state = self.lock();
        match *state {
            PluginState::Uninitialized => Err(PluginSystemError::NotInitialized {
                plugin_id: self.plugin_id.clone(),
            }),
            PluginState::Running => Err(PluginSystemError::InvalidTransition {
                plugin_id: self.plugin_id.clone(),
                from: PluginState::Running,
                to: PluginState::Running,
            }),
            PluginState::Initialized | PluginState::Stopped => {
                *state = PluginState::Running;
                Ok(())
            }
        }
    }

    /// Record a `stop`. Never fails; returns the state before the call so the
    /// caller can skip releasing resources that were never acquired.
    pub fn mark_stopped(&self) -> PluginState {
        let mut state = self.lock();
        let previous = *state;
        if previous != PluginState::Uninitialized {
            *state = PluginState::Stopped;
        }
        previous
    }

    fn lock(&self) -> MutexGuard<'_, PluginState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
