//! Host environment health check.
//!
//! Verifies that configured paths and environment variables exist and reports
//! the outcome through the health check capability:
//!
//! - a missing required path or variable makes the plugin `unhealthy`;
//! - a missing optional path makes it `degraded`;
//! - otherwise it is `healthy`.
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use detectviz_core::health::{HealthCheck, HealthCheckResult};
use detectviz_core::plugin_system::error::{PluginSystemError, Result};
use detectviz_core::plugin_system::{LifecycleState, Plugin, PluginConfig, PluginState};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const PLUGIN_NAME: &str = "core-environment-check";

const OS_RELEASE_PATH: &str = "/etc/os-release";

/// What the plugin checks. Read from its configuration on `init`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EnvironmentRequirements {
    /// Paths that must exist
    pub required_paths: Vec<PathBuf>,
    /// Paths whose absence degrades the plugin
    pub optional_paths: Vec<PathBuf>,
    /// Environment variables that must be set
    pub required_env: Vec<String>,
    /// Suggested polling interval in seconds; 0 means the runtime default
    pub check_interval_secs: u64,
}

impl EnvironmentRequirements {
    pub fn from_config(config: &PluginConfig) -> Result<Self> {
        let value = serde_json::to_value(config).map_err(|e| configuration_error(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| configuration_error(e.to_string()))
    }
}

fn configuration_error(message: String) -> PluginSystemError {
    PluginSystemError::ConfigurationError {
        plugin_id: PLUGIN_NAME.to_string(),
        message,
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OsInfo {
    pub id: Option<String>,          // e.g., "ubuntu", "fedora"
    pub name: Option<String>,        // e.g., "Ubuntu", "Fedora Linux"
    pub version_id: Option<String>,  // e.g., "22.04"
    pub pretty_name: Option<String>, // e.g., "Ubuntu 22.04.3 LTS"
}

/// Parse an os-release style file. A missing or unreadable file yields the
/// default (empty) info.
pub fn read_os_info(file_path: &Path) -> OsInfo {
    let file = match fs::File::open(file_path) {
        Ok(file) => file,
        Err(e) => {
            log::debug!("Could not open {}: {}", file_path.display(), e);
            return OsInfo::default();
        }
    };

    let mut vars = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to read line from {}: {}", file_path.display(), e);
                continue;
            }
        };
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                vars.insert(key.trim().to_string(), value.trim().trim_matches('"').to_string());
            }
            None => log::warn!("Ignoring malformed line in {}: {}", file_path.display(), line),
        }
    }

    OsInfo {
        id: vars.remove("ID"),
        name: vars.remove("NAME"),
        version_id: vars.remove("VERSION_ID"),
        pretty_name: vars.remove("PRETTY_NAME"),
    }
}

pub struct EnvironmentCheckPlugin {
    lifecycle: LifecycleState,
    requirements: Mutex<EnvironmentRequirements>,
    os_release_path: PathBuf,
}

impl EnvironmentCheckPlugin {
    pub fn new() -> Self {
        Self::with_os_release_path(OS_RELEASE_PATH)
    }

    /// Read OS details from `path` instead of `/etc/os-release`.
    pub fn with_os_release_path(path: impl Into<PathBuf>) -> Self {
        Self {
            lifecycle: LifecycleState::new(PLUGIN_NAME),
            requirements: Mutex::new(EnvironmentRequirements::default()),
            os_release_path: path.into(),
        }
    }

    pub fn requirements(&self) -> EnvironmentRequirements {
        self.requirements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> PluginState {
        self.lifecycle.current()
    }
}

impl Default for EnvironmentCheckPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Check `requirements` against the host. Touches the filesystem, so async
/// callers run it on the blocking pool.
fn evaluate(requirements: &EnvironmentRequirements, os_release_path: &Path) -> HealthCheckResult {
    let missing = |paths: &[PathBuf]| -> Vec<String> {
        paths
            .iter()
            .filter(|path| !path.exists())
            .map(|path| path.display().to_string())
            .collect()
    };
    let missing_paths = missing(&requirements.required_paths);
    let missing_optional = missing(&requirements.optional_paths);
    let missing_env: Vec<&String> = requirements
        .required_env
        .iter()
        .filter(|var| std::env::var_os(var.as_str()).is_none())
        .collect();

    let result = if !missing_paths.is_empty() || !missing_env.is_empty() {
        HealthCheckResult::unhealthy(format!(
            "{} required paths and {} environment variables missing",
            missing_paths.len(),
            missing_env.len()
        ))
        .with_detail("missing_paths", json!(missing_paths))
        .with_detail("missing_env", json!(missing_env))
    } else if !missing_optional.is_empty() {
        HealthCheckResult::degraded(format!("{} optional paths missing", missing_optional.len()))
            .with_detail("missing_optional_paths", json!(missing_optional))
    } else {
        HealthCheckResult::healthy("Environment requirements satisfied")
    };

    let os_info = read_os_info(os_release_path);
    match os_info.pretty_name {
        Some(os) => result.with_detail("os", os),
        None => result,
    }
}

#[async_trait]
impl Plugin for EnvironmentCheckPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    async fn init(&self, config: &PluginConfig) -> Result<()> {
        let requirements = EnvironmentRequirements::from_config(config)?;
        info!(
            "Initializing Core Environment Check Plugin ({} required paths, {} optional paths, {} env vars)",
            requirements.required_paths.len(),
            requirements.optional_paths.len(),
            requirements.required_env.len()
        );
        *self.requirements.lock().unwrap_or_else(PoisonError::into_inner) = requirements;
        self.lifecycle.mark_initialized()
    }

    async fn start(&self) -> Result<()> {
        self.lifecycle.mark_running()
    }

    async fn stop(&self) -> Result<()> {
        self.lifecycle.mark_stopped();
        Ok(())
    }

    fn health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthCheck>> {
        Some(self)
    }
}

#[async_trait]
impl HealthCheck for EnvironmentCheckPlugin {
    async fn health_check(&self) -> HealthCheckResult {
        if self.lifecycle.current() == PluginState::Uninitialized {
            return HealthCheckResult::unknown("Plugin not initialized");
        }
        let requirements = self.requirements();
        let os_release_path = self.os_release_path.clone();
        tokio::task::spawn_blocking(move || evaluate(&requirements, &os_release_path))
            .await
            .unwrap_or_else(|e| HealthCheckResult::unhealthy(format!("Environment check failed: {}", e)))
    }

    fn health_check_interval(&self) -> Duration {
        match self.requirements().check_interval_secs {
            0 => detectviz_core::kernel::constants::DEFAULT_HEALTH_CHECK_INTERVAL,
            secs => Duration::from_secs(secs),
        }
    }
}
