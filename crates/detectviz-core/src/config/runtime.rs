use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::data::{ConfigData, ConfigFormat};
use crate::config::error::{ConfigError, Result};
use crate::di::DuplicatePolicy;
use crate::kernel::constants;

/// Settings the runtime itself reads at bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub health: HealthSettings,
    pub container: ContainerSettings,
    pub plugins: Vec<PluginEntry>,
}

impl RuntimeConfig {
    /// Load from a file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&data, format)?;
        log::debug!("Loaded runtime configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a configuration document.
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self> {
        let config: Self = format.parse(data)?;
        validate_plugin_entries(&config.plugins)?;
        Ok(config)
    }

    /// Configuration for the named plugin, or an empty one.
    pub fn plugin_config(&self, name: &str) -> ConfigData {
        self.plugin_entry(name)
            .map(|entry| entry.config.clone())
            .unwrap_or_default()
    }

    pub fn plugin_entry(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|entry| entry.name == name)
    }

    /// Whether the named plugin should be loaded. Plugins without an entry
    /// are enabled.
    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        self.plugin_entry(name).is_none_or(|entry| entry.enabled)
    }
}

/// Health polling settings. Zero values fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    pub interval_secs: u64,
    pub check_timeout_secs: u64,
    pub max_concurrent_checks: usize,
}

impl HealthSettings {
    pub fn interval(&self) -> Duration {
        if self.interval_secs == 0 {
            constants::DEFAULT_HEALTH_CHECK_INTERVAL
        } else {
            Duration::from_secs(self.interval_secs)
        }
    }

    pub fn check_timeout(&self) -> Duration {
        if self.check_timeout_secs == 0 {
            constants::DEFAULT_HEALTH_CHECK_TIMEOUT
        } else {
            Duration::from_secs(self.check_timeout_secs)
        }
    }

    pub fn max_concurrent_checks(&self) -> usize {
        if self.max_concurrent_checks == 0 {
            constants::DEFAULT_MAX_CONCURRENT_CHECKS
        } else {
            self.max_concurrent_checks
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            interval_secs: constants::DEFAULT_HEALTH_CHECK_INTERVAL.as_secs(),
            check_timeout_secs: constants::DEFAULT_HEALTH_CHECK_TIMEOUT.as_secs(),
            max_concurrent_checks: constants::DEFAULT_MAX_CONCURRENT_CHECKS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    pub duplicate_policy: DuplicatePolicy,
}

/// One configured plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub config: ConfigData,
}

fn default_enabled() -> bool {
    true
}

/// Check every entry has a non-empty name and type and that names are unique.
pub fn validate_plugin_entries(entries: &[PluginEntry]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        let invalid = |message: &str| ConfigError::InvalidPluginEntry {
            index,
            name: entry.name.clone(),
            message: message.to_string(),
        };
        if entry.name.trim().is_empty() {
            return Err(invalid("missing required 'name'"));
        }
        if entry.kind.trim().is_empty() {
            return Err(invalid("missing required 'type'"));
        }
        if !seen.insert(entry.name.as_str()) {
            return Err(invalid("duplicate plugin name"));
        }
    }
    Ok(())
}
