use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::health::types::{HealthCheckResult, HealthStatus, duration_text};

/// Report served to outer layers (HTTP handlers, the CLI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, PluginHealth>,
}

/// Per-plugin entry of a [`HealthReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginHealth {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub last_checked: DateTime<Utc>,
    #[serde(with = "duration_text")]
    pub duration: Duration,
}

impl From<&HealthCheckResult> for PluginHealth {
    fn from(result: &HealthCheckResult) -> Self {
        Self {
            status: result.status,
            message: result.message.clone(),
            last_checked: result.last_checked,
            duration: result.duration,
        }
    }
}

impl HealthReport {
    pub fn new(overall: HealthCheckResult, plugins: &HashMap<String, HealthCheckResult>) -> Self {
        Self {
            status: overall.status,
            timestamp: Utc::now(),
            message: overall.message,
            details: overall.details,
            plugins: plugins
                .iter()
                .map(|(name, result)| (name.clone(), PluginHealth::from(result)))
                .collect(),
        }
    }

    pub fn http_status_code(&self) -> u16 {
        self.status.http_status_code()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
