//! Installs the process-wide logging backend.
//!
//! Library code logs through the `log` facade. On `init` this plugin installs
//! a `tracing-subscriber` formatter (text or JSON lines) and bridges `log`
//! records into it. The filter comes from `RUST_LOG` when set, otherwise from
//! the plugin's `level` setting. Output goes to stderr.
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use detectviz_core::plugin_system::error::{PluginSystemError, Result};
use detectviz_core::plugin_system::{LifecycleState, Plugin, PluginConfig};
use log::info;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub const PLUGIN_NAME: &str = "core-logging";

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" | "compact" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            with_target: true,
        }
    }
}

impl LoggingSettings {
    /// Read `level`, `format` and `with_target` from plugin configuration.
    pub fn from_config(config: &PluginConfig) -> Result<Self> {
        let defaults = Self::default();
        let level = config.get_or("level", defaults.level);
        let format = match config.get::<String>("format") {
            Some(raw) => raw.parse().map_err(|message| PluginSystemError::ConfigurationError {
                plugin_id: PLUGIN_NAME.to_string(),
                message,
            })?,
            None => defaults.format,
        };
        // Reject filters the subscriber would not accept.
        EnvFilter::try_new(&level).map_err(|e| PluginSystemError::ConfigurationError {
            plugin_id: PLUGIN_NAME.to_string(),
            message: format!("invalid level '{}': {}", level, e),
        })?;
        Ok(Self {
            level,
            format,
            with_target: config.get_or("with_target", defaults.with_target),
        })
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Whether a global subscriber has been installed by this plugin (or was
/// already present when it tried).
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

/// Install the subscriber and the `log` bridge. Later calls are no-ops.
pub fn install(settings: &LoggingSettings) {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_target(settings.with_target)
        .with_writer(std::io::stderr);
    let installed = match settings.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Text => tracing::subscriber::set_global_default(builder.compact().finish()),
    };
    if let Err(e) = installed {
        // Somebody else owns the global subscriber; keep using theirs.
        log::debug!("Global tracing subscriber already set: {}", e);
    }
    if let Err(e) = tracing_log::LogTracer::init() {
        log::debug!("log bridge already set: {}", e);
    }
}

pub struct LoggingPlugin {
    lifecycle: LifecycleState,
    settings: Mutex<LoggingSettings>,
}

impl LoggingPlugin {
    pub fn new() -> Self {
        Self {
            lifecycle: LifecycleState::new(PLUGIN_NAME),
            settings: Mutex::new(LoggingSettings::default()),
        }
    }

    pub fn settings(&self) -> LoggingSettings {
        self.settings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> detectviz_core::PluginState {
        self.lifecycle.current()
    }
}

impl Default for LoggingPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for LoggingPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    async fn init(&self, config: &PluginConfig) -> Result<()> {
        let settings = LoggingSettings::from_config(config)?;
        install(&settings);
        *self
            .settings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = settings.clone();
        self.lifecycle.mark_initialized()?;
        info!(
            "Logging initialized (level: {}, format: {:?})",
            settings.level, settings.format
        );
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        self.lifecycle.mark_running()
    }

    async fn stop(&self) -> Result<()> {
        // The global subscriber stays installed for the rest of the process.
        self.lifecycle.mark_stopped();
        info!("Shutting down Core Logging Plugin");
        Ok(())
    }
}
