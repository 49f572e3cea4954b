use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RuntimeConfig;
use crate::di::Container;
use crate::health::{CheckSettings, HealthCheckManager};
use crate::kernel::constants;
use crate::kernel::error::{Error, LifecyclePhase, Result};
use crate::plugin_system::{Plugin, PluginRegistry};

/// Bootstrap of the plugin runtime.
///
/// Owns the container, the plugin registry and the health check manager, and
/// drives added plugins through `init`, `start` and `stop`. Plugins start in
/// the order they were added and stop in reverse.
pub struct Platform {
    config: Arc<RuntimeConfig>,
    container: Arc<Container>,
    registry: Arc<PluginRegistry>,
    health: Arc<HealthCheckManager>,
    plugins: Vec<(String, Arc<dyn Plugin>)>,
}

impl Platform {
    /// Build the core components and register them in the container.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);

        let config = Arc::new(config);
        let container = Arc::new(Container::with_policy(config.container.duplicate_policy));
        let registry = Arc::new(PluginRegistry::new());
        let health = Arc::new(HealthCheckManager::new(CheckSettings::from(&config.health)));

        container.register_instance(Arc::clone(&config))?;
        container.register_instance(Arc::clone(&registry))?;
        container.register_instance(Arc::clone(&health))?;
        log::debug!(
            "Registered {} and {} in {}",
            registry.name(),
            health.name(),
            container.name()
        );

        Ok(Self {
            config,
            container,
            registry,
            health,
            plugins: Vec::new(),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn health(&self) -> &Arc<HealthCheckManager> {
        &self.health
    }

    /// Names of the managed plugins in start order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Put a plugin under management.
    ///
    /// Registers it in the registry and, if it exposes a health checker, with
    /// the health manager. Plugins disabled in the configuration are skipped;
    /// the return value says whether the plugin was added.
    pub async fn add_plugin(&mut self, name: impl Into<String>, plugin: Arc<dyn Plugin>) -> Result<bool> {
        let name = name.into();
        if !self.config.is_plugin_enabled(&name) {
            log::info!("Plugin '{}' is disabled in configuration, skipping", name);
            return Ok(false);
        }

        self.registry
            .register_with_type::<dyn Plugin>(name.clone(), Arc::clone(&plugin), plugin.type_name())
            .await?;
        if let Some(checker) = Arc::clone(&plugin).health_checker() {
            self.health.register_plugin(name.clone(), checker).await;
        }
        log::info!("Added plugin '{}' ({})", name, plugin.name());
        self.plugins.push((name, plugin));
        Ok(true)
    }

    /// Resolve a concrete plugin type from the container and add it.
    pub async fn install<P>(&mut self, name: impl Into<String>) -> Result<bool>
    where
        P: Plugin + 'static,
    {
        let plugin = self.container.resolve::<P>()?;
        self.add_plugin(name, plugin).await
    }

    /// Initialize every plugin in order with its configured settings.
    pub async fn init_all(&self) -> Result<()> {
        log::info!("Initializing plugins...");
        for (name, plugin) in &self.plugins {
            let plugin_config = self.config.plugin_config(name);
            plugin
                .init(&plugin_config)
                .await
                .map_err(|source| Error::PluginLifecycle {
                    phase: LifecyclePhase::Initialize,
                    plugin: name.clone(),
                    source,
                })?;
            self.registry.set_status(name, "initialized").await?;
            log::debug!("Initialized plugin '{}'", name);
        }
        Ok(())
    }

    /// Start every plugin in order, then the health manager.
    pub async fn start_all(&self, token: &CancellationToken) -> Result<()> {
        log::info!("Starting plugins...");
        for (name, plugin) in &self.plugins {
            plugin.start().await.map_err(|source| Error::PluginLifecycle {
                phase: LifecyclePhase::Start,
                plugin: name.clone(),
                source,
            })?;
            self.registry.set_status(name, "running").await?;
            log::debug!("Started plugin '{}'", name);
        }
        self.health.start(token).await?;
        log::info!("Platform started with {} plugins", self.plugins.len());
        Ok(())
    }

    /// Stop the health manager, then every plugin in reverse order.
    ///
    /// Keeps going past failures and returns the first one.
    pub async fn shutdown(&self) -> Result<()> {
        log::info!("Shutting down...");
        let mut first_error: Option<Error> = None;

        if self.health.is_running().await {
            if let Err(e) = self.health.stop().await {
                log::error!("Error stopping {}: {}", self.health.name(), e);
                first_error.get_or_insert(e.into());
            }
        }

        for (name, plugin) in self.plugins.iter().rev() {
            match plugin.stop().await {
                Ok(()) => {
                    if let Err(e) = self.registry.set_status(name, "stopped").await {
                        first_error.get_or_insert(e.into());
                    }
                    log::debug!("Stopped plugin '{}'", name);
                }
                Err(source) => {
                    log::error!("Error stopping plugin '{}': {}", name, source);
                    first_error.get_or_insert(Error::PluginLifecycle {
                        phase: LifecyclePhase::Shutdown,
                        plugin: name.clone(),
                        source,
                    });
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                log::info!("Shutdown complete");
                Ok(())
            }
        }
    }
}
