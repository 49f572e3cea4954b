use std::time::Duration;

/// Application name
pub const APP_NAME: &str = "detectviz";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default polling interval for health checks
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound on a single plugin's health check
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Health checks allowed in flight at once during a pass
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 16;

/// Component name of the dependency injection container
pub const CONTAINER_COMPONENT_NAME: &str = "dependency_injection_container";

/// Component name of the plugin registry
pub const REGISTRY_COMPONENT_NAME: &str = "core_registry";

/// Component name of the health check manager
pub const HEALTH_MANAGER_COMPONENT_NAME: &str = "health_check_manager";
