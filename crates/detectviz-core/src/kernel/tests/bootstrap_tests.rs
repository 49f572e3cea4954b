use crate::config::{ConfigData, ConfigFormat, RuntimeConfig};
use crate::di::{Container, DiError};
use crate::health::{HealthCheck, HealthCheckManager, HealthCheckResult, HealthStatus};
use crate::kernel::bootstrap::Platform;
use crate::kernel::error::{Error, LifecyclePhase};
use crate::plugin_system::error::{PluginSystemError, Result as PluginResult};
use crate::plugin_system::{LifecycleState, Plugin, PluginConfig, PluginRegistry, PluginState};
use crate::CancellationToken;
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Records lifecycle calls into a shared journal.
struct RecordingPlugin {
    id: &'static str,
    lifecycle: LifecycleState,
    journal: Arc<Mutex<Vec<String>>>,
    fail_stop: bool,
    seen_config: Mutex<Option<ConfigData>>,
}

impl RecordingPlugin {
    fn new(id: &'static str, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            id,
            lifecycle: LifecycleState::new(id),
            journal,
            fail_stop: false,
            seen_config: Mutex::new(None),
        }
    }

    fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    fn note(&self, event: &str) {
        self.journal.lock().unwrap().push(format!("{}:{}", event, self.id));
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        self.id
    }

    async fn init(&self, config: &PluginConfig) -> PluginResult<()> {
        *self.seen_config.lock().unwrap() = Some(config.clone());
        self.lifecycle.mark_initialized()?;
        self.note("init");
        Ok(())
    }

    async fn start(&self) -> PluginResult<()> {
        self.lifecycle.mark_running()?;
        self.note("start");
        Ok(())
    }

    async fn stop(&self) -> PluginResult<()> {
        self.lifecycle.mark_stopped();
        self.note("stop");
        if self.fail_stop {
            return Err(PluginSystemError::ShutdownError {
                plugin_id: self.id.to_string(),
                message: "socket busy".to_string(),
            });
        }
        Ok(())
    }
}

/// Health-checkable plugin with a fixed verdict.
struct FixedHealthPlugin {
    status: HealthStatus,
}

#[async_trait]
impl Plugin for FixedHealthPlugin {
    fn name(&self) -> &str {
        "fixed-health"
    }

    async fn init(&self, _config: &PluginConfig) -> PluginResult<()> {
        Ok(())
    }

    async fn start(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn stop(&self) -> PluginResult<()> {
        Ok(())
    }

    fn health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthCheck>> {
        Some(self)
    }
}

#[async_trait]
impl HealthCheck for FixedHealthPlugin {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::new(self.status, "fixed-health")
    }
}

fn journal() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn test_core_components_registered_in_container() {
    let platform = Platform::new(RuntimeConfig::default()).unwrap();
    let container = platform.container();

    let registry = container.resolve::<PluginRegistry>().unwrap();
    assert!(Arc::ptr_eq(&registry, platform.registry()));
    let health = container.resolve::<HealthCheckManager>().unwrap();
    assert!(Arc::ptr_eq(&health, platform.health()));
    assert!(container.is_registered::<RuntimeConfig>());
    assert_eq!(container.name(), "dependency_injection_container");
}

#[tokio::test]
async fn test_lifecycle_order_and_status() {
    let log = journal();
    let mut platform = Platform::new(RuntimeConfig::default()).unwrap();
    platform.add_plugin("first", Arc::new(RecordingPlugin::new("first", log.clone()))).await.unwrap();
    platform.add_plugin("second", Arc::new(RecordingPlugin::new("second", log.clone()))).await.unwrap();
    assert_eq!(platform.plugin_names(), vec!["first", "second"]);

    platform.init_all().await.unwrap();
    let meta = platform.registry().get_metadata("first").await.unwrap();
    assert_eq!(meta["status"], json!("initialized"));

    let token = CancellationToken::new();
    platform.start_all(&token).await.unwrap();
    assert!(platform.health().is_running().await);
    assert_eq!(platform.registry().get_metadata("second").await.unwrap()["status"], json!("running"));

    platform.shutdown().await.unwrap();
    assert!(!platform.health().is_running().await);
    assert_eq!(platform.registry().get_metadata("first").await.unwrap()["status"], json!("stopped"));

    assert_eq!(
        *log.lock().unwrap(),
        vec!["init:first", "init:second", "start:first", "start:second", "stop:second", "stop:first"]
    );
}

#[tokio::test]
async fn test_start_without_init_fails_with_plugin_name() {
    let mut platform = Platform::new(RuntimeConfig::default()).unwrap();
    platform.add_plugin("lazy", Arc::new(RecordingPlugin::new("lazy", journal()))).await.unwrap();

    let err = platform.start_all(&CancellationToken::new()).await.unwrap_err();
    match err {
        Error::PluginLifecycle { phase, plugin, source } => {
            assert_eq!(phase, LifecyclePhase::Start);
            assert_eq!(plugin, "lazy");
            assert!(matches!(source, PluginSystemError::NotInitialized { .. }));
        }
        other => panic!("Expected PluginLifecycle error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_shutdown_continues_past_failures() {
    let log = journal();
    let mut platform = Platform::new(RuntimeConfig::default()).unwrap();
    platform.add_plugin("a", Arc::new(RecordingPlugin::new("a", log.clone()))).await.unwrap();
    platform
        .add_plugin("b", Arc::new(RecordingPlugin::new("b", log.clone()).failing_stop()))
        .await
        .unwrap();
    platform.init_all().await.unwrap();
    platform.start_all(&CancellationToken::new()).await.unwrap();

    let err = platform.shutdown().await.unwrap_err();
    assert!(matches!(err, Error::PluginLifecycle { phase: LifecyclePhase::Shutdown, ref plugin, .. } if plugin == "b"));
    // "a" was still stopped after "b" failed.
    assert!(log.lock().unwrap().contains(&"stop:a".to_string()));
}

#[tokio::test]
async fn test_plugin_config_handed_to_init() {
    let doc = r#"{"plugins": [{"name": "tuned", "type": "recording", "config": {"level": "debug"}}]}"#;
    let config = RuntimeConfig::parse(doc, ConfigFormat::Json).unwrap();
    let mut platform = Platform::new(config).unwrap();
    let plugin = Arc::new(RecordingPlugin::new("tuned", journal()));
    platform.add_plugin("tuned", plugin.clone()).await.unwrap();

    platform.init_all().await.unwrap();
    let seen = plugin.seen_config.lock().unwrap().clone().unwrap();
    assert_eq!(seen.get::<String>("level"), Some("debug".to_string()));
}

#[tokio::test]
async fn test_disabled_plugin_is_skipped() {
    let doc = r#"{"plugins": [{"name": "off", "type": "recording", "enabled": false}]}"#;
    let config = RuntimeConfig::parse(doc, ConfigFormat::Json).unwrap();
    let mut platform = Platform::new(config).unwrap();

    let added = platform.add_plugin("off", Arc::new(RecordingPlugin::new("off", journal()))).await.unwrap();
    assert!(!added);
    assert!(platform.plugin_names().is_empty());
    assert!(!platform.registry().contains("off").await);
}

#[tokio::test]
async fn test_duplicate_plugin_name_rejected() {
    let mut platform = Platform::new(RuntimeConfig::default()).unwrap();
    platform.add_plugin("dup", Arc::new(RecordingPlugin::new("dup", journal()))).await.unwrap();
    let err = platform
        .add_plugin("dup", Arc::new(RecordingPlugin::new("dup", journal())))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PluginSystem(PluginSystemError::AlreadyRegistered { .. })));
    assert_eq!(platform.plugin_names().len(), 1);
}

#[tokio::test]
async fn test_health_checkable_plugins_are_polled() {
    let mut platform = Platform::new(RuntimeConfig::default()).unwrap();
    platform.add_plugin("up", Arc::new(FixedHealthPlugin { status: HealthStatus::Healthy })).await.unwrap();
    platform.add_plugin("down", Arc::new(FixedHealthPlugin { status: HealthStatus::Unhealthy })).await.unwrap();
    platform.add_plugin("plain", Arc::new(RecordingPlugin::new("plain", journal()))).await.unwrap();

    let mut registered = platform.health().registered_plugins().await;
    registered.sort();
    assert_eq!(registered, vec!["down", "up"]);

    platform.health().check_now().await;
    let overall = platform.health().get_overall_health_status().await;
    assert_eq!(overall.status, HealthStatus::Unhealthy);
    assert_eq!(overall.details["total_count"], json!(2));
}

#[tokio::test]
async fn test_install_resolves_from_container() {
    let mut platform = Platform::new(RuntimeConfig::default()).unwrap();
    platform
        .container()
        .register_singleton::<FixedHealthPlugin, _, _>(|_: ()| Arc::new(FixedHealthPlugin { status: HealthStatus::Degraded }))
        .unwrap();

    assert!(platform.install::<FixedHealthPlugin>("installed").await.unwrap());
    let plugin = platform.registry().get::<dyn Plugin>("installed").await.unwrap();
    assert_eq!(plugin.name(), "fixed-health");

    let err = platform.install::<RecordingPlugin>("missing").await.unwrap_err();
    assert!(matches!(err, Error::Container(DiError::NotRegistered { .. })));
}

#[tokio::test]
async fn test_duplicate_policy_from_config() {
    let doc = r#"{"container": {"duplicate_policy": "replace"}}"#;
    let platform = Platform::new(RuntimeConfig::parse(doc, ConfigFormat::Json).unwrap()).unwrap();
    let container: &Container = platform.container();
    assert!(container.register_instance(Arc::new(PluginRegistry::new())).is_ok());
}

#[tokio::test]
async fn test_lifecycle_state_after_shutdown() {
    let mut platform = Platform::new(RuntimeConfig::default()).unwrap();
    let plugin = Arc::new(RecordingPlugin::new("p", journal()));
    platform.add_plugin("p", plugin.clone()).await.unwrap();
    platform.init_all().await.unwrap();
    platform.start_all(&CancellationToken::new()).await.unwrap();
    assert_eq!(plugin.lifecycle.current(), PluginState::Running);
    platform.shutdown().await.unwrap();
    assert_eq!(plugin.lifecycle.current(), PluginState::Stopped);
}

#[tokio::test]
async fn test_metadata_type_names_concrete_plugin() {
    let mut platform = Platform::new(RuntimeConfig::default()).unwrap();
    platform.add_plugin("a", Arc::new(RecordingPlugin::new("a", journal()))).await.unwrap();
    platform.add_plugin("b", Arc::new(FixedHealthPlugin { status: HealthStatus::Healthy })).await.unwrap();

    let a = platform.registry().get_metadata("a").await.unwrap();
    let b = platform.registry().get_metadata("b").await.unwrap();
    assert_ne!(a["type"], b["type"]);
    assert!(a["type"].as_str().unwrap().ends_with("RecordingPlugin"));
    assert!(b["type"].as_str().unwrap().ends_with("FixedHealthPlugin"));

    // Lookup still goes through the trait object.
    assert!(platform.registry().get::<dyn Plugin>("a").await.is_ok());
}
