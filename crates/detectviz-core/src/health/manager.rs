use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use serde_json::json;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::HealthSettings;
use crate::health::checker::HealthCheck;
use crate::health::error::{HealthError, Result};
use crate::health::report::HealthReport;
use crate::health::types::{HealthCheckResult, HealthStatus};
use crate::kernel::constants;

/// Polling parameters of a [`HealthCheckManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSettings {
    pub interval: Duration,
    pub check_timeout: Duration,
    pub max_concurrent_checks: usize,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            interval: constants::DEFAULT_HEALTH_CHECK_INTERVAL,
            check_timeout: constants::DEFAULT_HEALTH_CHECK_TIMEOUT,
            max_concurrent_checks: constants::DEFAULT_MAX_CONCURRENT_CHECKS,
        }
    }
}

impl From<&HealthSettings> for CheckSettings {
    fn from(settings: &HealthSettings) -> Self {
        Self {
            interval: settings.interval(),
            check_timeout: settings.check_timeout(),
            max_concurrent_checks: settings.max_concurrent_checks(),
        }
    }
}

/// Shared between the manager handle and its polling task.
struct ManagerState {
    settings: CheckSettings,
    plugins: RwLock<HashMap<String, Arc<dyn HealthCheck>>>,
    results: RwLock<HashMap<String, HealthCheckResult>>,
}

struct Driver {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Driver {
    fn is_active(&self) -> bool {
        !self.handle.is_finished() && !self.token.is_cancelled()
    }
}

/// Polls registered [`HealthCheck`] implementations and keeps the last result
/// of each.
///
/// Lock order is `plugins` then `results`; no other lock is held while a
/// check runs.
pub struct HealthCheckManager {
    state: Arc<ManagerState>,
    driver: Mutex<Option<Driver>>,
}

impl HealthCheckManager {
    pub fn new(settings: CheckSettings) -> Self {
        let settings = CheckSettings {
            interval: if settings.interval.is_zero() {
                constants::DEFAULT_HEALTH_CHECK_INTERVAL
            } else {
                settings.interval
            },
            max_concurrent_checks: settings.max_concurrent_checks.max(1),
            ..settings
        };
        Self {
            state: Arc::new(ManagerState {
                settings,
                plugins: RwLock::new(HashMap::new()),
                results: RwLock::new(HashMap::new()),
            }),
            driver: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        constants::HEALTH_MANAGER_COMPONENT_NAME
    }

    pub fn settings(&self) -> CheckSettings {
        self.state.settings
    }

    /// Add a plugin to the polling set, replacing any previous checker under
    /// the same name.
    pub async fn register_plugin(&self, name: impl Into<String>, checker: Arc<dyn HealthCheck>) {
        let name = name.into();
        self.state.plugins.write().await.insert(name.clone(), checker);
        log::info!("Registered plugin '{}' for health checking", name);
    }

    /// Remove a plugin and its last result. Returns whether it was registered.
    pub async fn unregister_plugin(&self, name: &str) -> bool {
        let mut plugins = self.state.plugins.write().await;
        let removed = plugins.remove(name).is_some();
        self.state.results.write().await.remove(name);
        drop(plugins);
        if removed {
            log::info!("Unregistered plugin '{}' from health checking", name);
        }
        removed
    }

    pub async fn registered_plugins(&self) -> Vec<String> {
        self.state.plugins.read().await.keys().cloned().collect()
    }

    /// Start periodic polling: one pass now, then one per interval, until
    /// `parent` is cancelled or [`stop`](Self::stop) is called.
    ///
    /// Every call derives a fresh child token, so a stopped or cancelled
    /// manager can be started again.
    pub async fn start(&self, parent: &CancellationToken) -> Result<()> {
        let mut driver = self.driver.lock().await;
        if driver.as_ref().is_some_and(Driver::is_active) {
            return Err(HealthError::AlreadyRunning);
        }

        let token = parent.child_token();
        let state = Arc::clone(&self.state);
        log::info!(
            "Starting health check manager (interval: {:?}, timeout: {:?})",
            state.settings.interval,
            state.settings.check_timeout
        );
        let handle = tokio::spawn(poll_loop(state, token.clone()));
        *driver = Some(Driver { token, handle });
        Ok(())
    }

    /// Halt polling and wait for the driver to exit. A pass already under
    /// way finishes first, bounded by the check timeout.
    pub async fn stop(&self) -> Result<()> {
        let driver = self.driver.lock().await.take();
        let Some(driver) = driver else {
            return Err(HealthError::NotRunning);
        };
        let was_running = driver.is_active();
        let Driver { token, handle } = driver;
        token.cancel();
        if let Err(e) = handle.await {
            log::error!("Health check loop terminated abnormally: {}", e);
        }
        if !was_running {
            return Err(HealthError::NotRunning);
        }
        log::info!("Stopped health check manager");
        Ok(())
    }

    /// Whether the polling task is alive.
    pub async fn is_running(&self) -> bool {
        self.driver
            .lock()
            .await
            .as_ref()
            .is_some_and(Driver::is_active)
    }

    /// Run one full pass over every registered plugin and wait for it.
    pub async fn check_now(&self) {
        run_pass(&self.state).await;
    }

    pub async fn get_health_status(&self, name: &str) -> Option<HealthCheckResult> {
        self.state.results.read().await.get(name).cloned()
    }

    pub async fn get_all_health_status(&self) -> HashMap<String, HealthCheckResult> {
        self.state.results.read().await.clone()
    }

    /// Aggregate verdict over the current results.
    pub async fn get_overall_health_status(&self) -> HealthCheckResult {
        let results = self.state.results.read().await;
        aggregate(&results)
    }

    /// Snapshot suitable for serving, optionally with per-plugin entries.
    pub async fn report(&self, include_plugins: bool) -> HealthReport {
        let results = self.get_all_health_status().await;
        let overall = aggregate(&results);
        if include_plugins {
            HealthReport::new(overall, &results)
        } else {
            HealthReport::new(overall, &HashMap::new())
        }
    }
}

impl Default for HealthCheckManager {
    fn default() -> Self {
        Self::new(CheckSettings::default())
    }
}

/// Fold per-plugin results into one verdict.
///
/// No results gives `Unknown`; any `Unhealthy` wins; otherwise any
/// `Degraded`; otherwise `Healthy`. `Unknown` results only show in the counts.
pub fn aggregate(results: &HashMap<String, HealthCheckResult>) -> HealthCheckResult {
    if results.is_empty() {
        return HealthCheckResult::unknown("No plugins registered");
    }

    let (mut healthy, mut unhealthy, mut degraded, mut unknown) = (0usize, 0usize, 0usize, 0usize);
    for result in results.values() {
        match result.status {
            HealthStatus::Healthy => healthy += 1,
            HealthStatus::Unhealthy => unhealthy += 1,
            HealthStatus::Degraded => degraded += 1,
            HealthStatus::Unknown => unknown += 1,
        }
    }
    let total = results.len();

    let verdict = if unhealthy > 0 {
        HealthCheckResult::unhealthy(format!("{} of {} plugins are unhealthy", unhealthy, total))
    } else if degraded > 0 {
        HealthCheckResult::degraded(format!("{} of {} plugins are degraded", degraded, total))
    } else {
        HealthCheckResult::healthy(format!("All {} plugins are healthy", total))
    };

    verdict
        .with_detail("healthy_count", healthy)
        .with_detail("unhealthy_count", unhealthy)
        .with_detail("degraded_count", degraded)
        .with_detail("unknown_count", unknown)
        .with_detail("total_count", total)
}

async fn poll_loop(state: Arc<ManagerState>, token: CancellationToken) {
    let mut ticker = tokio::time::interval(state.settings.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                log::info!("Health check loop stopped");
                return;
            }
            // The first tick completes immediately.
            _ = ticker.tick() => run_pass(&state).await,
        }
    }
}

async fn run_pass(state: &Arc<ManagerState>) {
    let plugins: Vec<(String, Arc<dyn HealthCheck>)> = state
        .plugins
        .read()
        .await
        .iter()
        .map(|(name, checker)| (name.clone(), Arc::clone(checker)))
        .collect();
    if plugins.is_empty() {
        return;
    }

    let semaphore = Arc::new(Semaphore::new(state.settings.max_concurrent_checks));
    let mut tasks = JoinSet::new();
    for (name, checker) in plugins {
        let semaphore = Arc::clone(&semaphore);
        let state = Arc::clone(state);
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            let result = run_check(checker.as_ref(), state.settings.check_timeout).await;
            log_result(&name, &result);
            record(&state, &name, result).await;
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            log::error!("Health check task failed: {}", e);
        }
    }
}

/// Run one check under a deadline and a panic boundary.
async fn run_check(checker: &dyn HealthCheck, timeout: Duration) -> HealthCheckResult {
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, AssertUnwindSafe(checker.health_check()).catch_unwind()).await;
    let elapsed = started.elapsed();

    let mut result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => HealthCheckResult::unhealthy("Health check panicked")
            .with_detail("panic", panic_message(panic.as_ref())),
        Err(_) => HealthCheckResult::unhealthy(format!("Health check timed out after {:?}", timeout))
            .with_detail("timeout_ms", json!(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))),
    };
    result.duration = elapsed;
    result.last_checked = Utc::now();
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic reason".to_string()
    }
}

fn log_result(name: &str, result: &HealthCheckResult) {
    if result.status == HealthStatus::Healthy {
        log::debug!("Plugin '{}' health check passed in {:?}", name, result.duration);
    } else {
        log::warn!(
            "Plugin '{}' health check reported {}: {} ({:?})",
            name,
            result.status,
            result.message,
            result.duration
        );
    }
}

/// Store a result unless the plugin was unregistered while its check ran.
async fn record(state: &ManagerState, name: &str, result: HealthCheckResult) {
    let plugins = state.plugins.read().await;
    if plugins.contains_key(name) {
        state.results.write().await.insert(name.to_string(), result);
    }
}
