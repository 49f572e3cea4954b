use std::time::Duration;

use async_trait::async_trait;

use crate::health::types::{HealthCheckResult, HealthStatus};
use crate::kernel::constants::DEFAULT_HEALTH_CHECK_INTERVAL;

/// Optional capability of a plugin that can report its own health.
///
/// Callers may drop the returned future at any time (the manager does so when
/// a check exceeds its timeout), so implementations should not rely on
/// running to completion.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Run the check.
    async fn health_check(&self) -> HealthCheckResult;

    /// Suggested polling interval. Advisory only.
    fn health_check_interval(&self) -> Duration {
        DEFAULT_HEALTH_CHECK_INTERVAL
    }

    /// Fast-path yes/no answer.
    async fn is_healthy(&self) -> bool {
        self.health_check().await.status == HealthStatus::Healthy
    }
}
