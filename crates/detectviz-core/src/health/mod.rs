//! # Health
//!
//! Periodic health polling of plugins that expose the [`HealthCheck`]
//! capability, and aggregation of their results into one verdict.
//!
//! - **[`types`]**: [`HealthStatus`] and [`HealthCheckResult`].
//! - **[`checker`]**: the [`HealthCheck`] trait.
//! - **[`manager`]**: [`HealthCheckManager`], which runs one bounded,
//!   panic-isolated check per plugin on every tick and keeps the last result.
//! - **[`report`]**: [`HealthReport`], the JSON shape served to outer layers.
//! - **[`error`]**: [`HealthError`].
pub mod checker;
pub mod error;
pub mod manager;
pub mod report;
pub mod types;

pub use checker::HealthCheck;
pub use error::HealthError;
pub use manager::{CheckSettings, HealthCheckManager, aggregate};
pub use report::{HealthReport, PluginHealth};
pub use types::{HealthCheckResult, HealthStatus};
