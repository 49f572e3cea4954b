//! # Plugin System
//!
//! The uniform lifecycle contract every managed component satisfies, and the
//! name-keyed registry that holds constructed instances.
//!
//! - **[`traits`]**: the [`Plugin`] trait (`name`, `init`, `start`, `stop`)
//!   and [`PluginConfig`].
//! - **[`lifecycle`]**: [`PluginState`] and the [`LifecycleState`] tracker
//!   that enforces `Uninitialized -> Initialized -> Running -> Stopped`.
//! - **[`registry`]**: [`PluginRegistry`], a concurrency-safe name to
//!   instance store with per-entry metadata.
//! - **[`error`]**: [`PluginSystemError`].
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod traits;

pub use error::PluginSystemError;
pub use lifecycle::{LifecycleState, PluginState};
pub use registry::{PluginMetadata, PluginRegistry};
pub use traits::{Plugin, PluginConfig};
