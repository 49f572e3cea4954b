//! # Kernel
//!
//! Bootstrap and shared definitions of the plugin runtime.
//!
//! - **Bootstrapping**: [`Platform`](bootstrap::Platform) wires the
//!   container, plugin registry and health manager together and drives
//!   plugins through `init`, `start` and `stop` in order.
//! - **Constants**: names, defaults and component identifiers in
//!   [`constants`].
//! - **Errors**: the aggregate [`Error`](error::Error) and `Result` alias.
pub mod bootstrap;
pub mod constants;
pub mod error;

pub use bootstrap::Platform;
pub use error::{Error, LifecyclePhase, Result};
// Test module declaration
#[cfg(test)]
mod tests;
