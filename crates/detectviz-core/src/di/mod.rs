//! # Dependency Injection Container
//!
//! Capability-keyed factory registry that builds and caches service
//! instances, resolving their declared dependencies transitively.
//!
//! A capability is any `?Sized + Send + Sync + 'static` type, usually a trait
//! object such as `dyn Logger`. Instances are handed out as `Arc<T>`.
//!
//! - **[`container`]**: the [`Container`] itself and the [`Resolver`] that
//!   carries the in-progress resolution chain (used for cycle detection).
//! - **[`descriptor`]**: [`ServiceKey`], [`ServiceScope`] and the per-key
//!   [`ServiceDescriptor`].
//! - **[`dependencies`]**: the [`Dependencies`] tuple trait describing what a
//!   factory needs, and [`IntoInstance`] describing what it returns.
//! - **[`error`]**: [`DiError`].
//!
//! Factories have the shape `Fn(D) -> R` where `D` is `()` or a tuple of
//! `Arc<_>` capabilities and `R` is either `Arc<T>` or `Result<Arc<T>, E>`.
//! Anything else is rejected by the compiler at the registration call site.
pub mod container;
pub mod dependencies;
pub mod descriptor;
pub mod error;

pub use container::{Container, DuplicatePolicy, Resolver};
pub use dependencies::{Dependencies, IntoInstance};
pub use descriptor::{ServiceDescriptor, ServiceKey, ServiceScope};
pub use error::{DiError, Result};

// Test module declaration
#[cfg(test)]
mod tests;
