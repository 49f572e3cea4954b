//! # Dependency Injection Errors
//!
//! [`DiError`] covers registration failures (duplicate capability) and
//! resolution failures (unregistered capability, failing factory, failing
//! nested dependency, cyclic graph).
use std::error::Error as StdError;

/// Boxed error returned by fallible factories.
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum DiError {
    #[error("service of type {service} is not registered")]
    NotRegistered { service: &'static str },

    #[error("service of type {service} is already registered")]
    AlreadyRegistered { service: &'static str },

    #[error("failed to resolve parameter {index} of type {parameter} for {service}: {source}")]
    DependencyResolution {
        service: &'static str,
        index: usize,
        parameter: &'static str,
        #[source]
        source: Box<DiError>,
    },

    #[error("factory for {service} failed: {source}")]
    FactoryFailed {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("cyclic dependency detected: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<&'static str> },

    #[error("stored instance for {service} does not have the registered type")]
    InstanceTypeMismatch { service: &'static str },
}

impl DiError {
    /// Follows nested [`DiError::DependencyResolution`] wrappers down to the
    /// error that actually stopped resolution.
    pub fn root_cause(&self) -> &DiError {
        let mut current = self;
        while let DiError::DependencyResolution { source, .. } = current {
            current = source;
        }
        current
    }
}

pub type Result<T> = std::result::Result<T, DiError>;
