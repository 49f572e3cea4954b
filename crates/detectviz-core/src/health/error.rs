use thiserror::Error;

/// Failures of the health check manager itself. Failing checks are reported
/// as results, never as errors.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("Health check manager already started")]
    AlreadyRunning,

    #[error("Health check manager not started")]
    NotRunning,
}

pub type Result<T> = std::result::Result<T, HealthError>;
