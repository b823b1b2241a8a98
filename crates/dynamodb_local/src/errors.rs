//! Error types for DynamoDB Local fixture operations.
//!
//! Two layers exist. [`RuntimeError`] is what a [`ContainerRuntime`](crate::ContainerRuntime)
//! implementation reports back to the core. [`Error`] is what callers of this crate see;
//! it classifies each runtime failure by the phase in which it happened so that test code
//! can tell a broken Docker setup apart from a container that simply never became ready.

use std::time::Duration;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Boxed error used as the source of a [`RuntimeError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure reported by the container runtime.
///
/// The message describes the runtime operation that failed. The underlying engine
/// error, if any, is kept as the error source.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RuntimeError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl RuntimeError {
    /// Creates a runtime error without an underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a runtime error wrapping the engine error that caused it.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The description of the failed runtime operation.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that can occur while provisioning or using a DynamoDB Local container.
///
/// Nothing in this crate retries. Every variant is returned to the immediate caller
/// unchanged; callers that need resilience retry at their own layer.
///
/// ## Examples
///
/// ```rust,ignore
/// use dynamodb_local::{run_container, with_shared_db, Error};
///
/// match run_container(&[with_shared_db()]).await {
///     Ok(container) => println!("ready at {}", container.connection_string().await?),
///     Err(Error::ReadinessTimeout { timeout, .. }) => eprintln!("not ready after {timeout:?}"),
///     Err(err) => eprintln!("failed to start DynamoDB Local: {err}"),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A customizer rejected the launch descriptor.
    ///
    /// Provisioning stops before any container is created.
    #[error("Customization rejected the launch descriptor: {0}")]
    Customization(String),

    /// The container runtime failed to create or start the container.
    #[error("Failed to provision container: {0}")]
    Provisioning(#[source] RuntimeError),

    /// The container did not satisfy its wait strategy within the startup timeout.
    ///
    /// The container is left in place; call `terminate` to remove it.
    #[error("Container {container_id} was not ready within {timeout:?}")]
    ReadinessTimeout {
        container_id: String,
        timeout: Duration,
    },

    /// The readiness probe failed outright, for example because the container exited.
    #[error("Container failed its readiness check: {0}")]
    Readiness(#[source] RuntimeError),

    /// The caller cancelled provisioning before the container became ready.
    #[error("Provisioning was cancelled")]
    Cancelled,

    /// Host, port or state lookup failed for a container believed to be running.
    #[error("Failed to resolve container connection details: {0}")]
    Resolution(#[source] RuntimeError),

    /// Stopping or removing the container failed.
    #[error("Failed to terminate container: {0}")]
    Termination(#[source] RuntimeError),

    /// The DynamoDB client, or its endpoint, could not be constructed.
    #[error("Failed to build DynamoDB client: {0}")]
    ClientConstruction(String),

    /// A configuration value taken from the environment is invalid.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}
