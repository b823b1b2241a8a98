//! Turns customizers into a started, ready DynamoDB Local container.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::ProvisionerConfig;
use crate::container::DynamoDbLocalContainer;
use crate::customizers::{apply_customizers, Customizer};
use crate::descriptor::LaunchDescriptor;
use crate::docker::DockerRuntime;
use crate::runtime::ContainerRuntime;
use crate::Error;

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod tests;

/// Provisions DynamoDB Local containers through a [`ContainerRuntime`].
///
/// The provisioner holds no state of its own beyond the runtime and configuration;
/// concurrent calls are independent unless they share a reuse name, in which case
/// the runtime resolves them to the same container.
#[derive(Clone)]
pub struct Provisioner {
    runtime: Arc<dyn ContainerRuntime>,
    config: ProvisionerConfig,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: ProvisionerConfig) -> Self {
        Self { runtime, config }
    }

    /// A provisioner backed by the local Docker engine, configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for invalid environment values and
    /// [`Error::Provisioning`] if the Docker engine cannot be reached.
    pub fn from_env() -> Result<Self, Error> {
        let config = ProvisionerConfig::from_env()?;
        let runtime = DockerRuntime::connect(&config).map_err(Error::Provisioning)?;
        Ok(Self::new(Arc::new(runtime), config))
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Builds the launch descriptor for `customizers` without starting anything.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by a customizer, unchanged, and
    /// [`Error::Customization`] if the result asks for reuse without a container name.
    pub fn descriptor(&self, customizers: &[Customizer]) -> Result<LaunchDescriptor, Error> {
        let mut descriptor = LaunchDescriptor::default();
        apply_customizers(&mut descriptor, customizers)?;

        if descriptor.reuse && descriptor.name.is_none() {
            return Err(Error::Customization(
                "reuse requires a container name".to_string(),
            ));
        }

        Ok(descriptor)
    }

    /// Starts a container and waits until it is ready.
    ///
    /// # Errors
    ///
    /// See [`Provisioner::run_with_cancellation`].
    pub async fn run(&self, customizers: &[Customizer]) -> Result<DynamoDbLocalContainer, Error> {
        self.run_with_cancellation(CancellationToken::new(), customizers)
            .await
    }

    /// Starts a container and waits until it is ready, unless `cancel` fires first.
    ///
    /// A container that was already created when cancellation or a timeout happened is
    /// left running; the caller owns its cleanup.
    ///
    /// # Errors
    ///
    /// - [`Error::Customization`] (or any other error a customizer returns) before
    ///   anything is created.
    /// - [`Error::Provisioning`] if the runtime fails to create or start the container.
    /// - [`Error::ReadinessTimeout`] if the wait strategy is not met within
    ///   `startup_timeout`.
    /// - [`Error::Readiness`] if the readiness probe fails outright.
    /// - [`Error::Cancelled`] if `cancel` fires during start or the readiness wait.
    #[instrument(skip(self, cancel, customizers), fields(customizer_count = customizers.len()))]
    pub async fn run_with_cancellation(
        &self,
        cancel: CancellationToken,
        customizers: &[Customizer],
    ) -> Result<DynamoDbLocalContainer, Error> {
        let descriptor = self.descriptor(customizers)?;

        info!(
            image = %descriptor.image,
            cmd = ?descriptor.command,
            reuse = descriptor.reuse,
            name = ?descriptor.name,
            "Provisioning DynamoDB Local container"
        );

        let id = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = self.runtime.create_and_start(&descriptor) => {
                result.map_err(|e| {
                    error!(error = %e, "Failed to create or start container");
                    Error::Provisioning(e)
                })?
            }
        };

        let wait = tokio::time::timeout(
            self.config.startup_timeout,
            self.runtime
                .wait_until_ready(&id, &descriptor.wait_strategy),
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(container_id = %id, "Provisioning cancelled during readiness wait");
                return Err(Error::Cancelled);
            }
            outcome = wait => match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(container_id = %id, error = %e, "Readiness check failed");
                    return Err(Error::Readiness(e));
                }
                Err(_) => {
                    error!(
                        container_id = %id,
                        timeout = ?self.config.startup_timeout,
                        "Container was not ready in time"
                    );
                    return Err(Error::ReadinessTimeout {
                        container_id: id.to_string(),
                        timeout: self.config.startup_timeout,
                    });
                }
            }
        }

        info!(container_id = %id, "DynamoDB Local container is ready");
        Ok(DynamoDbLocalContainer::new(
            id,
            self.runtime.clone(),
            self.config.region.clone(),
        ))
    }
}

/// Starts DynamoDB Local on the local Docker engine.
///
/// Shorthand for [`Provisioner::from_env`] followed by [`Provisioner::run`].
///
/// ```rust,no_run
/// use dynamodb_local::{run_container, with_shared_db, with_telemetry_disabled};
///
/// # async fn example() -> Result<(), dynamodb_local::Error> {
/// let container = run_container(&[with_telemetry_disabled(), with_shared_db()]).await?;
/// let client = container.build_client().await?;
/// let _tables = client.list_tables().send().await;
/// container.terminate().await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Any error from [`Provisioner::from_env`] or [`Provisioner::run`].
pub async fn run_container(customizers: &[Customizer]) -> Result<DynamoDbLocalContainer, Error> {
    Provisioner::from_env()?.run(customizers).await
}
