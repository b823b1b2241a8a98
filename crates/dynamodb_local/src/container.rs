//! Handle to a running DynamoDB Local container.

use std::sync::Arc;

use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info, instrument};

use crate::descriptor::SERVICE_PORT;
use crate::endpoint::{join_host_port, LocalEndpointResolver};
use crate::runtime::{ContainerId, ContainerRuntime, ContainerState};
use crate::Error;

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;

/// Placeholder access key accepted by DynamoDB Local.
pub const ACCESS_KEY_ID: &str = "DUMMYIDEXAMPLE";

/// Placeholder secret key accepted by DynamoDB Local.
pub const SECRET_ACCESS_KEY: &str = "DUMMYEXAMPLEKEY";

const CREDENTIALS_PROVIDER_NAME: &str = "dynamodb_local";

/// A started DynamoDB Local container.
///
/// The handle caches nothing: host, port and state are looked up through the runtime
/// on every call. Dropping the handle leaves the container running; call
/// [`DynamoDbLocalContainer::terminate`] to remove it.
#[derive(Clone)]
pub struct DynamoDbLocalContainer {
    id: ContainerId,
    runtime: Arc<dyn ContainerRuntime>,
    region: String,
}

impl std::fmt::Debug for DynamoDbLocalContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbLocalContainer")
            .field("id", &self.id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl DynamoDbLocalContainer {
    pub fn new(id: ContainerId, runtime: Arc<dyn ContainerRuntime>, region: String) -> Self {
        Self {
            id,
            runtime,
            region,
        }
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Returns the endpoint in `<host>:<port>` form, with IPv6 hosts in brackets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the container is not running, its service port
    /// is not mapped, or the host cannot be determined.
    pub async fn connection_string(&self) -> Result<String, Error> {
        let port = self
            .runtime
            .mapped_port(&self.id, SERVICE_PORT)
            .await
            .map_err(Error::Resolution)?;
        let host = self.runtime.host(&self.id).await.map_err(Error::Resolution)?;

        Ok(join_host_port(&host, port))
    }

    /// Returns the host port mapped to the service port, or an empty string if it
    /// cannot be determined.
    ///
    /// Meant for log and diagnostic output only. Use
    /// [`DynamoDbLocalContainer::connection_string`] where a failure must be noticed.
    pub async fn mapped_port(&self) -> String {
        match self.runtime.mapped_port(&self.id, SERVICE_PORT).await {
            Ok(port) => port.to_string(),
            Err(e) => {
                debug!(container_id = %self.id, error = %e, "Mapped port unavailable");
                String::new()
            }
        }
    }

    /// Builds a DynamoDB client whose every request goes to this container.
    ///
    /// The client uses placeholder static credentials and the configured region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the connection string cannot be resolved and
    /// [`Error::ClientConstruction`] if the endpoint is invalid.
    #[instrument(skip(self), fields(container_id = %self.id))]
    pub async fn build_client(&self) -> Result<Client, Error> {
        let host_and_port = self.connection_string().await?;
        let resolver = LocalEndpointResolver::new(&host_and_port)?;

        let credentials = Credentials::new(
            ACCESS_KEY_ID,
            SECRET_ACCESS_KEY,
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .endpoint_resolver(resolver)
            .build();

        info!(endpoint = %host_and_port, region = %self.region, "Built DynamoDB client");
        Ok(Client::from_conf(config))
    }

    /// Reports the current container state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the runtime cannot report the state.
    pub async fn state(&self) -> Result<ContainerState, Error> {
        self.runtime.state(&self.id).await.map_err(Error::Resolution)
    }

    /// Stops and removes the container.
    ///
    /// For shared containers this removes the instance other test runs would reuse.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Termination`] if the runtime fails to stop or remove it.
    #[instrument(skip(self), fields(container_id = %self.id))]
    pub async fn terminate(&self) -> Result<(), Error> {
        self.runtime
            .terminate(&self.id)
            .await
            .map_err(Error::Termination)
    }
}
