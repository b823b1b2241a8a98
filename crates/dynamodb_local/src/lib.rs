//! Crate for running DynamoDB Local as a disposable test fixture.
//!
//! The crate starts an `amazon/dynamodb-local` container, waits until its service port
//! accepts connections, and hands back a [`DynamoDbLocalContainer`] that resolves the
//! dynamically mapped endpoint and builds `aws-sdk-dynamodb` clients pointed at it.
//!
//! Container behaviour is shaped by [`Customizer`]s, applied in order to a default
//! [`LaunchDescriptor`]:
//!
//! ```rust,no_run
//! use dynamodb_local::{run_container, with_shared_db, with_telemetry_disabled};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let container = run_container(&[with_telemetry_disabled(), with_shared_db()]).await?;
//!
//! println!("DynamoDB Local at {}", container.connection_string().await?);
//! let client = container.build_client().await?;
//! let tables = client.list_tables().send().await?;
//! println!("tables: {:?}", tables.table_names());
//!
//! container.terminate().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The container engine is reached through the [`ContainerRuntime`] trait; the Docker
//! implementation is [`DockerRuntime`].

pub mod config;
pub mod container;
pub mod customizers;
pub mod descriptor;
pub mod docker;
pub mod endpoint;
pub mod errors;
pub mod provisioner;
pub mod runtime;

pub use config::ProvisionerConfig;
pub use container::DynamoDbLocalContainer;
pub use customizers::{
    apply_customizers, with_image, with_in_memory, with_shared_db, with_telemetry_disabled,
    Customizer,
};
pub use descriptor::{ContainerPort, LaunchDescriptor, WaitStrategy};
pub use docker::DockerRuntime;
pub use endpoint::LocalEndpointResolver;
pub use errors::{Error, RuntimeError};
pub use provisioner::{run_container, Provisioner};
pub use runtime::{ContainerId, ContainerRuntime, ContainerState};

pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod test_support;
