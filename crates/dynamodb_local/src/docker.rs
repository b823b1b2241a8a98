//! [`ContainerRuntime`] implementation backed by the Docker Engine API.
//!
//! Talks to the engine through `bollard`. Exposed ports are published on random host
//! ports, so the mapping is only known after the container starts and must be looked
//! up through [`ContainerRuntime::mapped_port`].

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerInspectResponse, ContainerSummary, HostConfig, PortMap};
use bollard::Docker;
use futures_util::stream::StreamExt;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ProvisionerConfig;
use crate::descriptor::{ContainerPort, LaunchDescriptor, WaitStrategy};
use crate::errors::RuntimeError;
use crate::runtime::{ContainerId, ContainerRuntime, ContainerState};

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;

/// Label attached to every container created by this crate.
pub const MANAGED_LABEL: &str = "dynamodb_local.managed";

const STOP_TIMEOUT_SECS: i64 = 5;

// A published port accepts connections through the engine's proxy before the
// service inside listens; the proxy then closes the connection straight away.
const PROBE_READ_WINDOW: Duration = Duration::from_millis(200);

/// A container runtime that drives a Docker engine.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
    host_override: Option<String>,
    poll_interval: Duration,
}

impl DockerRuntime {
    /// Connects to the local Docker engine, honouring `DOCKER_HOST`.
    ///
    /// # Errors
    ///
    /// Returns a [`RuntimeError`] if no connection to the engine can be set up.
    pub fn connect(config: &ProvisionerConfig) -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::with_source("Failed to connect to Docker daemon", e))?;

        Ok(Self::with_client(docker, config))
    }

    /// Wraps an existing engine client.
    pub fn with_client(docker: Docker, config: &ProvisionerConfig) -> Self {
        Self {
            docker,
            host_override: config.host_override.clone(),
            poll_interval: config.poll_interval,
        }
    }

    async fn inspect(&self, id: &ContainerId) -> Result<ContainerInspectResponse, RuntimeError> {
        self.docker
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| RuntimeError::with_source(format!("Failed to inspect container {id}"), e))
    }

    /// Pulls `image` unless the engine already has it.
    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.docker.inspect_image(image).await.is_ok() {
            debug!(image = image, "Image already present");
            return Ok(());
        }

        info!(image = image, "Pulling image");
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            let progress = progress
                .map_err(|e| RuntimeError::with_source(format!("Failed to pull image {image}"), e))?;
            if let Some(status) = progress.status {
                debug!(image = image, status = %status, "Pull progress");
            }
        }

        info!(image = image, "Image pulled");
        Ok(())
    }

    /// Looks up a container by exact name, including stopped ones.
    ///
    /// The engine's name filter is a regular expression, so its matches are narrowed
    /// to exact names here.
    async fn find_by_name(&self, name: &str) -> Result<Option<(ContainerId, bool)>, RuntimeError> {
        let filters = HashMap::from([("name".to_string(), vec![name.to_string()])]);
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                filters,
                ..Default::default()
            }))
            .await
            .map_err(|e| {
                RuntimeError::with_source(format!("Failed to look up container named {name}"), e)
            })?;

        Ok(containers
            .into_iter()
            .filter(|summary| has_exact_name(summary, name))
            .find_map(|summary| {
                let running = summary.state.as_deref() == Some("running");
                summary.id.map(|id| (ContainerId::new(id), running))
            }))
    }

    /// Starts `id` if it is not running and returns it.
    async fn adopt(&self, id: ContainerId, running: bool) -> Result<ContainerId, RuntimeError> {
        if running {
            info!(container_id = %id, "Reusing running container");
        } else {
            info!(container_id = %id, "Starting stopped container for reuse");
            self.start(&id).await?;
        }
        Ok(id)
    }

    async fn start(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        self.docker
            .start_container(id.as_str(), None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| RuntimeError::with_source(format!("Failed to start container {id}"), e))
    }

    /// Makes one connection attempt against the mapped port of `port`.
    async fn probe_listening_port(
        &self,
        id: &ContainerId,
        port: ContainerPort,
    ) -> Result<bool, RuntimeError> {
        let state = self.state(id).await?;
        if !state.running {
            return Err(RuntimeError::new(format!(
                "Container {id} stopped while waiting for port {port} (status: {}, exit code: {:?})",
                state.status, state.exit_code
            )));
        }

        let host_port = match self.mapped_port(id, port).await {
            Ok(host_port) => host_port,
            Err(e) => {
                debug!(container_id = %id, error = %e, "Port not mapped yet");
                return Ok(false);
            }
        };
        let host = self.host(id).await?;

        let mut stream = match TcpStream::connect((host.as_str(), host_port)).await {
            Ok(stream) => stream,
            Err(e) => {
                debug!(host = %host, port = host_port, error = %e, "Port not accepting connections");
                return Ok(false);
            }
        };

        let mut buf = [0u8; 1];
        match timeout(PROBE_READ_WINDOW, stream.read(&mut buf)).await {
            // Nothing to read and the connection stayed open: something is listening.
            Err(_) => Ok(true),
            Ok(Ok(0)) | Ok(Err(_)) => Ok(false),
            Ok(Ok(_)) => Ok(true),
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    #[instrument(skip(self, descriptor), fields(image = %descriptor.image, reuse = descriptor.reuse))]
    async fn create_and_start(
        &self,
        descriptor: &LaunchDescriptor,
    ) -> Result<ContainerId, RuntimeError> {
        let reuse_name = if descriptor.reuse {
            let name = descriptor.name.as_deref().ok_or_else(|| {
                RuntimeError::new("Container reuse requires a container name")
            })?;
            if let Some((id, running)) = self.find_by_name(name).await? {
                return self.adopt(id, running).await;
            }
            Some(name)
        } else {
            None
        };

        self.ensure_image(&descriptor.image).await?;

        let options = descriptor.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });

        let created = match self
            .docker
            .create_container(options, container_config(descriptor))
            .await
        {
            Ok(created) => created,
            // Another caller created the shared container between lookup and create.
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 409, ..
            }) if reuse_name.is_some() => {
                let name = reuse_name.unwrap_or_default();
                warn!(name = name, "Container name taken concurrently, adopting it");
                return match self.find_by_name(name).await? {
                    Some((id, running)) => self.adopt(id, running).await,
                    None => Err(RuntimeError::new(format!(
                        "Container named {name} conflicted on create but could not be found"
                    ))),
                };
            }
            Err(e) => return Err(RuntimeError::with_source("Failed to create container", e)),
        };

        for warning in &created.warnings {
            warn!(warning = %warning, "Docker reported a warning on create");
        }

        let id = ContainerId::new(created.id);
        self.start(&id).await?;
        info!(container_id = %id, "Container started");

        Ok(id)
    }

    async fn host(&self, _id: &ContainerId) -> Result<String, RuntimeError> {
        if let Some(host) = &self.host_override {
            return Ok(unbracket(host).to_string());
        }
        Ok(resolve_host(env::var("DOCKER_HOST").ok().as_deref()))
    }

    async fn mapped_port(
        &self,
        id: &ContainerId,
        port: ContainerPort,
    ) -> Result<u16, RuntimeError> {
        let response = self.inspect(id).await?;

        let state = container_state(&response);
        if !state.running {
            return Err(RuntimeError::new(format!(
                "Container {id} is not running (status: {})",
                state.status
            )));
        }

        response
            .network_settings
            .as_ref()
            .and_then(|settings| settings.ports.as_ref())
            .and_then(|ports| host_port_for(ports, port))
            .ok_or_else(|| RuntimeError::new(format!("Port {port} of container {id} is not mapped")))
    }

    #[instrument(skip(self), fields(container_id = %id))]
    async fn wait_until_ready(
        &self,
        id: &ContainerId,
        strategy: &WaitStrategy,
    ) -> Result<(), RuntimeError> {
        match strategy {
            WaitStrategy::ListeningPort(port) => loop {
                if self.probe_listening_port(id, *port).await? {
                    info!(port = %port, "Port is accepting connections");
                    return Ok(());
                }
                sleep(self.poll_interval).await;
            },
        }
    }

    #[instrument(skip(self), fields(container_id = %id))]
    async fn terminate(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        info!("Stopping container");

        self.docker
            .stop_container(id.as_str(), Some(StopContainerOptions { t: STOP_TIMEOUT_SECS }))
            .await
            .map_err(|e| RuntimeError::with_source(format!("Failed to stop container {id}"), e))?;

        self.docker
            .remove_container(
                id.as_str(),
                Some(RemoveContainerOptions {
                    force: true,
                    v: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| RuntimeError::with_source(format!("Failed to remove container {id}"), e))?;

        info!("Container stopped and removed");
        Ok(())
    }

    async fn state(&self, id: &ContainerId) -> Result<ContainerState, RuntimeError> {
        let response = self.inspect(id).await?;
        Ok(container_state(&response))
    }
}

/// Builds the engine configuration for `descriptor`.
///
/// An empty command leaves the image's default command in place.
fn container_config(descriptor: &LaunchDescriptor) -> Config<String> {
    let exposed_ports: HashMap<String, HashMap<(), ()>> = descriptor
        .exposed_ports
        .iter()
        .map(|port| (port.to_string(), HashMap::new()))
        .collect();

    Config {
        image: Some(descriptor.image.clone()),
        cmd: (!descriptor.command.is_empty()).then(|| descriptor.command.clone()),
        exposed_ports: Some(exposed_ports),
        labels: Some(HashMap::from([(
            MANAGED_LABEL.to_string(),
            "true".to_string(),
        )])),
        host_config: Some(HostConfig {
            publish_all_ports: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Picks the first usable host port bound to `port`.
fn host_port_for(ports: &PortMap, port: ContainerPort) -> Option<u16> {
    ports
        .get(&port.to_string())?
        .as_ref()?
        .iter()
        .filter_map(|binding| binding.host_port.as_deref())
        .find_map(|host_port| host_port.parse::<u16>().ok().filter(|p| *p != 0))
}

fn container_state(response: &ContainerInspectResponse) -> ContainerState {
    match &response.state {
        Some(state) => ContainerState {
            running: state.running.unwrap_or(false),
            status: state
                .status
                .as_ref()
                .map(|status| status.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            exit_code: state.exit_code,
        },
        None => ContainerState {
            running: false,
            status: "unknown".to_string(),
            exit_code: None,
        },
    }
}

/// Derives the host that published ports are reachable on from a `DOCKER_HOST` value.
///
/// Remote engines (`tcp://`, `http://`, `https://`) publish on their own address;
/// local sockets publish on `localhost`.
fn resolve_host(docker_host: Option<&str>) -> String {
    docker_host
        .and_then(|raw| Url::parse(raw).ok())
        .filter(|url| matches!(url.scheme(), "tcp" | "http" | "https"))
        .and_then(|url| url.host_str().map(|host| unbracket(host).to_string()))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Returns `true` if the engine lists `summary` under exactly `name`.
fn has_exact_name(summary: &ContainerSummary, name: &str) -> bool {
    let expected = format!("/{name}");
    summary
        .names
        .as_ref()
        .is_some_and(|names| names.iter().any(|candidate| *candidate == expected))
}

/// Strips the brackets from an IPv6 literal such as `[::1]`.
fn unbracket(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|host| host.strip_suffix(']'))
        .unwrap_or(host)
}
