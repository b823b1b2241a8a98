//! The launch descriptor: a declarative record of the container to run.
//!
//! A [`LaunchDescriptor`] starts out as [`LaunchDescriptor::default`], which runs the
//! reference DynamoDB Local image with its stock command line, and is then shaped by
//! customizers before it is handed to the container runtime verbatim.

use std::collections::BTreeSet;
use std::fmt;

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;

/// Image used when no image override is supplied.
pub const DEFAULT_IMAGE: &str = "amazon/dynamodb-local:2.2.1";

/// Port DynamoDB Local listens on inside the container.
pub const SERVICE_PORT: ContainerPort = ContainerPort::tcp(8000);

/// Container name used for shared, reusable instances.
pub const SHARED_CONTAINER_NAME: &str = "dynamodb_local";

/// Tokens that start the DynamoDB Local service inside the container.
pub const BASE_INVOCATION: [&str; 2] = ["-jar", "DynamoDBLocal.jar"];

/// Transport protocol of a container port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// A port inside the container, such as `8000/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerPort {
    port: u16,
    protocol: Protocol,
}

impl ContainerPort {
    /// A TCP port.
    pub const fn tcp(port: u16) -> Self {
        Self {
            port,
            protocol: Protocol::Tcp,
        }
    }

    /// A UDP port.
    pub const fn udp(port: u16) -> Self {
        Self {
            port,
            protocol: Protocol::Udp,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

/// Formats the port in Docker notation, e.g. `8000/tcp`.
impl fmt::Display for ContainerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol.as_str())
    }
}

/// What "ready" means for a started container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStrategy {
    /// The host port mapped to the given container port accepts TCP connections.
    ListeningPort(ContainerPort),
}

/// Declarative description of the container to launch.
///
/// # Invariants
///
/// - The base invocation (`-jar DynamoDBLocal.jar`) appears at most once in `command`,
///   and every flag added through [`LaunchDescriptor::push_flag`] follows it.
/// - When `reuse` is set, `name` holds a stable value so repeated provisioning finds
///   the same container instead of creating a second one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDescriptor {
    /// Image reference, `name:tag`.
    pub image: String,

    /// Arguments passed to the image entrypoint, in order.
    pub command: Vec<String>,

    /// Container ports to publish on random host ports.
    pub exposed_ports: BTreeSet<ContainerPort>,

    /// Readiness policy applied after the container starts.
    pub wait_strategy: WaitStrategy,

    /// Find-or-create by `name` instead of always creating a new container.
    pub reuse: bool,

    /// Container name. Required when `reuse` is set.
    pub name: Option<String>,
}

impl Default for LaunchDescriptor {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            command: Vec::new(),
            exposed_ports: BTreeSet::from([SERVICE_PORT]),
            wait_strategy: WaitStrategy::ListeningPort(SERVICE_PORT),
            reuse: false,
            name: None,
        }
    }
}

impl LaunchDescriptor {
    /// Returns `true` if the base invocation is already part of the command.
    ///
    /// The check looks for the invocation itself rather than for a non-empty command,
    /// so tokens placed ahead of it do not suppress seeding.
    pub fn has_base_invocation(&self) -> bool {
        self.base_invocation_position().is_some()
    }

    fn base_invocation_position(&self) -> Option<usize> {
        self.command
            .windows(BASE_INVOCATION.len())
            .position(|window| window.iter().zip(BASE_INVOCATION).all(|(a, b)| a == b))
    }

    /// Appends the base invocation unless it is already present.
    pub fn ensure_base_invocation(&mut self) {
        if !self.has_base_invocation() {
            self.command
                .extend(BASE_INVOCATION.iter().map(|token| token.to_string()));
        }
    }

    /// Appends a service flag after the base invocation.
    ///
    /// Seeds the base invocation first if needed. A flag already present after the
    /// invocation is left alone, so applying the same customizer twice changes nothing.
    /// Copies of the flag ahead of the invocation are passed to the JVM, not to the
    /// service, and do not count.
    pub fn push_flag(&mut self, flag: &str) {
        self.ensure_base_invocation();
        let service_args = self
            .base_invocation_position()
            .map_or(0, |position| position + BASE_INVOCATION.len());
        if !self.command[service_args..].iter().any(|token| token == flag) {
            self.command.push(flag.to_string());
        }
    }
}
