//! The container runtime interface consumed by the provisioner and container handle.
//!
//! Everything that touches a real container engine sits behind [`ContainerRuntime`].
//! The crate ships a Docker implementation in [`crate::docker`]; tests substitute their own.

use std::fmt;

use async_trait::async_trait;

use crate::descriptor::{ContainerPort, LaunchDescriptor, WaitStrategy};
use crate::errors::RuntimeError;

/// Engine-assigned identity of a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Container state as last reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    /// Whether the container's main process is running.
    pub running: bool,

    /// Engine status string, e.g. `running` or `exited`.
    pub status: String,

    /// Exit code of the main process once it has stopped.
    pub exit_code: Option<i64>,
}

/// Operations the fixture needs from a container engine.
///
/// Implementations must treat `create_and_start` on a descriptor with `reuse` set as
/// find-or-create by the descriptor's name. All lookups are live; implementations
/// should not cache host or port values.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Creates and starts a container for `descriptor`, or finds the existing one when
    /// the descriptor asks for reuse.
    async fn create_and_start(
        &self,
        descriptor: &LaunchDescriptor,
    ) -> Result<ContainerId, RuntimeError>;

    /// Host name or address at which mapped ports are reachable.
    async fn host(&self, id: &ContainerId) -> Result<String, RuntimeError>;

    /// Host port currently mapped to `port` inside the container.
    async fn mapped_port(&self, id: &ContainerId, port: ContainerPort)
        -> Result<u16, RuntimeError>;

    /// Completes once `strategy` is satisfied.
    ///
    /// Implementations may wait indefinitely; the caller bounds the wait.
    async fn wait_until_ready(
        &self,
        id: &ContainerId,
        strategy: &WaitStrategy,
    ) -> Result<(), RuntimeError>;

    /// Stops and removes the container.
    async fn terminate(&self, id: &ContainerId) -> Result<(), RuntimeError>;

    /// Reports the current state of the container.
    async fn state(&self, id: &ContainerId) -> Result<ContainerState, RuntimeError>;
}
