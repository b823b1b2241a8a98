//! In-memory container runtime used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::descriptor::{ContainerPort, LaunchDescriptor, WaitStrategy};
use crate::errors::RuntimeError;
use crate::runtime::{ContainerId, ContainerRuntime, ContainerState};

#[derive(Debug, Clone)]
pub(crate) enum Readiness {
    Ready,
    Never,
    Fail(String),
}

#[derive(Debug)]
struct FakeContainer {
    name: Option<String>,
    running: bool,
}

#[derive(Debug)]
struct FakeState {
    containers: HashMap<ContainerId, FakeContainer>,
    created: Vec<LaunchDescriptor>,
    next_id: u32,
    fail_create: Option<String>,
    readiness: Readiness,
    host: String,
    port: u16,
}

/// Records what it was asked to do and simulates containers in memory.
#[derive(Debug)]
pub(crate) struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                containers: HashMap::new(),
                created: Vec::new(),
                next_id: 1,
                fail_create: None,
                readiness: Readiness::Ready,
                host: "localhost".to_string(),
                port: 49153,
            }),
        }
    }

    pub(crate) fn with_endpoint(self, host: &str, port: u16) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.host = host.to_string();
            state.port = port;
        }
        self
    }

    pub(crate) fn with_readiness(self, readiness: Readiness) -> Self {
        self.state.lock().unwrap().readiness = readiness;
        self
    }

    pub(crate) fn failing_create(self, message: &str) -> Self {
        self.state.lock().unwrap().fail_create = Some(message.to_string());
        self
    }

    /// Simulates the container exiting behind the handle's back.
    pub(crate) fn stop(&self, id: &ContainerId) {
        if let Some(container) = self.state.lock().unwrap().containers.get_mut(id) {
            container.running = false;
        }
    }

    pub(crate) fn created(&self) -> Vec<LaunchDescriptor> {
        self.state.lock().unwrap().created.clone()
    }

    pub(crate) fn container_count(&self) -> usize {
        self.state.lock().unwrap().containers.len()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn create_and_start(
        &self,
        descriptor: &LaunchDescriptor,
    ) -> Result<ContainerId, RuntimeError> {
        let mut state = self.state.lock().unwrap();

        if let Some(message) = &state.fail_create {
            return Err(RuntimeError::new(message.clone()));
        }

        if descriptor.reuse {
            let existing = state
                .containers
                .iter_mut()
                .find(|(_, c)| c.name.is_some() && c.name == descriptor.name);
            if let Some((id, container)) = existing {
                container.running = true;
                return Ok(id.clone());
            }
        }

        let id = ContainerId::new(format!("fake-{}", state.next_id));
        state.next_id += 1;
        state.created.push(descriptor.clone());
        state.containers.insert(
            id.clone(),
            FakeContainer {
                name: descriptor.name.clone(),
                running: true,
            },
        );
        Ok(id)
    }

    async fn host(&self, id: &ContainerId) -> Result<String, RuntimeError> {
        let state = self.state.lock().unwrap();
        if !state.containers.contains_key(id) {
            return Err(RuntimeError::new(format!("no such container {id}")));
        }
        Ok(state.host.clone())
    }

    async fn mapped_port(
        &self,
        id: &ContainerId,
        port: ContainerPort,
    ) -> Result<u16, RuntimeError> {
        let state = self.state.lock().unwrap();
        match state.containers.get(id) {
            Some(container) if container.running => Ok(state.port),
            Some(_) => Err(RuntimeError::new(format!(
                "container {id} is not running, port {port} is not mapped"
            ))),
            None => Err(RuntimeError::new(format!("no such container {id}"))),
        }
    }

    async fn wait_until_ready(
        &self,
        _id: &ContainerId,
        _strategy: &WaitStrategy,
    ) -> Result<(), RuntimeError> {
        let readiness = self.state.lock().unwrap().readiness.clone();
        match readiness {
            Readiness::Ready => Ok(()),
            Readiness::Never => std::future::pending().await,
            Readiness::Fail(message) => Err(RuntimeError::new(message)),
        }
    }

    async fn terminate(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        match self.state.lock().unwrap().containers.remove(id) {
            Some(_) => Ok(()),
            None => Err(RuntimeError::new(format!("no such container {id}"))),
        }
    }

    async fn state(&self, id: &ContainerId) -> Result<ContainerState, RuntimeError> {
        let state = self.state.lock().unwrap();
        match state.containers.get(id) {
            Some(container) => Ok(ContainerState {
                running: container.running,
                status: if container.running { "running" } else { "exited" }.to_string(),
                exit_code: (!container.running).then_some(0),
            }),
            None => Err(RuntimeError::new(format!("no such container {id}"))),
        }
    }
}
