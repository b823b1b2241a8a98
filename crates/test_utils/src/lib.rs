//! Test utilities for DynamoDB Local integration and E2E tests.
//!
//! This crate provides shared helpers for naming, cleaning up and logging
//! the containers started by tests.

use anyhow::{Context, Result};
use bollard::container::RemoveContainerOptions;
use bollard::Docker;
use chrono::Utc;
use dynamodb_local::Customizer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Generate a unique container name for a test.
///
/// Format: `dynamodb-local-{test-name}-{timestamp}-{random}`
///
/// Characters Docker does not accept in container names are replaced with `-`.
///
/// # Examples
///
/// ```
/// use test_utils::generate_test_container_name;
///
/// let name = generate_test_container_name("reuse");
/// // Result: dynamodb-local-reuse-20240108-120000-a1b2c3
/// assert!(name.starts_with("dynamodb-local-reuse-"));
/// ```
pub fn generate_test_container_name(test_name: &str) -> String {
    let sanitized: String = test_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let random_suffix = Uuid::new_v4().simple().to_string()[..6].to_lowercase();
    format!("dynamodb-local-{sanitized}-{timestamp}-{random_suffix}")
}

/// Customizer that gives the container a fixed name.
///
/// Combine with [`reusable`] to exercise find-or-create without touching the
/// shared `dynamodb_local` container other test runs may be using.
pub fn named(name: impl Into<String>) -> Customizer {
    let name = name.into();
    Customizer::new("named", move |descriptor| {
        descriptor.name = Some(name.clone());
        Ok(())
    })
}

/// Customizer that turns on reuse for whatever name is already set.
pub fn reusable() -> Customizer {
    Customizer::new("reusable", |descriptor| {
        if descriptor.name.is_none() {
            return Err(dynamodb_local::Error::Customization(
                "reuse requires a container name".to_string(),
            ));
        }
        descriptor.reuse = true;
        Ok(())
    })
}

/// Install a tracing subscriber for tests, honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs the subscriber.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dynamodb_local=debug,info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Check whether a Docker engine is reachable.
///
/// Tests that need Docker call this first and skip when it returns `false`.
pub async fn docker_available() -> bool {
    let docker = match Docker::connect_with_local_defaults() {
        Ok(docker) => docker,
        Err(e) => {
            warn!(error = %e, "Docker client could not be created");
            return false;
        }
    };

    match docker.ping().await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Docker daemon did not answer ping");
            false
        }
    }
}

/// Remove a container by name (best effort cleanup).
///
/// Missing containers and removal failures are logged but do not fail the test.
///
/// # Examples
///
/// ```no_run
/// use test_utils::cleanup_container;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// cleanup_container("dynamodb-local-reuse-20240108-120000-a1b2c3").await?;
/// # Ok(())
/// # }
/// ```
pub async fn cleanup_container(name: &str) -> Result<()> {
    info!(name = name, "Attempting best-effort cleanup of test container");

    let docker =
        Docker::connect_with_local_defaults().context("Failed to connect to Docker daemon")?;

    match docker
        .remove_container(
            name,
            Some(RemoveContainerOptions {
                force: true,
                v: true,
                ..Default::default()
            }),
        )
        .await
    {
        Ok(()) => info!(name = name, "Removed test container"),
        Err(e) => warn!(name = name, error = %e, "Failed to remove test container"),
    }

    Ok(())
}
