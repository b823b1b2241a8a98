//! E2E test support for DynamoDB Local containers.
//!
//! Every helper here talks to a real Docker engine. Tests built on them are
//! marked `#[ignore]`; run them with `cargo test -p e2e_tests -- --ignored`.

use anyhow::{Context, Result};
use dynamodb_local::{Customizer, DynamoDbLocalContainer, Provisioner};

/// A container started for a single test under a unique name.
pub struct IsolatedContainer {
    pub name: String,
    pub container: DynamoDbLocalContainer,
}

/// Start DynamoDB Local under a unique name derived from `test_name`.
///
/// `customizers` are applied after the naming customizer, so they may turn on
/// reuse for that name.
pub async fn start_isolated(
    test_name: &str,
    customizers: &[Customizer],
) -> Result<IsolatedContainer> {
    test_utils::init_test_tracing();

    let name = test_utils::generate_test_container_name(test_name);
    let mut all = vec![test_utils::named(name.clone())];
    all.extend_from_slice(customizers);

    let provisioner = Provisioner::from_env().context("Failed to set up provisioner")?;
    let container = provisioner
        .run(&all)
        .await
        .with_context(|| format!("Failed to start container {name}"))?;

    tracing::info!(name = %name, container_id = %container.id(), "Started isolated container");
    Ok(IsolatedContainer { name, container })
}

/// Skip the calling test when no Docker engine is reachable.
///
/// Returns `true` when the test should continue.
pub async fn require_docker() -> bool {
    if test_utils::docker_available().await {
        return true;
    }
    eprintln!("Docker is not available, skipping test");
    false
}
