//! End-to-end tests for DynamoDB Local containers on a real Docker engine.
//!
//! These require a running Docker daemon and are marked `#[ignore]`.
//! Run with: `cargo test -p e2e_tests -- --ignored`

use anyhow::Result;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use dynamodb_local::{
    Error, LocalEndpointResolver, Provisioner, run_container, with_image, with_in_memory,
    with_shared_db, with_telemetry_disabled,
};
use e2e_tests::{require_docker, start_isolated};

/// Test the documented usage: telemetry disabled plus shared database.
///
/// Verifies:
/// - The container reaches the running state
/// - The shared container is found again by a second call
#[tokio::test]
#[ignore]
async fn test_e2e_shared_db_with_telemetry_disabled_is_running() -> Result<()> {
    if !require_docker().await {
        return Ok(());
    }
    test_utils::init_test_tracing();

    let container = run_container(&[with_telemetry_disabled(), with_shared_db()]).await?;

    let state = container.state().await?;
    assert!(state.running, "container should be running: {state:?}");

    container.terminate().await?;
    Ok(())
}

/// Test find-or-create semantics for a named, reusable container.
///
/// Verifies:
/// - Two sequential provisioning calls both succeed
/// - Both handles refer to the same container
/// - Both report the container as running
#[tokio::test]
#[ignore]
async fn test_e2e_reuse_resolves_to_same_container() -> Result<()> {
    if !require_docker().await {
        return Ok(());
    }

    let first = start_isolated(
        "reuse",
        &[with_telemetry_disabled(), test_utils::reusable()],
    )
    .await?;

    let provisioner = Provisioner::from_env()?;
    let second = provisioner
        .run(&[
            test_utils::named(first.name.clone()),
            with_telemetry_disabled(),
            test_utils::reusable(),
        ])
        .await;

    let outcome = match &second {
        Ok(second) => {
            assert_eq!(first.container.id(), second.id());
            assert!(first.container.state().await?.running);
            assert!(second.state().await?.running);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("second provisioning call failed: {e}")),
    };

    first.container.terminate().await?;
    outcome
}

/// Test that the built client talks to the container.
///
/// Verifies:
/// - A table created through the client is listed afterwards
/// - The resolver endpoint equals the handle's connection string
#[tokio::test]
#[ignore]
async fn test_e2e_build_client_targets_container() -> Result<()> {
    if !require_docker().await {
        return Ok(());
    }

    let fixture = start_isolated("client", &[with_telemetry_disabled(), with_in_memory()]).await?;
    let container = &fixture.container;

    let connection = container.connection_string().await?;
    let resolver = LocalEndpointResolver::new(&connection)?;
    assert_eq!(resolver.url(), format!("http://{connection}"));

    let client = container.build_client().await?;
    client
        .create_table()
        .table_name("orders")
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("pk")
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("pk")
                .key_type(KeyType::Hash)
                .build()?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await?;

    let tables = client.list_tables().send().await?;
    assert_eq!(tables.table_names(), ["orders".to_string()]);

    container.terminate().await?;
    Ok(())
}

/// Test the strict and lenient lookups before and after termination.
///
/// Verifies:
/// - The connection string is `<host>:<port>` while running
/// - After termination the lenient accessor returns an empty string
/// - After termination the strict accessor fails with a resolution error
#[tokio::test]
#[ignore]
async fn test_e2e_connection_lookups_follow_container_state() -> Result<()> {
    if !require_docker().await {
        return Ok(());
    }

    let fixture = start_isolated("lookups", &[with_telemetry_disabled()]).await?;
    let container = &fixture.container;

    let connection = container.connection_string().await?;
    let (host, port) = connection
        .rsplit_once(':')
        .expect("connection string should contain a port");
    assert!(!host.is_empty());
    assert_eq!(container.mapped_port().await, port);
    assert!(port.parse::<u16>().is_ok());

    container.terminate().await?;

    assert_eq!(container.mapped_port().await, "");
    assert!(matches!(
        container.connection_string().await,
        Err(Error::Resolution(_))
    ));
    Ok(())
}

/// Test that an image that cannot be pulled fails provisioning.
#[tokio::test]
#[ignore]
async fn test_e2e_unknown_image_fails_provisioning() -> Result<()> {
    if !require_docker().await {
        return Ok(());
    }

    let provisioner = Provisioner::from_env()?;
    let result = provisioner
        .run(&[with_image("amazon/dynamodb-local:no-such-tag-e2e")])
        .await;

    assert!(
        matches!(result, Err(Error::Provisioning(_))),
        "expected provisioning error, got {result:?}"
    );
    Ok(())
}
