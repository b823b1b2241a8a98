//! Tests for the local endpoint resolver.

use super::*;

fn params(region: &str, use_fips: bool, use_dual_stack: bool) -> Params {
    Params::builder()
        .region(region)
        .use_fips(use_fips)
        .use_dual_stack(use_dual_stack)
        .build()
        .expect("endpoint params should build")
}

#[test]
fn test_new_accepts_host_and_port() {
    let resolver = LocalEndpointResolver::new("localhost:49153").expect("valid endpoint");

    assert_eq!(resolver.url(), "http://localhost:49153");
}

#[test]
fn test_new_accepts_ip_addresses() {
    let v4 = LocalEndpointResolver::new("127.0.0.1:8000").expect("valid IPv4 endpoint");
    let v6 = LocalEndpointResolver::new("[::1]:8000").expect("valid IPv6 endpoint");

    assert_eq!(v4.url(), "http://127.0.0.1:8000");
    assert_eq!(v6.url(), "http://[::1]:8000");
}

#[test]
fn test_join_host_port_brackets_ipv6_literals() {
    assert_eq!(join_host_port("localhost", 8000), "localhost:8000");
    assert_eq!(join_host_port("127.0.0.1", 8000), "127.0.0.1:8000");
    assert_eq!(join_host_port("::1", 8000), "[::1]:8000");
    assert_eq!(join_host_port("[::1]", 8000), "[::1]:8000");

    let resolver = LocalEndpointResolver::new(&join_host_port("::1", 49153))
        .expect("joined IPv6 endpoint should be accepted");
    assert_eq!(resolver.url(), "http://[::1]:49153");
}

#[test]
fn test_new_rejects_missing_port() {
    for invalid in ["localhost", "localhost:", ":8000", "localhost:http", ""] {
        let result = LocalEndpointResolver::new(invalid);
        assert!(
            matches!(result, Err(Error::ClientConstruction(_))),
            "'{invalid}' should be rejected"
        );
    }
}

#[test]
fn test_new_rejects_invalid_host() {
    let result = LocalEndpointResolver::new("bad host:8000");

    assert!(matches!(result, Err(Error::ClientConstruction(_))));
}

#[tokio::test]
async fn test_resolves_to_bound_endpoint() {
    let resolver = LocalEndpointResolver::new("localhost:49153").unwrap();

    let endpoint = resolver
        .resolve_endpoint(&params("us-east-1", false, false))
        .await
        .expect("endpoint should resolve");

    assert_eq!(endpoint.url(), "http://localhost:49153");
}

#[tokio::test]
async fn test_ignores_region_and_endpoint_variants() {
    let resolver = LocalEndpointResolver::new("localhost:49153").unwrap();

    for p in [
        params("eu-west-1", false, false),
        params("us-gov-west-1", true, false),
        params("ap-southeast-2", false, true),
        params("cn-north-1", true, true),
    ] {
        let endpoint = resolver.resolve_endpoint(&p).await.unwrap();
        assert_eq!(endpoint.url(), "http://localhost:49153");
        assert!(!endpoint.url().contains("amazonaws"));
    }
}
