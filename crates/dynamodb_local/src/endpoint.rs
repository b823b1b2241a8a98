//! Endpoint resolution that pins a DynamoDB client to a local container.

use aws_sdk_dynamodb::config::endpoint::{Endpoint, EndpointFuture, Params, ResolveEndpoint};
use url::Url;

use crate::Error;

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;

/// Resolves every request to the same `host:port`.
///
/// Region, FIPS and dual-stack parameters are ignored. The resolver never falls back to
/// the default AWS endpoint rules, so a client built with it cannot reach a real AWS
/// account by accident.
#[derive(Debug, Clone)]
pub struct LocalEndpointResolver {
    url: String,
}

impl LocalEndpointResolver {
    /// Binds the resolver to `host_and_port`, e.g. `localhost:49153`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientConstruction`] if `host_and_port` does not form a valid
    /// HTTP URL.
    pub fn new(host_and_port: &str) -> Result<Self, Error> {
        let has_host_and_port = host_and_port
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !has_host_and_port {
            return Err(Error::ClientConstruction(format!(
                "endpoint '{host_and_port}' must be in host:port form"
            )));
        }

        let raw = format!("http://{host_and_port}");
        Url::parse(&raw).map_err(|e| {
            Error::ClientConstruction(format!("invalid endpoint '{host_and_port}': {e}"))
        })?;

        Ok(Self { url: raw })
    }

    /// The endpoint URL every request is sent to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Joins `host` and `port` into `host:port`, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

impl ResolveEndpoint for LocalEndpointResolver {
    fn resolve_endpoint<'a>(&'a self, _params: &'a Params) -> EndpointFuture<'a> {
        EndpointFuture::ready(Ok(Endpoint::builder().url(self.url.clone()).build()))
    }
}
