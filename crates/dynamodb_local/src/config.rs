//! Provisioner configuration.
//!
//! Defaults suit a local Docker engine. Each value can be overridden through an
//! environment variable so CI machines with slow image pulls can widen the timeout
//! without code changes.

use std::env;
use std::time::Duration;

use crate::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable holding the startup timeout in whole seconds.
pub const STARTUP_TIMEOUT_ENV: &str = "DYNAMODB_LOCAL_STARTUP_TIMEOUT_SECS";

/// Environment variable holding the readiness poll interval in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "DYNAMODB_LOCAL_POLL_INTERVAL_MS";

/// Environment variable holding the region given to DynamoDB clients.
pub const REGION_ENV: &str = "DYNAMODB_LOCAL_REGION";

/// Environment variable that overrides the host used to reach mapped ports.
pub const HOST_OVERRIDE_ENV: &str = "TESTCONTAINERS_HOST_OVERRIDE";

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_REGION: &str = "us-east-1";

/// Settings shared by the provisioner, the Docker runtime and container handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// Upper bound on the readiness wait.
    pub startup_timeout: Duration,

    /// Delay between readiness probes.
    pub poll_interval: Duration,

    /// Region configured on DynamoDB clients. DynamoDB Local keeps a separate
    /// database per region unless `-sharedDb` is set.
    pub region: String,

    /// Host to report for mapped ports instead of the one derived from the engine.
    pub host_override: Option<String>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            region: DEFAULT_REGION.to_string(),
            host_override: None,
        }
    }
}

impl ProvisionerConfig {
    /// Loads configuration from the environment, falling back to defaults for
    /// variables that are not set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a numeric variable cannot be parsed or is zero.
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();

        let startup_timeout = match read_positive(STARTUP_TIMEOUT_ENV)? {
            Some(secs) => Duration::from_secs(secs),
            None => defaults.startup_timeout,
        };

        let poll_interval = match read_positive(POLL_INTERVAL_ENV)? {
            Some(millis) => Duration::from_millis(millis),
            None => defaults.poll_interval,
        };

        let region = read_non_empty(REGION_ENV).unwrap_or(defaults.region);
        let host_override = read_non_empty(HOST_OVERRIDE_ENV);

        Ok(Self {
            startup_timeout,
            poll_interval,
            region,
            host_override,
        })
    }
}

fn read_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_positive(key: &str) -> Result<Option<u64>, Error> {
    let Some(raw) = read_non_empty(key) else {
        return Ok(None);
    };

    match raw.parse::<u64>() {
        Ok(0) => Err(Error::Configuration(format!("{key} must be greater than zero"))),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(Error::Configuration(format!(
            "{key} must be a whole number, got '{raw}': {e}"
        ))),
    }
}
