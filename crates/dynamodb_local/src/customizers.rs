//! Customizers that shape a [`LaunchDescriptor`] before the container starts.
//!
//! A customizer is a plain function over the descriptor. The provisioner applies the
//! customizers it is given in order, each one seeing the changes made by the ones before
//! it, and stops at the first error.
//!
//! ```rust
//! use dynamodb_local::{apply_customizers, with_shared_db, with_telemetry_disabled, LaunchDescriptor};
//!
//! let mut descriptor = LaunchDescriptor::default();
//! apply_customizers(&mut descriptor, &[with_telemetry_disabled(), with_shared_db()]).unwrap();
//!
//! assert_eq!(
//!     descriptor.command,
//!     vec!["-jar", "DynamoDBLocal.jar", "-disableTelemetry", "-sharedDb"]
//! );
//! assert!(descriptor.reuse);
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::{LaunchDescriptor, SHARED_CONTAINER_NAME};
use crate::Error;

#[cfg(test)]
#[path = "customizers_tests.rs"]
mod tests;

/// Flag that makes DynamoDB Local use a single database file for all credentials and regions.
pub const SHARED_DB_FLAG: &str = "-sharedDb";

/// Flag that stops DynamoDB Local from sending telemetry.
pub const DISABLE_TELEMETRY_FLAG: &str = "-disableTelemetry";

/// Flag that keeps DynamoDB Local data in memory only.
pub const IN_MEMORY_FLAG: &str = "-inMemory";

type CustomizeFn = dyn Fn(&mut LaunchDescriptor) -> Result<(), Error> + Send + Sync;

/// A single, reusable change to a [`LaunchDescriptor`].
///
/// Customizers are cheap to clone and can be applied any number of times.
#[derive(Clone)]
pub struct Customizer {
    name: &'static str,
    apply: Arc<CustomizeFn>,
}

impl Customizer {
    /// Wraps a caller-defined function as a customizer.
    ///
    /// Returning an error aborts provisioning before any container is created.
    pub fn new<F>(name: &'static str, apply: F) -> Self
    where
        F: Fn(&mut LaunchDescriptor) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self {
            name,
            apply: Arc::new(apply),
        }
    }

    /// A short label used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies this customizer to the descriptor.
    pub fn apply(&self, descriptor: &mut LaunchDescriptor) -> Result<(), Error> {
        (self.apply)(descriptor)
    }
}

impl fmt::Debug for Customizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Customizer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Applies `customizers` to `descriptor` in order, stopping at the first error.
///
/// The error is returned unchanged. Changes made by customizers that ran before the
/// failing one stay on the descriptor.
pub fn apply_customizers(
    descriptor: &mut LaunchDescriptor,
    customizers: &[Customizer],
) -> Result<(), Error> {
    for customizer in customizers {
        debug!(customizer = customizer.name(), "Applying customizer");
        customizer.apply(descriptor)?;
    }
    Ok(())
}

/// Shares one persistent database between successive runs.
///
/// Adds `-sharedDb` and switches the descriptor to reuse the container named
/// `dynamodb_local`, so data written by one test run is visible to the next.
pub fn with_shared_db() -> Customizer {
    Customizer::new("shared_db", |descriptor| {
        descriptor.push_flag(SHARED_DB_FLAG);
        descriptor.name = Some(SHARED_CONTAINER_NAME.to_string());
        descriptor.reuse = true;
        Ok(())
    })
}

/// Stops DynamoDB Local from sending telemetry.
pub fn with_telemetry_disabled() -> Customizer {
    Customizer::new("telemetry_disabled", |descriptor| {
        descriptor.push_flag(DISABLE_TELEMETRY_FLAG);
        Ok(())
    })
}

/// Keeps all data in memory; it is lost when the container stops.
pub fn with_in_memory() -> Customizer {
    Customizer::new("in_memory", |descriptor| {
        descriptor.push_flag(IN_MEMORY_FLAG);
        Ok(())
    })
}

/// Runs `image` instead of the default DynamoDB Local image.
///
/// An empty reference is rejected with [`Error::Customization`].
pub fn with_image(image: impl Into<String>) -> Customizer {
    let image = image.into();
    Customizer::new("image", move |descriptor| {
        let trimmed = image.trim();
        if trimmed.is_empty() {
            return Err(Error::Customization(
                "image reference must not be empty".to_string(),
            ));
        }
        descriptor.image = trimmed.to_string();
        Ok(())
    })
}
