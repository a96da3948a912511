pub mod adapters;
pub mod csi_types;
pub mod diagnostics;
pub mod errors;
pub mod export;
pub mod frame;
pub mod handler;
pub mod record;
pub mod remap;
pub mod sinks;
pub mod sources;
pub mod timings;
pub mod validate;

#[cfg(test)]
mod test_utils;

use crate::errors::TaskError;

/// Builds a boxed trait object from its serde-loaded configuration.
#[async_trait::async_trait]
pub trait FromConfig<C> {
    async fn from_config(config: C) -> Result<Box<Self>, TaskError>;
}
