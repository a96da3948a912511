//!
//! Data Adapters
//! -------------
//!
//! Capture files hold one frame per text line, in a device specific
//! encoding. Adapters turn such a line into a `DecodedRecord`: parse,
//! check integrity and remap the subcarriers.
//!
//! Adapters are stateless per line, so one adapter can be shared by any
//! number of concurrent decode tasks.

use serde::{Deserialize, Serialize};

use crate::FromConfig;
use crate::csi_types::Complex;
use crate::errors::{RecordError, TaskError};
use crate::record::DecodedRecord;

pub mod esp32;

/// Csi Data Adapter Trait
/// ----------------------
///
/// Decodes a single capture line. Any error concerns that line only; the
/// caller reports it and moves on.
pub trait CsiDataAdapter: Send + Sync {
    /// # Arguments
    /// * `line` - One input line, with or without its line terminator.
    ///
    /// # Returns
    /// * `Ok(DecodedRecord)` - The decoded and remapped frame.
    /// * `Err(RecordError)` - The line could not be parsed, failed the
    ///   integrity check or uses an unsupported radio configuration.
    fn produce(&self, line: &str) -> Result<DecodedRecord, RecordError>;
}

fn default_missing_value() -> [f64; 2] {
    [0.0, 0.0]
}

/// Adapter type tag for configuration-based instantiation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type")]
pub enum DataAdapterConfig {
    Esp32 {
        /// `[re, im]` written wherever no sample exists.
        #[serde(default = "default_missing_value")]
        missing_value: [f64; 2],
        /// Require the exact IQ-pair count of the frame's configuration.
        #[serde(default)]
        strict: bool,
    },
}

impl Default for DataAdapterConfig {
    fn default() -> Self {
        DataAdapterConfig::Esp32 {
            missing_value: default_missing_value(),
            strict: false,
        }
    }
}

/// Instantiates a boxed CSI data adapter from a configuration tag.
#[async_trait::async_trait]
impl FromConfig<DataAdapterConfig> for dyn CsiDataAdapter {
    async fn from_config(tag: DataAdapterConfig) -> Result<Box<Self>, TaskError> {
        let adapter: Box<dyn CsiDataAdapter> = match tag {
            DataAdapterConfig::Esp32 { missing_value: [re, im], strict } => {
                Box::new(esp32::ESP32Adapter::new(Complex::new(re, im), strict))
            }
        };
        Ok(adapter)
    }
}
