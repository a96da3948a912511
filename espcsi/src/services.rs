use std::path::PathBuf;

use espcsi_lib::adapters::DataAdapterConfig;
use espcsi_lib::sinks::SinkConfig;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A trait for parsing a YAML file into a struct using Serde.
///
/// # Errors
/// Returns an `AppError` if the file cannot be read or if deserialization fails.
///
/// # Example
/// ```rust,ignore
/// let config = DecodeConfig::from_yaml(PathBuf::from("decode.yaml"))?;
/// ```
pub trait FromYaml: Sized + for<'de> Deserialize<'de> {
    /// Loads an instance of the implementing type from a YAML file.
    fn from_yaml(file: PathBuf) -> Result<Self, AppError> {
        let yaml = std::fs::read_to_string(&file).map_err(|source| AppError::ConfigRead {
            path: file.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&yaml)?)
    }
}

/// Everything a decode run needs. Every field is optional in YAML.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DecodeConfig {
    /// Capture files; `-` or an empty list reads stdin.
    pub inputs: Vec<PathBuf>,
    /// `[re, im]` written wherever no sample exists.
    pub missing_value: [f64; 2],
    /// Require the exact IQ-pair count of each frame's configuration.
    pub strict: bool,
    pub sink: SinkConfig,
    /// Decode every input concurrently into `<out_dir>/<stem>.<ext>`.
    pub out_dir: Option<PathBuf>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            inputs: Vec::new(),
            missing_value: [0.0, 0.0],
            strict: false,
            sink: SinkConfig::default(),
            out_dir: None,
        }
    }
}

impl DecodeConfig {
    pub fn adapter_config(&self) -> DataAdapterConfig {
        DataAdapterConfig::Esp32 {
            missing_value: self.missing_value,
            strict: self.strict,
        }
    }
}

impl FromYaml for DecodeConfig {}

pub struct TimingsConfig {
    pub input: PathBuf,
}

pub struct GlobalConfig {
    pub log_level: LevelFilter,
    pub num_workers: usize,
}

pub trait Run<ServiceConfig> {
    // Initialize standalone state which does not depend on any config
    fn new(global_config: GlobalConfig, config: ServiceConfig) -> Self;

    // Actually applies given config and runs the service
    async fn run(&mut self) -> Result<(), AppError>;
}
