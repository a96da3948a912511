//! Record sinks
//! ------------
//!
//! Sinks receive decoded records in the order the handler produces them and
//! write them out. Every sink must be closed to flush buffered output.

pub mod csv;
pub mod file;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::FromConfig;
use crate::errors::{SinkError, TaskError};
use crate::record::DecodedRecord;

#[async_trait]
pub trait Sink: Send {
    /// Writes one record.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if serialization or the underlying write fails,
    /// or the sink was already closed.
    async fn provide(&mut self, record: &DecodedRecord) -> Result<(), SinkError>;

    /// Flushes and releases the output. Further `provide` calls fail.
    async fn close(&mut self) -> Result<(), SinkError>;
}

/// Document format of a [`file::FileSink`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// YAML documents separated by `---`.
    Yaml,
}

/// Sink configs that can be created from file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum SinkConfig {
    File(file::FileConfig),
    Csv(csv::CsvConfig),
}

impl Default for SinkConfig {
    /// JSON lines on stdout.
    fn default() -> Self {
        SinkConfig::File(file::FileConfig::default())
    }
}

impl SinkConfig {
    /// Output file path, `None` for stdout.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SinkConfig::File(config) => config.path.as_deref(),
            SinkConfig::Csv(config) => config.path.as_deref(),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SinkConfig::File(file::FileConfig { format: OutputFormat::Json, .. }) => "jsonl",
            SinkConfig::File(file::FileConfig { format: OutputFormat::Yaml, .. }) => "yaml",
            SinkConfig::Csv(_) => "csv",
        }
    }

    /// The same sink kind, writing to `path`.
    pub fn with_path(&self, path: PathBuf) -> SinkConfig {
        match self {
            SinkConfig::File(config) => SinkConfig::File(file::FileConfig {
                path: Some(path),
                format: config.format,
            }),
            SinkConfig::Csv(_) => SinkConfig::Csv(csv::CsvConfig { path: Some(path) }),
        }
    }

    /// One config per input, writing to `<dir>/<input file stem>.<extension>`.
    ///
    /// Inputs whose stems collide get a `-<n>` suffix, so every input has an
    /// output file of its own.
    pub fn for_inputs(&self, dir: &Path, inputs: &[PathBuf]) -> Vec<SinkConfig> {
        let mut taken = HashSet::new();
        inputs
            .iter()
            .map(|input| {
                let stem = input
                    .file_stem()
                    .filter(|_| input.as_os_str() != crate::sources::STDIN_PATH)
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "stdin".to_owned());
                let mut name = stem.clone();
                let mut n = 1;
                while !taken.insert(name.clone()) {
                    name = format!("{stem}-{n}");
                    n += 1;
                }
                self.with_path(dir.join(format!("{name}.{}", self.extension())))
            })
            .collect()
    }
}

#[async_trait]
impl FromConfig<SinkConfig> for dyn Sink {
    async fn from_config(config: SinkConfig) -> Result<Box<Self>, TaskError> {
        let sink: Box<dyn Sink> = match config {
            SinkConfig::File(config) => Box::new(file::FileSink::new(config).await?),
            SinkConfig::Csv(config) => Box::new(csv::CsvSink::new(config).await?),
        };
        Ok(sink)
    }
}

/// Name of an output used in log messages.
pub(crate) fn output_name(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_else(|| "<stdout>".to_owned())
}
