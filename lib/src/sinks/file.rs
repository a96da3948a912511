use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::errors::SinkError;
use crate::record::DecodedRecord;
use crate::sinks::{OutputFormat, Sink, output_name};

/// Configuration for a JSON or YAML file sink.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FileConfig {
    /// Path to the output file; stdout when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
}

type Output = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// A sink that writes each record as a JSON line or a YAML document.
pub struct FileSink {
    format: OutputFormat,
    writer: Option<Output>,
}

impl FileSink {
    /// Creates (truncating) the configured file, or wraps stdout.
    ///
    /// # Errors
    ///
    /// Returns a `SinkError::Io` if the file cannot be created.
    pub async fn new(config: FileConfig) -> Result<Self, SinkError> {
        log::trace!(
            "Creating {:?} file sink (file: {})",
            config.format,
            output_name(config.path.as_deref())
        );
        let output: Box<dyn AsyncWrite + Send + Unpin> = match &config.path {
            Some(path) => Box::new(File::create(path).await?),
            None => Box::new(tokio::io::stdout()),
        };
        Ok(FileSink {
            format: config.format,
            writer: Some(BufWriter::new(output)),
        })
    }

    fn serialize(&self, record: &DecodedRecord) -> Result<String, SinkError> {
        let exported = record.export();
        match self.format {
            OutputFormat::Json => serde_json::to_string(&exported)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| SinkError::Serialize(e.to_string())),
            OutputFormat::Yaml => serde_yaml::to_string(&exported)
                .map(|s| format!("{s}---\n"))
                .map_err(|e| SinkError::Serialize(e.to_string())),
        }
    }
}

#[async_trait]
impl Sink for FileSink {
    /// Serializes the record and appends it to the output.
    ///
    /// # Errors
    ///
    /// - Returns `SinkError::Serialize` if serialization fails.
    /// - Returns `SinkError::Io` if writing fails.
    async fn provide(&mut self, record: &DecodedRecord) -> Result<(), SinkError> {
        let serialized = self.serialize(record)?;
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        writer.write_all(serialized.as_bytes()).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            writer.shutdown().await?;
        }
        Ok(())
    }
}
