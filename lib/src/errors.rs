use thiserror::Error;

use crate::csi_types::WifiConfig;

/// Errors raised while turning one input line into a `RawFrame`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Line is neither a textual array frame nor a base64 binary frame")]
    UnrecognizedEncoding,

    #[error("Invalid byte-order marker: {0:#06x}")]
    BadMarker(u32),

    #[error("Malformed or truncated frame: {0}")]
    Truncated(String),

    #[error("Guard timestamp {guard} does not match rx timestamp {rx_timestamp}")]
    GuardMismatch { rx_timestamp: u32, guard: u32 },
}

/// Errors raised by the subcarrier remapping engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CsiError {
    #[error("Unsupported wifi configuration: {0}")]
    UnsupportedConfig(WifiConfig),

    #[error("CSI length mismatch for wifi_config={config}: expected {expected} IQ pairs, got {actual}")]
    LengthMismatch { config: WifiConfig, expected: usize, actual: usize },

    #[error("Odd number of CSI values, should be even: {0}")]
    OddSampleCount(usize),

    #[error("Not enough IQ pairs for wifi_config={config}: need {needed}, got {actual}")]
    InsufficientSamples { config: WifiConfig, needed: usize, actual: usize },
}

/// The per-line error. Any of these skips the line and nothing else.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("CSI error: {0}")]
    Csi(#[from] CsiError),
}

impl RecordError {
    /// Short, stable name of the error kind, used for rejection tallies.
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::Decode(DecodeError::UnrecognizedEncoding) => "unrecognized_encoding",
            RecordError::Decode(DecodeError::BadMarker(_)) => "bad_marker",
            RecordError::Decode(DecodeError::Truncated(_)) => "truncated",
            RecordError::Decode(DecodeError::GuardMismatch { .. }) => "guard_mismatch",
            RecordError::Csi(CsiError::UnsupportedConfig(_)) => "unsupported_config",
            RecordError::Csi(CsiError::LengthMismatch { .. }) => "length_mismatch",
            RecordError::Csi(CsiError::OddSampleCount(_)) => "odd_sample_count",
            RecordError::Csi(CsiError::InsufficientSamples { .. }) => "insufficient_samples",
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open input {path}: {source}")]
    Open { path: String, source: std::io::Error },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error: {0}")]
    Serialize(String),

    #[error("Sink already closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Sink Error: {0}")]
    SinkError(#[from] SinkError),

    #[error("Data Source Error: {0}")]
    SourceError(#[from] SourceError),

    #[error("Interrupted")]
    Interrupted,

    #[error("Decode task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Error, Debug)]
pub enum TimingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No timing records found")]
    Empty,
}
