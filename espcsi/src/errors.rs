//! This module contains all the errors thrown by the espcsi application

use espcsi_lib::errors::{TaskError, TimingsError};
use thiserror::Error;

/// Errors occurring at the application/config level.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O error during application execution.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a YAML configuration.
    #[error("Failed with config parsing: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Reading a YAML configuration file failed.
    #[error("Failed to read YAML file {path}: {source}")]
    ConfigRead { path: String, source: std::io::Error },

    /// Inconsistent command line or configuration values.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Task Error: {0}")]
    TaskError(#[from] TaskError),

    #[error("Timings Error: {0}")]
    TimingsError(#[from] TimingsError),
}
