//! Reporting of rejected input lines.

#[cfg(test)]
use mockall::automock;

use log::warn;

use crate::errors::{DecodeError, RecordError};

/// Receives every line the decoder skips. Implementations must not fail;
/// a rejected line never stops the run.
#[cfg_attr(test, automock)]
pub trait Diagnostics: Send + Sync {
    fn rejected(&self, source: &str, line_no: usize, line: &str, error: &RecordError);
}

/// Forwards rejections to the `log` facade at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn rejected(&self, source: &str, line_no: usize, line: &str, error: &RecordError) {
        match error {
            // The line text of a broken frame is noise
            RecordError::Decode(DecodeError::Truncated(_)) => {
                warn!("{source}:{line_no}: skipping line: {error}");
            }
            _ => warn!("{source}:{line_no}: skipping line: {error}\n  {line}"),
        }
    }
}
