use espcsi_lib::errors::TimingsError;
use espcsi_lib::timings::summarize_file;

use crate::errors::AppError;
use crate::services::{GlobalConfig, Run, TimingsConfig};

/// Prints the packet interval distribution of a capture log to stdout.
pub struct TimingReport {
    config: TimingsConfig,
}

impl Run<TimingsConfig> for TimingReport {
    fn new(_global_config: GlobalConfig, config: TimingsConfig) -> Self {
        TimingReport { config }
    }

    async fn run(&mut self) -> Result<(), AppError> {
        match summarize_file(&self.config.input) {
            Ok(summary) => println!("{summary}"),
            Err(TimingsError::Empty) => println!("no timing records in {}", self.config.input.display()),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
