//! The decode service: builds the adapter from the configuration and hands
//! the inputs to the library's decode handler.

use std::path::PathBuf;
use std::sync::Arc;

use espcsi_lib::FromConfig;
use espcsi_lib::adapters::CsiDataAdapter;
use espcsi_lib::diagnostics::LogDiagnostics;
use espcsi_lib::handler::{DecodeTask, decode_inputs};
use espcsi_lib::sources::STDIN_PATH;
use log::{info, warn};

use crate::errors::AppError;
use crate::services::{DecodeConfig, GlobalConfig, Run};

pub struct Decoder {
    config: DecodeConfig,
}

impl Run<DecodeConfig> for Decoder {
    fn new(_global_config: GlobalConfig, config: DecodeConfig) -> Self {
        Decoder { config }
    }

    async fn run(&mut self) -> Result<(), AppError> {
        let adapter = <dyn CsiDataAdapter>::from_config(self.config.adapter_config()).await?;
        let task = DecodeTask::new(Arc::from(adapter), Arc::new(LogDiagnostics));

        let inputs = if self.config.inputs.is_empty() {
            vec![PathBuf::from(STDIN_PATH)]
        } else {
            self.config.inputs.clone()
        };
        let stats = decode_inputs(task, inputs, self.config.sink.clone(), self.config.out_dir.clone()).await?;

        info!("Done: {stats}");
        if stats.lines > 0 && stats.decoded == 0 {
            warn!("No line could be decoded");
        }
        Ok(())
    }
}
