//! # espcsi Application Main Entry Point
//!
//! Parses the command line, initializes logging and dispatches to the
//! subcommand services.
//!
//! ## Modules
//!
//! - `cli`: Command-line interface parsing and argument handling.
//! - `decoder`: Decoding of capture logs into records.
//! - `services`: Configurations and the service trait.
//! - `timing_report`: Packet timing summary of a capture log.

mod cli;
mod decoder;
mod errors;
mod services;
mod timing_report;

use std::fs::File;

use cli::*;
use decoder::Decoder;
use log::*;
use services::Run;
use simplelog::{ColorChoice, CombinedLogger, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use timing_report::TimingReport;
use tokio::runtime::Builder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = argh::from_env();
    let global_args = args.parse_global_config()?;

    // Records go to stdout, so terminal logging stays on stderr.
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        global_args.log_level,
        simplelog::ConfigBuilder::new().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));
    if let Some(path) = &args.log_file {
        loggers.push(WriteLogger::new(
            LevelFilter::Error,
            simplelog::ConfigBuilder::new()
                .set_location_level(LevelFilter::Error)
                .build(),
            File::create(path)?,
        ));
    }
    CombinedLogger::init(loggers)?;
    debug!("Parsed args and initialized CombinedLogger");

    let num_workers = global_args.num_workers;
    let runtime = Builder::new_multi_thread().worker_threads(num_workers).enable_all().build()?;
    debug!("Created a builder with {num_workers} workers");

    match &args.subcommand {
        SubCommandsArgs::Decode(args) => runtime.block_on(Decoder::new(global_args, args.load_config()?).run())?,
        SubCommandsArgs::Timings(args) => runtime.block_on(TimingReport::new(global_args, args.parse()?).run())?,
    }
    Ok(())
}
