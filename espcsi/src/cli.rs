use std::path::PathBuf;
use std::str::FromStr;

use argh::FromArgs;
use espcsi_lib::sinks::csv::CsvConfig;
use espcsi_lib::sinks::file::FileConfig;
use espcsi_lib::sinks::{OutputFormat, SinkConfig};
use simplelog::LevelFilter;

use crate::errors::AppError;
use crate::services::{DecodeConfig, GlobalConfig, TimingsConfig};

/// Decode ESP32 CSI capture logs into per-packet records
#[derive(FromArgs, Debug)]
pub struct Args {
    /// log level to use for terminal logging (default: info)
    #[argh(option, default = "LevelFilter::Info")]
    pub level: LevelFilter,

    /// number of tokio worker threads (default: 4)
    #[argh(option, default = "4")]
    pub num_workers: usize,

    /// additionally write errors to this file
    #[argh(option)]
    pub log_file: Option<PathBuf>,

    #[argh(subcommand)]
    pub subcommand: SubCommandsArgs,
}

impl Args {
    pub fn parse_global_config(&self) -> Result<GlobalConfig, AppError> {
        if self.num_workers == 0 {
            return Err(AppError::Config("--num-workers must be at least 1".to_owned()));
        }
        Ok(GlobalConfig {
            log_level: self.level,
            num_workers: self.num_workers,
        })
    }
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub enum SubCommandsArgs {
    Decode(DecodeSubcommandArgs),
    Timings(TimingsSubcommandArgs),
}

/// Record output formats selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Json,
    Yaml,
    Csv,
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputKind::Json),
            "yaml" => Ok(OutputKind::Yaml),
            "csv" => Ok(OutputKind::Csv),
            other => Err(format!("unknown format {other}, expected json, yaml or csv")),
        }
    }
}

/// Decode capture lines into records
#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand, name = "decode")]
pub struct DecodeSubcommandArgs {
    /// YAML decode configuration
    #[argh(option)]
    pub config: Option<PathBuf>,

    /// reject payloads whose length does not match the radio configuration
    #[argh(switch)]
    pub strict: bool,

    /// output format: json (default), yaml or csv
    #[argh(option)]
    pub format: Option<OutputKind>,

    /// output file (default: stdout)
    #[argh(option, short = 'o')]
    pub output: Option<PathBuf>,

    /// write one output file per input to this directory, decoding inputs concurrently
    #[argh(option)]
    pub out_dir: Option<PathBuf>,

    /// capture files, `-` for stdin (default: stdin)
    #[argh(positional)]
    pub inputs: Vec<PathBuf>,
}

impl DecodeSubcommandArgs {
    /// Loads the YAML configuration if one was given, then applies the
    /// command line on top of it.
    pub fn load_config(&self) -> Result<DecodeConfig, AppError> {
        use crate::services::FromYaml;
        let config = match &self.config {
            Some(path) => DecodeConfig::from_yaml(path.clone())?,
            None => DecodeConfig::default(),
        };
        self.overlay_subcommand_args(config)
    }

    /// Command line values take precedence over the configuration file.
    pub fn overlay_subcommand_args(&self, mut config: DecodeConfig) -> Result<DecodeConfig, AppError> {
        if !self.inputs.is_empty() {
            config.inputs = self.inputs.clone();
        }
        config.strict |= self.strict;
        if self.out_dir.is_some() {
            config.out_dir = self.out_dir.clone();
        }
        if self.format.is_some() || self.output.is_some() {
            let path = self.output.clone().or_else(|| config.sink.path().map(PathBuf::from));
            let kind = self.format.unwrap_or(match &config.sink {
                SinkConfig::File(FileConfig { format: OutputFormat::Json, .. }) => OutputKind::Json,
                SinkConfig::File(FileConfig { format: OutputFormat::Yaml, .. }) => OutputKind::Yaml,
                SinkConfig::Csv(_) => OutputKind::Csv,
            });
            config.sink = match kind {
                OutputKind::Json => SinkConfig::File(FileConfig {
                    path,
                    format: OutputFormat::Json,
                }),
                OutputKind::Yaml => SinkConfig::File(FileConfig {
                    path,
                    format: OutputFormat::Yaml,
                }),
                OutputKind::Csv => SinkConfig::Csv(CsvConfig { path }),
            };
        }
        if self.output.is_some() && config.out_dir.is_some() {
            return Err(AppError::Config("--output and --out-dir are mutually exclusive".to_owned()));
        }
        Ok(config)
    }
}

/// Summarize packet timing messages of a capture log
#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand, name = "timings")]
pub struct TimingsSubcommandArgs {
    /// capture log to scan
    #[argh(positional)]
    pub input: PathBuf,
}

impl TimingsSubcommandArgs {
    pub fn parse(&self) -> Result<TimingsConfig, AppError> {
        Ok(TimingsConfig {
            input: self.input.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["espcsi"], args).unwrap()
    }

    fn decode_args(args: &[&str]) -> DecodeSubcommandArgs {
        let mut full = vec!["decode"];
        full.extend_from_slice(args);
        match parse(&full).subcommand {
            SubCommandsArgs::Decode(args) => args,
            other => panic!("Unexpected subcommand {other:?}"),
        }
    }

    #[test]
    fn test_global_options() {
        let args = parse(&["--level", "warn", "--num-workers", "2", "timings", "capture.log"]);
        let global = args.parse_global_config().unwrap();
        assert_eq!(global.log_level, LevelFilter::Warn);
        assert_eq!(global.num_workers, 2);
        assert!(matches!(
            args.subcommand,
            SubCommandsArgs::Timings(TimingsSubcommandArgs { ref input }) if input == &PathBuf::from("capture.log")
        ));
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let args = parse(&["--num-workers", "0", "timings", "capture.log"]);
        assert!(matches!(args.parse_global_config(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_decode_defaults() {
        let config = decode_args(&[]).overlay_subcommand_args(DecodeConfig::default()).unwrap();
        assert_eq!(config, DecodeConfig::default());
    }

    #[test]
    fn test_cli_overlays_yaml_values() {
        let file_config = DecodeConfig {
            inputs: vec![PathBuf::from("from_yaml.txt")],
            sink: SinkConfig::File(FileConfig {
                path: Some(PathBuf::from("yaml_out.yaml")),
                format: OutputFormat::Yaml,
            }),
            ..Default::default()
        };

        let config = decode_args(&["--strict", "--format", "csv", "a.txt", "b.txt"])
            .overlay_subcommand_args(file_config)
            .unwrap();
        assert!(config.strict);
        assert_eq!(config.inputs, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(
            config.sink,
            SinkConfig::Csv(CsvConfig {
                path: Some(PathBuf::from("yaml_out.yaml"))
            })
        );
    }

    #[test]
    fn test_output_keeps_configured_format() {
        let file_config = DecodeConfig {
            sink: SinkConfig::File(FileConfig {
                path: None,
                format: OutputFormat::Yaml,
            }),
            ..Default::default()
        };
        let config = decode_args(&["-o", "out.yaml"]).overlay_subcommand_args(file_config).unwrap();
        assert_eq!(
            config.sink,
            SinkConfig::File(FileConfig {
                path: Some(PathBuf::from("out.yaml")),
                format: OutputFormat::Yaml
            })
        );
    }

    #[test]
    fn test_output_conflicts_with_out_dir() {
        let result = decode_args(&["-o", "out.jsonl", "--out-dir", "decoded"]).overlay_subcommand_args(DecodeConfig::default());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_unknown_format() {
        assert!("xml".parse::<OutputKind>().is_err());
        assert_eq!("JSON".parse::<OutputKind>().unwrap(), OutputKind::Json);
    }
}
