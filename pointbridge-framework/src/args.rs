//! CLI argument parsing for bridges.

use std::path::PathBuf;

use clap::Parser;

use crate::{LogFormat, LoggingConfig};

/// Common CLI arguments for all bridges.
#[derive(Parser, Debug, Clone)]
#[command(about = "PointBridge field-device bridge")]
pub struct BridgeArgs {
    /// Path to configuration file (JSON5).
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub log_json: bool,

    /// Run this many poll cycles, then exit.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub cycles: Option<u64>,
}

impl BridgeArgs {
    /// Parse CLI arguments with a default config path.
    ///
    /// If no `--config` argument is provided, uses the default.
    pub fn parse_with_default(default_config: &'static str) -> Self {
        let matches = <Self as clap::CommandFactory>::command()
            .mut_arg("config", |arg| arg.default_value(default_config))
            .get_matches();

        <Self as clap::FromArgMatches>::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// Parse CLI arguments (requires --config to be specified).
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Apply the CLI overrides to the configured logging settings.
    pub fn logging(&self, configured: &LoggingConfig) -> LoggingConfig {
        LoggingConfig {
            level: self
                .log_level
                .clone()
                .unwrap_or_else(|| configured.level.clone()),
            format: if self.log_json {
                LogFormat::Json
            } else {
                configured.format
            },
        }
    }
}
