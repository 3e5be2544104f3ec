//! Orchestrator options
//!
//! The whole command line belongs to forwarded flags and hosts, so the
//! orchestrator's own settings are read from the environment only.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::Parser;

/// Settings taken from `RUN_REMOTE_*` environment variables
#[derive(Debug, Clone, Parser)]
#[command(name = "run-remote", no_binary_name = true)]
pub struct EnvOptions {
    /// Path to configuration file
    #[arg(long, env = "RUN_REMOTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "RUN_REMOTE_LOG", default_value = "warn")]
    pub log: String,

    /// Suppress all logging except errors
    #[arg(long, env = "RUN_REMOTE_QUIET", value_parser = FalseyValueParser::new())]
    pub quiet: bool,

    /// Print commands instead of running them
    #[arg(long, env = "RUN_REMOTE_DRY_RUN", value_parser = FalseyValueParser::new())]
    pub dry_run: bool,
}

impl EnvOptions {
    /// Read options from the process environment
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::try_parse_from(std::iter::empty::<String>())
    }

    /// Effective log filter directive
    pub fn log_level(&self) -> &str {
        if self.quiet {
            "error"
        } else {
            &self.log
        }
    }
}
