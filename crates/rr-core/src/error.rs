//! Core error types for run-remote

use std::path::PathBuf;
use thiserror::Error;

use crate::fanout::Phase;
use crate::types::{Completion, Host, Invocation};

/// Top-level error type for a deployment run
#[derive(Error, Debug)]
pub enum DeployError {
    /// Operator input could not be used; usage guidance should be shown
    #[error("{0}")]
    Usage(String),

    /// Local build toolchain failed
    #[error("Build failed: {0}")]
    Build(ProcessError),

    /// Build succeeded but produced no artifact at the configured path
    #[error("Build artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// A command in one of the remote phases failed
    #[error(transparent)]
    RemoteCommand(#[from] FanOutError),

    /// No terminal emulator could be located
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure of a single external command
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The program could not be started at all
    #[error("Failed to start `{command}`: {error}")]
    Spawn {
        command: Invocation,
        error: std::io::Error,
    },

    /// Waiting on a started process failed
    #[error("Failed to wait for `{command}`: {error}")]
    Wait {
        command: Invocation,
        error: std::io::Error,
    },

    /// The process ran and did not succeed
    #[error("Command failed: `{command}`: {completion}")]
    Failed {
        command: Invocation,
        completion: Completion,
    },
}

impl ProcessError {
    /// The command this error originated from
    pub fn command(&self) -> &Invocation {
        match self {
            ProcessError::Spawn { command, .. }
            | ProcessError::Wait { command, .. }
            | ProcessError::Failed { command, .. } => command,
        }
    }
}

/// A remote command failure, tagged with the phase and host it belongs to
#[derive(Error, Debug)]
#[error("{phase} failed on {host} (index {index}): {error}")]
pub struct FanOutError {
    /// Phase the failing command was issued in
    pub phase: Phase,
    /// Host the failing command targeted
    pub host: Host,
    /// Ordinal index of that host
    pub index: usize,
    /// Underlying process failure
    pub error: ProcessError,
}

/// Terminal resolution errors
#[derive(Error, Debug)]
pub enum TerminalError {
    /// None of the candidate programs exist on the search path
    #[error("No terminal emulator found (tried: {})", .candidates.join(", "))]
    NoTerminalFound { candidates: Vec<String> },
}

/// Host list validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HostError {
    /// Empty address token
    #[error("Host address is empty")]
    Empty,

    /// Address that would be read as an option by ssh/scp
    #[error("Host address must not start with '-': {0}")]
    LeadingDash(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}
