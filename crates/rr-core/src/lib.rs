//! rr-core: Parallel remote-execution engine for run-remote
//!
//! This crate provides the pieces the deployment driver is assembled from:
//! a process runner behind the [`Executor`] trait, the fan-out coordinator
//! that runs one command per host concurrently, the terminal resolver, and
//! the configuration and error types shared with the CLI.

pub mod config;
pub mod error;
pub mod fanout;
pub mod process;
pub mod terminal;
pub mod traits;
pub mod types;

pub use config::DeployConfig;
pub use error::{DeployError, FanOutError, ProcessError, TerminalError};
pub use fanout::{FanOut, Phase};
pub use process::{DryRunExecutor, ProcessHandle, ProcessRunner};
pub use terminal::{TerminalCandidate, TerminalResolver, TerminalSpec};
pub use traits::Executor;
pub use types::{shell_quote, Completion, Flags, Host, Invocation, RunResult};
