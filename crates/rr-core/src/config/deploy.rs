//! Deployment configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::terminal::{self, TerminalCandidate};
use crate::types::Invocation;

/// Configuration for one deployment run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Name of the deployed program, used to find and stop stale instances
    pub program: String,

    /// Local build step
    pub build: BuildConfig,

    /// How hosts are reached and where the binary lives on them
    pub remote: RemoteConfig,

    /// Launch phase settings
    pub launch: LaunchConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            program: "ip-juggler".to_string(),
            build: BuildConfig::default(),
            remote: RemoteConfig::default(),
            launch: LaunchConfig::default(),
        }
    }
}

impl DeployConfig {
    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.program.is_empty() {
            return Err(ConfigError::Invalid("program must not be empty".to_string()));
        }
        if self.build.command.is_empty() {
            return Err(ConfigError::Invalid(
                "build.command must name a program".to_string(),
            ));
        }
        if self.remote.binary_path.is_empty() {
            return Err(ConfigError::Invalid(
                "remote.binary_path must not be empty".to_string(),
            ));
        }
        if matches!(&self.launch.terminals, Some(list) if list.is_empty()) {
            return Err(ConfigError::Invalid(
                "launch.terminals must list at least one terminal".to_string(),
            ));
        }
        Ok(())
    }
}

/// Local build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build command as argument tokens
    pub command: Vec<String>,

    /// Path of the binary the build produces
    pub artifact: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: ["cargo", "build", "--release", "--target", "x86_64-unknown-linux-musl"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            artifact: PathBuf::from("target/x86_64-unknown-linux-musl/release/ip-juggler"),
        }
    }
}

impl BuildConfig {
    /// The build command, if one is configured
    pub fn invocation(&self) -> Option<Invocation> {
        Invocation::from_tokens(self.command.iter().cloned())
    }
}

/// Remote access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Login user; empty means ssh's default
    pub user: String,

    /// Fixed path of the deployed binary on every host
    pub binary_path: String,

    /// Remote shell program
    pub ssh: String,

    /// Remote copy program
    pub scp: String,

    /// Extra ssh options, placed before the destination
    pub ssh_options: Vec<String>,

    /// Extra scp options, kept apart because scp spells some flags
    /// differently (`-P` for the port where ssh uses `-p`)
    pub scp_options: Vec<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            binary_path: "/root/ip-juggler".to_string(),
            ssh: "ssh".to_string(),
            scp: "scp".to_string(),
            ssh_options: Vec::new(),
            scp_options: Vec::new(),
        }
    }
}

/// Launch phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Delay between successive window launches; zero disables it
    #[serde(rename = "stagger_ms", with = "super::serde_utils::duration_millis")]
    pub stagger: Duration,

    /// Terminal preference list overriding the built-in one
    pub terminals: Option<Vec<TerminalCandidate>>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            stagger: Duration::from_millis(200),
            terminals: None,
        }
    }
}

impl LaunchConfig {
    /// Configured terminals, or the built-in preference list
    pub fn terminal_candidates(&self) -> Vec<TerminalCandidate> {
        self.terminals
            .clone()
            .unwrap_or_else(terminal::default_candidates)
    }
}
