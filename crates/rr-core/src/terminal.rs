//! Terminal emulator resolution
//!
//! Launched participants each run in their own terminal window so the
//! operator can watch them. The window must stay open after the command
//! exits, otherwise a crash would close it before anyone could read why.

use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TerminalError;
use crate::types::Invocation;

/// A terminal program plus the flags that open a new window and keep it
/// open after the wrapped command exits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalCandidate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl TerminalCandidate {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Built-in preference list, most preferred first
pub fn default_candidates() -> Vec<TerminalCandidate> {
    vec![
        TerminalCandidate::new("konsole", &["--separate", "--hold", "-e"]),
        TerminalCandidate::new("alacritty", &["--hold", "-e"]),
        TerminalCandidate::new("kitty", &["--hold"]),
        TerminalCandidate::new("foot", &["--hold"]),
        TerminalCandidate::new("xfce4-terminal", &["--hold", "-x"]),
        TerminalCandidate::new("xterm", &["-hold", "-e"]),
        TerminalCandidate::new("urxvt", &["-hold", "-e"]),
    ]
}

/// A resolved terminal: the located program and its wrapper flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSpec {
    program: PathBuf,
    args: Vec<String>,
}

impl TerminalSpec {
    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Prefix `command` so it runs in a new, persistent terminal window
    pub fn wrap(&self, command: &Invocation) -> Invocation {
        Invocation::new(self.program.to_string_lossy())
            .args(self.args.iter().cloned())
            .args(command.tokens())
    }
}

/// Finds the first available terminal from a preference list
#[derive(Debug, Clone)]
pub struct TerminalResolver {
    candidates: Vec<TerminalCandidate>,
    search_path: Option<OsString>,
}

impl TerminalResolver {
    /// Resolver over `candidates`, searching `PATH`
    pub fn new(candidates: Vec<TerminalCandidate>) -> Self {
        Self {
            candidates,
            search_path: None,
        }
    }

    /// Search the given path list instead of `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Return the first candidate whose program exists on the search path
    pub fn resolve(&self) -> Result<TerminalSpec, TerminalError> {
        for candidate in &self.candidates {
            match self.locate(&candidate.program) {
                Some(program) => {
                    debug!(terminal = %candidate.program, path = %program.display(), "Found terminal");
                    return Ok(TerminalSpec {
                        program,
                        args: candidate.args.clone(),
                    });
                }
                None => debug!(terminal = %candidate.program, "Terminal not available"),
            }
        }

        Err(TerminalError::NoTerminalFound {
            candidates: self.candidates.iter().map(|c| c.program.clone()).collect(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(program, Some(paths), cwd).ok()
            }
            None => which::which(program).ok(),
        }
    }
}
