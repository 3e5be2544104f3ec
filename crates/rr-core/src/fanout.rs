//! Fan-out coordinator
//!
//! Runs one command per host concurrently and waits for all of them.
//!
//! # Ordering
//!
//! Commands are issued in host order and then waited on in that same order.
//! The first failure seen while waiting ends the phase, so the reported
//! failure is always the failing host with the lowest index, regardless of
//! which process actually finished first.
//!
//! Commands still running when the phase fails are left to finish on their
//! own. They are neither killed nor waited for.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{FanOutError, ProcessError};
use crate::traits::Executor;
use crate::types::{Host, Invocation};

/// The remote phases of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Stop the previous instance and remove its binary
    KillStale,
    /// Copy the fresh binary to every host
    Upload,
    /// Start the binary in a terminal window per host
    Launch,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::KillStale => write!(f, "kill-stale"),
            Phase::Upload => write!(f, "upload"),
            Phase::Launch => write!(f, "launch"),
        }
    }
}

/// Issues one command per host through an [`Executor`]
pub struct FanOut<'a, E: Executor> {
    executor: &'a E,
    phase: Phase,
    stagger: Option<Duration>,
}

impl<'a, E: Executor> FanOut<'a, E> {
    pub fn new(executor: &'a E, phase: Phase) -> Self {
        Self {
            executor,
            phase,
            stagger: None,
        }
    }

    /// Pause between successive launches (not between completions)
    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = (!stagger.is_zero()).then_some(stagger);
        self
    }

    /// Build and start a command for every host, then wait for all of them
    ///
    /// `build` receives the host, its index and the host count.
    pub async fn run<F>(&self, hosts: &[Host], mut build: F) -> Result<(), FanOutError>
    where
        F: FnMut(&Host, usize, usize) -> Invocation,
    {
        let total = hosts.len();
        info!(phase = %self.phase, hosts = total, "Starting fan-out");

        let mut pending = Vec::with_capacity(total);
        for (index, host) in hosts.iter().enumerate() {
            if index > 0 {
                if let Some(stagger) = self.stagger {
                    tokio::time::sleep(stagger).await;
                }
            }

            let invocation = build(host, index, total);
            debug!(phase = %self.phase, %host, index, command = %invocation, "Issuing command");

            let handle = self
                .executor
                .spawn(invocation)
                .map_err(|error| self.failure(host, index, error))?;
            pending.push((index, host, handle));
        }

        for (index, host, handle) in pending {
            let result = self
                .executor
                .wait(handle)
                .await
                .map_err(|error| self.failure(host, index, error))?;
            result
                .into_success()
                .map_err(|error| self.failure(host, index, error))?;
        }

        info!(phase = %self.phase, "Fan-out complete");
        Ok(())
    }

    fn failure(&self, host: &Host, index: usize, error: ProcessError) -> FanOutError {
        warn!(phase = %self.phase, %host, index, %error, "Remote command failed");
        FanOutError {
            phase: self.phase,
            host: host.clone(),
            index,
            error,
        }
    }
}
