//! Process execution trait

use async_trait::async_trait;

use crate::error::ProcessError;
use crate::types::{Invocation, RunResult};

/// Abstraction over starting external commands and waiting for them
///
/// `spawn` must not block on the command finishing. The handle it returns
/// keeps the originating [`Invocation`] so a later failure can name it.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Handle to a started command
    type Handle: Send;

    /// Start a command without waiting for it
    fn spawn(&self, invocation: Invocation) -> Result<Self::Handle, ProcessError>;

    /// Wait for a started command to finish
    async fn wait(&self, handle: Self::Handle) -> Result<RunResult, ProcessError>;

    /// Run a command to completion
    async fn run(&self, invocation: Invocation) -> Result<RunResult, ProcessError> {
        let handle = self.spawn(invocation)?;
        self.wait(handle).await
    }
}
