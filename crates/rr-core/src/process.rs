//! Process runner
//!
//! [`ProcessRunner`] starts commands as child processes whose standard streams
//! are inherited from the orchestrator, so remote output shows up live on the
//! operator's console. [`DryRunExecutor`] prints commands instead of running them.

use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::ProcessError;
use crate::traits::Executor;
use crate::types::{Completion, Invocation, RunResult};

/// Executes commands as local child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

/// A started child process together with the command that started it
#[derive(Debug)]
pub struct ProcessHandle {
    invocation: Invocation,
    child: Child,
}

impl ProcessHandle {
    /// OS process id, if the child has not been reaped yet
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }
}

#[async_trait]
impl Executor for ProcessRunner {
    type Handle = ProcessHandle;

    fn spawn(&self, invocation: Invocation) -> Result<ProcessHandle, ProcessError> {
        let stdin = if invocation.detaches_stdin() {
            Stdio::null()
        } else {
            Stdio::inherit()
        };

        // Children are not killed on drop; an abandoned phase runs to completion.
        let spawned = Command::new(invocation.program())
            .args(invocation.arguments())
            .stdin(stdin)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false)
            .spawn();

        match spawned {
            Ok(child) => {
                debug!(pid = ?child.id(), command = %invocation, "Spawned process");
                Ok(ProcessHandle { invocation, child })
            }
            Err(error) => Err(ProcessError::Spawn {
                command: invocation,
                error,
            }),
        }
    }

    async fn wait(&self, handle: ProcessHandle) -> Result<RunResult, ProcessError> {
        let ProcessHandle {
            invocation,
            mut child,
        } = handle;

        match child.wait().await {
            Ok(status) => {
                let completion = Completion::from(status);
                debug!(command = %invocation, %completion, "Process finished");
                Ok(RunResult::new(invocation, completion))
            }
            Err(error) => Err(ProcessError::Wait {
                command: invocation,
                error,
            }),
        }
    }
}

/// Prints every command instead of executing it
///
/// Every command is reported as successful. Issued commands are kept in
/// order and can be inspected with [`DryRunExecutor::issued`].
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    issued: Mutex<Vec<Invocation>>,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands issued so far, in issue order
    pub fn issued(&self) -> Vec<Invocation> {
        self.issued
            .lock()
            .map(|issued| issued.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Executor for DryRunExecutor {
    type Handle = Invocation;

    fn spawn(&self, invocation: Invocation) -> Result<Invocation, ProcessError> {
        println!("{}", invocation);
        if let Ok(mut issued) = self.issued.lock() {
            issued.push(invocation.clone());
        }
        Ok(invocation)
    }

    async fn wait(&self, handle: Invocation) -> Result<RunResult, ProcessError> {
        Ok(RunResult::new(handle, Completion::Success))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_run_success() {
        let result = ProcessRunner::new().run(sh("exit 0")).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.command(), &sh("exit 0"));
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let result = ProcessRunner::new().run(sh("exit 3")).await.unwrap();
        assert_eq!(result.completion(), Completion::Exited(3));

        let err = result.into_success().unwrap_err();
        assert!(err.to_string().contains("exit status 3"));
        assert!(err.to_string().contains("sh -c 'exit 3'"));
    }

    #[tokio::test]
    async fn test_run_signaled() {
        let result = ProcessRunner::new().run(sh("kill -9 $$")).await.unwrap();
        assert_eq!(result.completion(), Completion::Signaled(9));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let err = ProcessRunner::new()
            .spawn(Invocation::new("rr-definitely-not-a-program"))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert_eq!(err.command().program(), "rr-definitely-not-a-program");
    }

    #[tokio::test]
    async fn test_detached_stdin_reads_eof() {
        let result = ProcessRunner::new()
            .run(sh("if read -r line; then exit 1; fi").without_stdin())
            .await
            .unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_handle_keeps_invocation() {
        let runner = ProcessRunner::new();
        let handle = runner.spawn(sh("exit 0")).unwrap();
        assert!(handle.id().is_some());
        assert_eq!(handle.invocation(), &sh("exit 0"));
        runner.wait(handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_dry_run_records_in_order() {
        let executor = DryRunExecutor::new();
        executor.run(Invocation::new("first")).await.unwrap();
        executor.run(Invocation::new("second")).await.unwrap();

        let issued = executor.issued();
        assert_eq!(issued.len(), 2);
        assert_eq!(issued[0].program(), "first");
        assert_eq!(issued[1].program(), "second");
    }
}
