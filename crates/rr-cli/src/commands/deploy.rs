//! Deployment driver
//!
//! Runs the phases in a fixed order and stops at the first failure:
//! build, kill-stale, upload, resolve terminal, launch. Nothing touches the
//! network until the build has succeeded.

use std::path::Path;

use tracing::info;

use rr_core::config::{DeployConfig, RemoteConfig};
use rr_core::{
    shell_quote, DeployError, Executor, FanOut, Flags, Host, Invocation, Phase, TerminalResolver,
};

use crate::args::DeployRequest;
use crate::output::{format_hosts, print_info};

/// Remote command that stops any running instance and deletes its binary
///
/// Both steps run regardless of whether the first one found anything, so a
/// host without a previous deployment is not a failure. The `;` is left
/// unquoted for the remote shell; everything else is quoted.
pub fn kill_stale_command(remote: &RemoteConfig, program: &str, host: &Host) -> Invocation {
    Invocation::new(&remote.ssh)
        .args(remote.ssh_options.iter().cloned())
        .arg(host.target(&remote.user))
        .args(["killall".to_string(), "-q".to_string(), shell_quote(program)])
        .arg(";")
        .args(["rm".to_string(), "-f".to_string(), shell_quote(&remote.binary_path)])
        .without_stdin()
}

/// Copy the built artifact to the fixed remote path
pub fn upload_command(remote: &RemoteConfig, artifact: &Path, host: &Host) -> Invocation {
    Invocation::new(&remote.scp)
        .arg("-q")
        .args(remote.scp_options.iter().cloned())
        .arg(artifact.to_string_lossy())
        .arg(format!("{}:{}", host.scp_target(&remote.user), remote.binary_path))
        .without_stdin()
}

/// The deployed program's own command line for participant `index` of `total`
pub fn participant_command(
    program: &str,
    total: usize,
    index: usize,
    flags: &Flags,
) -> Invocation {
    Invocation::new(program)
        .arg("--total-participants")
        .arg(total.to_string())
        .arg("--local-index")
        .arg(index.to_string())
        .args(flags.as_slice().iter().cloned())
}

/// Start a participant on `host` over ssh, before terminal wrapping
///
/// ssh joins its trailing arguments into one line for the remote shell, so
/// each participant token is quoted to arrive there as exactly one word.
pub fn launch_command(
    remote: &RemoteConfig,
    host: &Host,
    index: usize,
    total: usize,
    flags: &Flags,
) -> Invocation {
    let participant = participant_command(&remote.binary_path, total, index, flags);
    Invocation::new(&remote.ssh)
        .args(remote.ssh_options.iter().cloned())
        .arg(host.target(&remote.user))
        .args(participant.tokens().map(shell_quote))
}

/// Sequences the phases of a deployment over an [`Executor`]
pub struct Deployer<'a, E: Executor> {
    executor: &'a E,
    config: &'a DeployConfig,
    resolver: TerminalResolver,
    check_artifact: bool,
}

impl<'a, E: Executor> Deployer<'a, E> {
    pub fn new(executor: &'a E, config: &'a DeployConfig) -> Self {
        Self {
            executor,
            config,
            resolver: TerminalResolver::new(config.launch.terminal_candidates()),
            check_artifact: true,
        }
    }

    /// Use a specific terminal resolver
    pub fn with_resolver(mut self, resolver: TerminalResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Do not require the build artifact to exist (dry runs)
    pub fn skip_artifact_check(mut self) -> Self {
        self.check_artifact = false;
        self
    }

    /// Run every phase for `request`
    pub async fn deploy(&self, request: &DeployRequest) -> Result<(), DeployError> {
        let hosts = &request.hosts;
        let remote = &self.config.remote;
        info!(hosts = %format_hosts(hosts), "Deploying {}", self.config.program);

        print_info("Building binary");
        self.build().await?;

        print_info("Uploading binary");
        FanOut::new(self.executor, Phase::KillStale)
            .run(hosts, |host, _, _| {
                kill_stale_command(remote, &self.config.program, host)
            })
            .await?;

        let artifact = &self.config.build.artifact;
        FanOut::new(self.executor, Phase::Upload)
            .run(hosts, |host, _, _| upload_command(remote, artifact, host))
            .await?;

        let terminal = self.resolver.resolve()?;
        info!(terminal = %terminal.program().display(), "Using terminal");

        print_info("Running on all machines");
        FanOut::new(self.executor, Phase::Launch)
            .with_stagger(self.config.launch.stagger)
            .run(hosts, |host, index, total| {
                terminal.wrap(&launch_command(remote, host, index, total, &request.flags))
            })
            .await?;

        Ok(())
    }

    async fn build(&self) -> Result<(), DeployError> {
        let build = &self.config.build;
        let invocation = build.invocation().ok_or_else(|| {
            DeployError::Usage("No build command configured".to_string())
        })?;

        self.executor
            .run(invocation)
            .await
            .and_then(|result| result.into_success())
            .map_err(DeployError::Build)?;

        if self.check_artifact && !build.artifact.exists() {
            return Err(DeployError::ArtifactMissing(build.artifact.clone()));
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rr_core::{Completion, ProcessError, RunResult, TerminalCandidate};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Records every command and fails the ones whose tokens match `fail_on`
    #[derive(Default)]
    struct RecordingExecutor {
        issued: Mutex<Vec<Invocation>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingExecutor {
        fn failing_on(token: &'static str) -> Self {
            Self {
                fail_on: Some(token),
                ..Default::default()
            }
        }

        fn issued(&self) -> Vec<String> {
            self.issued
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl Executor for RecordingExecutor {
        type Handle = Invocation;

        fn spawn(&self, invocation: Invocation) -> Result<Invocation, ProcessError> {
            self.issued.lock().unwrap().push(invocation.clone());
            Ok(invocation)
        }

        async fn wait(&self, handle: Invocation) -> Result<RunResult, ProcessError> {
            let failed = self
                .fail_on
                .is_some_and(|token| handle.tokens().any(|t| t == token));
            let completion = if failed {
                Completion::Exited(1)
            } else {
                Completion::Success
            };
            Ok(RunResult::new(handle, completion))
        }
    }

    fn request(flags: &[&str], hosts: &[&str]) -> DeployRequest {
        DeployRequest {
            flags: Flags::new(flags.iter().map(|f| f.to_string()).collect()),
            hosts: hosts.iter().map(|h| Host::parse(*h).unwrap()).collect(),
        }
    }

    fn config() -> DeployConfig {
        let mut config = DeployConfig::default();
        config.launch.stagger = Duration::ZERO;
        config
    }

    fn fake_terminal(dir: &TempDir) -> TerminalResolver {
        let path = dir.path().join("rr-term");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        TerminalResolver::new(vec![TerminalCandidate::new("rr-term", &["--hold", "-e"])])
            .with_search_path(dir.path())
    }

    #[test]
    fn test_participant_command_scenario() {
        let flags = Flags::new(vec!["--mode".to_string(), "test".to_string()]);
        assert_eq!(
            participant_command("ip-juggler", 2, 0, &flags).to_string(),
            "ip-juggler --total-participants 2 --local-index 0 --mode test"
        );
        assert_eq!(
            participant_command("ip-juggler", 2, 1, &flags).to_string(),
            "ip-juggler --total-participants 2 --local-index 1 --mode test"
        );
    }

    #[test]
    fn test_kill_stale_command_is_compound() {
        let remote = RemoteConfig::default();
        let host = Host::parse("10.0.0.1").unwrap();
        assert_eq!(
            kill_stale_command(&remote, "ip-juggler", &host).to_string(),
            "ssh root@10.0.0.1 killall -q ip-juggler ';' rm -f /root/ip-juggler"
        );
    }

    #[test]
    fn test_upload_command() {
        let mut remote = RemoteConfig::default();
        remote.ssh_options = vec!["-p".to_string(), "2222".to_string()];
        remote.scp_options = vec!["-o".to_string(), "StrictHostKeyChecking=no".to_string()];
        let host = Host::parse("10.0.0.1").unwrap();
        assert_eq!(
            upload_command(&remote, Path::new("target/release/app"), &host).to_string(),
            "scp -q -o StrictHostKeyChecking=no target/release/app root@10.0.0.1:/root/ip-juggler"
        );
    }

    #[test]
    fn test_upload_command_brackets_ipv6_host() {
        let remote = RemoteConfig::default();
        let host = Host::parse("fe80::1").unwrap();
        let upload = upload_command(&remote, Path::new("target/release/app"), &host);
        assert_eq!(
            upload.arguments().last().map(String::as_str),
            Some("root@[fe80::1]:/root/ip-juggler")
        );
    }

    #[test]
    fn test_only_launch_keeps_stdin() {
        let remote = RemoteConfig::default();
        let host = Host::parse("10.0.0.1").unwrap();
        let artifact = Path::new("target/release/app");

        assert!(kill_stale_command(&remote, "ip-juggler", &host).detaches_stdin());
        assert!(upload_command(&remote, artifact, &host).detaches_stdin());
        assert!(!launch_command(&remote, &host, 0, 1, &Flags::default()).detaches_stdin());
    }

    #[test]
    fn test_launch_flags_arrive_as_single_words() {
        let remote = RemoteConfig::default();
        let host = Host::parse("10.0.0.1").unwrap();
        let flags = Flags::new(vec![
            "--name".to_string(),
            "two words".to_string(),
            "$(echo INJECTED)".to_string(),
        ]);
        let launch = launch_command(&remote, &host, 1, 2, &flags);

        // ssh joins everything after the destination with spaces for the remote shell
        let remote_line = launch.arguments()[1..].join(" ");
        let output = std::process::Command::new("sh")
            .args(["-c", &format!("printf '<%s>' {}", remote_line)])
            .output()
            .unwrap();

        assert_eq!(
            String::from_utf8(output.stdout).unwrap(),
            "</root/ip-juggler><--total-participants><2><--local-index><1>\
             <--name><two words><$(echo INJECTED)>"
        );
    }

    #[test]
    fn test_kill_stale_keeps_separator_for_remote_shell() {
        let remote = RemoteConfig::default();
        let host = Host::parse("10.0.0.1").unwrap();
        let kill = kill_stale_command(&remote, "my app", &host);
        assert!(kill.arguments().iter().any(|a| a == ";"));
        assert!(kill.arguments().iter().any(|a| a == "'my app'"));
    }

    #[tokio::test]
    async fn test_build_failure_prevents_remote_phases() {
        let executor = RecordingExecutor::failing_on("cargo");
        let config = config();
        let dir = TempDir::new().unwrap();

        let err = Deployer::new(&executor, &config)
            .with_resolver(fake_terminal(&dir))
            .deploy(&request(&[], &["a", "b"]))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Build(_)));
        assert_eq!(executor.issued().len(), 1);
        assert!(executor.issued()[0].starts_with("cargo build"));
    }

    #[tokio::test]
    async fn test_missing_artifact_prevents_remote_phases() {
        let executor = RecordingExecutor::default();
        let mut config = config();
        config.build.artifact = "definitely/not/built".into();

        let err = Deployer::new(&executor, &config)
            .deploy(&request(&[], &["a"]))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::ArtifactMissing(_)));
        assert_eq!(executor.issued().len(), 1);
    }

    #[tokio::test]
    async fn test_full_deployment_order_and_launch_arguments() {
        let executor = RecordingExecutor::default();
        let config = config();
        let dir = TempDir::new().unwrap();
        let terminal = dir.path().join("rr-term");

        Deployer::new(&executor, &config)
            .with_resolver(fake_terminal(&dir))
            .skip_artifact_check()
            .deploy(&request(&["--mode", "test"], &["a", "b", "c"]))
            .await
            .unwrap();

        let issued = executor.issued();
        assert_eq!(issued.len(), 1 + 3 * 3);
        assert!(issued[0].starts_with("cargo build"));
        for i in 1..4 {
            assert!(issued[i].contains("killall -q ip-juggler"));
        }
        for i in 4..7 {
            assert!(issued[i].starts_with("scp -q"));
        }
        for (i, host) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(
                issued[7 + i],
                format!(
                    "{} --hold -e ssh root@{} /root/ip-juggler --total-participants 3 --local-index {} --mode test",
                    terminal.display(),
                    host,
                    i
                )
            );
        }
    }

    #[tokio::test]
    async fn test_upload_failure_prevents_launch() {
        let executor = RecordingExecutor::failing_on("scp");
        let config = config();
        let dir = TempDir::new().unwrap();

        let err = Deployer::new(&executor, &config)
            .with_resolver(fake_terminal(&dir))
            .skip_artifact_check()
            .deploy(&request(&[], &["a", "b"]))
            .await
            .unwrap_err();

        match err {
            DeployError::RemoteCommand(failure) => {
                assert_eq!(failure.phase, Phase::Upload);
                assert_eq!(failure.index, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!executor.issued().iter().any(|c| c.contains("--local-index")));
    }

    #[tokio::test]
    async fn test_missing_terminal_fails_before_launch() {
        let executor = RecordingExecutor::default();
        let config = config();
        let dir = TempDir::new().unwrap();
        let resolver = TerminalResolver::new(vec![TerminalCandidate::new("rr-absent", &[])])
            .with_search_path(dir.path());

        let err = Deployer::new(&executor, &config)
            .with_resolver(resolver)
            .skip_artifact_check()
            .deploy(&request(&[], &["a"]))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Terminal(_)));
        assert!(err.to_string().contains("rr-absent"));
        assert!(!executor.issued().iter().any(|c| c.contains("--local-index")));
    }
}
