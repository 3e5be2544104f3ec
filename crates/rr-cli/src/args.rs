//! Operator argument handling
//!
//! The command line is `<flags> -- <hosts>`. Everything before the `--`
//! delimiter is forwarded untouched to every launched instance, everything
//! after it is a host address.

use rr_core::{DeployError, Flags, Host};

/// Token separating forwarded flags from hosts
pub const DELIMITER: &str = "--";

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedArgs {
    /// Print usage and exit successfully
    Help,
    /// Deploy to the given hosts
    Deploy(DeployRequest),
}

/// Hosts to deploy to and the flags every instance receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub flags: Flags,
    pub hosts: Vec<Host>,
}

/// Usage text shown for `--help` and on usage errors
pub fn usage() -> String {
    format!(
        "Usage: run-remote <flags> {DELIMITER} <hosts>

Builds the program, uploads it to every host and launches it in a terminal
window per host. Flags are forwarded verbatim to every instance.
Flags added automatically: --total-participants and --local-index

Environment:
  RUN_REMOTE_CONFIG   config file (default: ./run-remote.toml if present)
  RUN_REMOTE_LOG      log level (default: warn)
  RUN_REMOTE_QUIET    only log errors
  RUN_REMOTE_DRY_RUN  print commands instead of running them"
    )
}

fn is_help(arg: &str) -> bool {
    arg == "-h" || arg.ends_with("--help")
}

/// Split operator tokens into forwarded flags and hosts
///
/// A help token anywhere wins. Missing or malformed hosts are a
/// [`DeployError::Usage`].
pub fn parse_args<I, S>(args: I) -> Result<ParsedArgs, DeployError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut flags = Vec::new();
    let mut hosts = Vec::new();
    let mut delimiter_seen = false;

    for arg in args {
        let arg = arg.into();
        if arg == DELIMITER {
            delimiter_seen = true;
        } else if is_help(&arg) {
            return Ok(ParsedArgs::Help);
        } else if delimiter_seen {
            hosts.push(arg);
        } else {
            flags.push(arg);
        }
    }

    if hosts.is_empty() {
        return Err(DeployError::Usage("No hosts given".to_string()));
    }

    let hosts = hosts
        .into_iter()
        .map(Host::parse)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DeployError::Usage(e.to_string()))?;

    Ok(ParsedArgs::Deploy(DeployRequest {
        flags: Flags::new(flags),
        hosts,
    }))
}
