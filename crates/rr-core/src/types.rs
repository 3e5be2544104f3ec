//! Core domain types

use std::fmt;
use std::process::ExitStatus;

use crate::error::{HostError, ProcessError};

/// Address of one remote target (IP or hostname)
///
/// The address is always handed to ssh/scp as a single argument token and
/// never spliced into a local shell line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host(String);

impl Host {
    /// Validate and wrap a host address
    pub fn parse(address: impl Into<String>) -> Result<Self, HostError> {
        let address = address.into();
        if address.is_empty() {
            return Err(HostError::Empty);
        }
        if address.starts_with('-') {
            return Err(HostError::LeadingDash(address));
        }
        Ok(Self(address))
    }

    /// Get the raw address
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Destination token for ssh/scp, `user@host` or the bare host
    pub fn target(&self, user: &str) -> String {
        if user.is_empty() {
            self.0.clone()
        } else {
            format!("{}@{}", user, self.0)
        }
    }

    /// Destination prefix for scp, with IPv6 literals in brackets
    ///
    /// scp splits `host:path` at the first colon, so `fe80::1` must be
    /// written as `[fe80::1]`.
    pub fn scp_target(&self, user: &str) -> String {
        let host = if self.0.contains(':') {
            format!("[{}]", self.0)
        } else {
            self.0.clone()
        };
        if user.is_empty() {
            host
        } else {
            format!("{}@{}", user, host)
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flags forwarded verbatim to every remote launch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(Vec<String>);

impl Flags {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A command as a program plus argument tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    detach_stdin: bool,
}

impl Invocation {
    /// Create an invocation with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            detach_stdin: false,
        }
    }

    /// Build an invocation from a token list; the first token is the program
    pub fn from_tokens<I, S>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = tokens.into_iter().map(Into::into);
        let program = tokens.next()?;
        Some(Self {
            program,
            args: tokens.collect(),
            detach_stdin: false,
        })
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run with stdin from the null device instead of the operator's terminal
    pub fn without_stdin(mut self) -> Self {
        self.detach_stdin = true;
        self
    }

    pub fn detaches_stdin(&self) -> bool {
        self.detach_stdin
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// All tokens, program first
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", shell_quote(token))?;
        }
        Ok(())
    }
}

/// Quote a token so a POSIX shell reads it back as exactly one word
///
/// Tokens made only of safe characters are returned unchanged. Used both for
/// display and for arguments that ssh hands to the remote shell.
pub fn shell_quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@=,+%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

/// How a process finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Exit status zero
    Success,
    /// Non-zero exit status
    Exited(i32),
    /// Terminated by a signal
    Signaled(i32),
    /// Neither an exit code nor a signal was reported
    Unknown,
}

impl Completion {
    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Success)
    }
}

impl From<ExitStatus> for Completion {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => Completion::Success,
            Some(code) => Completion::Exited(code),
            None => {
                #[cfg(unix)]
                {
                    use std::os::unix::process::ExitStatusExt;
                    if let Some(signal) = status.signal() {
                        return Completion::Signaled(signal);
                    }
                }
                Completion::Unknown
            }
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Success => write!(f, "exit status 0"),
            Completion::Exited(code) => write!(f, "exit status {}", code),
            Completion::Signaled(signal) => write!(f, "terminated by signal {}", signal),
            Completion::Unknown => write!(f, "unknown exit status"),
        }
    }
}

/// A finished command and how it completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    command: Invocation,
    completion: Completion,
}

impl RunResult {
    pub fn new(command: Invocation, completion: Completion) -> Self {
        Self {
            command,
            completion,
        }
    }

    pub fn command(&self) -> &Invocation {
        &self.command
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn is_success(&self) -> bool {
        self.completion.is_success()
    }

    /// Turn a non-successful completion into a [`ProcessError::Failed`]
    pub fn into_success(self) -> Result<Invocation, ProcessError> {
        if self.completion.is_success() {
            Ok(self.command)
        } else {
            Err(ProcessError::Failed {
                command: self.command,
                completion: self.completion,
            })
        }
    }
}
