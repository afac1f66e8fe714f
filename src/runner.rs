// ABOUTME: Narrow command-execution boundary used by the export pipeline
// ABOUTME: Runs a shell command line, captures stdout, or fails with a tagged error

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Failure of a single external invocation.
///
/// Every variant carries the caller-supplied failure message so the error
/// reads in terms of what was being attempted.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{message}: could not start `{command}`: {source}")]
    Spawn {
        message: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{message}: `{command}` exited with {}: {stderr}", exit_code_label(.code))]
    NonZeroExit {
        message: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("{message}: `{command}` timed out after {timeout:?}")]
    TimedOut {
        message: String,
        command: String,
        timeout: Duration,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (killed by signal)".to_string(),
    }
}

impl CommandError {
    /// The failure message supplied by the caller.
    pub fn message(&self) -> &str {
        match self {
            CommandError::Spawn { message, .. }
            | CommandError::NonZeroExit { message, .. }
            | CommandError::TimedOut { message, .. } => message,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::TimedOut { .. })
    }

    /// The full command line that failed.
    pub fn command(&self) -> &str {
        match self {
            CommandError::Spawn { command, .. }
            | CommandError::NonZeroExit { command, .. }
            | CommandError::TimedOut { command, .. } => command,
        }
    }
}

/// Join command tokens the way they are handed to the shell.
///
/// Tokens may themselves contain spaces (`"accounts list"`); they are joined
/// with a single space and never quoted.
pub fn command_line<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Execute-and-capture-or-fail.
///
/// Implementations never retry; a failed invocation is reported once.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `tokens` joined by single spaces and return captured stdout.
    async fn run(&self, tokens: &[String], failure_message: &str) -> Result<String, CommandError>;
}

/// Runs command lines through `sh -c` on the host.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the child if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, tokens: &[String], failure_message: &str) -> Result<String, CommandError> {
        let line = command_line(tokens);
        tracing::debug!("Running: {}", line);

        let child = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                message: failure_message.to_string(),
                command: line.clone(),
                source,
            })?;

        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await
            {
                Ok(result) => result,
                Err(_) => {
                    return Err(CommandError::TimedOut {
                        message: failure_message.to_string(),
                        command: line,
                        timeout,
                    })
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|source| CommandError::Spawn {
            message: failure_message.to_string(),
            command: line.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                message: failure_message.to_string(),
                command: line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
