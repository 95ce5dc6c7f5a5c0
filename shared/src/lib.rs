//! Salt Update Hook Shared Types
//!
//! This crate provides the command model, status report and HTTP codec used
//! by the update hook binary.

pub mod codec;
pub mod report;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use report::StatusReport;

/// Default values for the hook
pub mod defaults {
    /// Privilege elevation wrapper
    pub const SUDO_PATH: &str = "/usr/bin/sudo";

    /// Salt runner executable
    pub const SALT_RUN_PATH: &str = "/usr/bin/salt-run";

    /// Runner refreshing git pillar data
    pub const GIT_PILLAR_UPDATE: &str = "git_pillar.update";

    /// Runner refreshing the fileserver backends
    pub const FILESERVER_UPDATE: &str = "fileserver.update";

    /// Attempts per command before giving up
    pub const MAX_ATTEMPTS: u32 = 10;

    /// Fixed delay between attempts in milliseconds
    pub const RETRY_DELAY_MS: u64 = 1000;

    /// Listen address for the HTTP endpoint
    pub const BIND_ADDR: &str = "0.0.0.0:5000";
}

/// Errors raised while building the command model
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpecError {
    #[error("Command must contain at least one argument")]
    EmptyCommand,

    #[error("Retry policy needs at least one attempt")]
    ZeroAttempts,
}

/// An external command: executable path followed by its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    argv: Vec<String>,
}

impl CommandSpec {
    /// Create a command from its argument vector
    pub fn new<I, S>(argv: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Err(SpecError::EmptyCommand);
        }
        Ok(Self { argv })
    }

    /// Build `sudo salt-run <runner>`
    pub fn salt_run(runner: &str) -> Self {
        Self {
            argv: vec![
                defaults::SUDO_PATH.to_string(),
                defaults::SALT_RUN_PATH.to_string(),
                runner.to_string(),
            ],
        }
    }

    /// Executable to spawn
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments passed to the executable
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// Identifier used as the status report key (the subcommand)
    pub fn name(&self) -> &str {
        // argv is never empty
        self.argv.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self, SpecError> {
        if max_attempts == 0 {
            return Err(SpecError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            delay,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::MAX_ATTEMPTS,
            delay: Duration::from_millis(defaults::RETRY_DELAY_MS),
        }
    }
}

/// Result of a single command attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionOutcome {
    /// Exit code reported when the process never ran or died from a signal
    pub const NO_EXIT_CODE: i32 = -1;

    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Outcome for a command that could not be started at all
    pub fn spawn_failure(error: impl fmt::Display) -> Self {
        Self {
            exit_code: Self::NO_EXIT_CODE,
            stdout: String::new(),
            stderr: format!("failed to start command: {}", error),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
