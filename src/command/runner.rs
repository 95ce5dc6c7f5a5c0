//! Retry loop around a single external command

use super::ProcessLauncher;
use salt_update_shared::{CommandSpec, ExecutionOutcome, RetryPolicy};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Runs commands, retrying non-zero exits with a fixed delay
#[derive(Clone)]
pub struct CommandRunner {
    launcher: Arc<dyn ProcessLauncher>,
    policy: RetryPolicy,
}

impl CommandRunner {
    /// Create a new command runner
    pub fn new(launcher: Arc<dyn ProcessLauncher>, policy: RetryPolicy) -> Self {
        Self { launcher, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run a command until it exits 0 or the attempts are used up.
    ///
    /// Returns the first successful outcome, or the outcome of the last
    /// attempt. The delay between attempts is an async sleep, so other
    /// requests keep being served while a command waits for its retry.
    pub async fn run_with_retry(&self, command: &CommandSpec) -> ExecutionOutcome {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let outcome = self.launcher.launch(command).await;

            if outcome.success() {
                info!(
                    "Command '{}' succeeded (attempt {}/{})",
                    command, attempt, max_attempts
                );
                return outcome;
            }

            warn!(
                exit_code = outcome.exit_code,
                stdout = %outcome.stdout.trim_end(),
                stderr = %outcome.stderr.trim_end(),
                "Command '{}' failed (attempt {}/{})",
                command,
                attempt,
                max_attempts
            );

            if attempt >= max_attempts {
                error!(
                    "Command '{}' failed after {} attempts",
                    command, max_attempts
                );
                return outcome;
            }

            info!("Retrying in {:?}...", self.policy.delay());
            sleep(self.policy.delay()).await;
            attempt += 1;
        }
    }
}
