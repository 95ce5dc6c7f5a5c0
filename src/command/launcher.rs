//! Process launching abstraction for pluggable execution backends

use async_trait::async_trait;
use salt_update_shared::{CommandSpec, ExecutionOutcome};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs a single attempt of an external command
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Run the command to completion and capture its result.
    ///
    /// Never fails: a command that cannot be started is reported as an
    /// unsuccessful outcome.
    async fn launch(&self, command: &CommandSpec) -> ExecutionOutcome;
}

/// Launcher spawning real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    async fn launch(&self, command: &CommandSpec) -> ExecutionOutcome {
        debug!("Spawning: {}", command);

        let output = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => ExecutionOutcome::new(
                output
                    .status
                    .code()
                    .unwrap_or(ExecutionOutcome::NO_EXIT_CODE),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr),
            ),
            Err(e) => ExecutionOutcome::spawn_failure(e),
        }
    }
}
