//! Update handler - runs the sync commands and builds the status report

use super::CommandRunner;
use salt_update_shared::report::{failure_message, success_message};
use salt_update_shared::{CommandSpec, StatusReport};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the configured command list in order for each update request
#[derive(Clone)]
pub struct UpdateHandler {
    commands: Arc<[CommandSpec]>,
    runner: CommandRunner,
}

impl UpdateHandler {
    /// Create a new update handler
    pub fn new(commands: Vec<CommandSpec>, runner: CommandRunner) -> Self {
        Self {
            commands: commands.into(),
            runner,
        }
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Run every command sequentially and report on each one.
    ///
    /// A failing command never stops the ones after it.
    pub async fn handle(&self) -> StatusReport {
        let max_attempts = self.runner.policy().max_attempts();
        let mut report = StatusReport::new();

        for command in self.commands.iter() {
            let outcome = self.runner.run_with_retry(command).await;

            let message = if outcome.success() {
                success_message(command, &outcome)
            } else {
                failure_message(command, max_attempts, &outcome)
            };
            report.insert(command.name(), message);
        }

        if report.is_empty() {
            warn!("Update finished with no commands configured");
        } else {
            info!("Update finished: {} command(s) reported", report.len());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedLauncher;
    use salt_update_shared::{defaults, ExecutionOutcome, RetryPolicy};
    use std::time::Duration;
    use tokio::time::Instant;

    const PILLAR: &str = defaults::GIT_PILLAR_UPDATE;
    const FILESERVER: &str = defaults::FILESERVER_UPDATE;

    fn handler(launcher: &Arc<ScriptedLauncher>, policy: RetryPolicy) -> UpdateHandler {
        UpdateHandler::new(
            vec![
                CommandSpec::salt_run(PILLAR),
                CommandSpec::salt_run(FILESERVER),
            ],
            CommandRunner::new(launcher.clone(), policy),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_succeed() {
        let launcher = Arc::new(
            ScriptedLauncher::new()
                .succeeding(PILLAR, "pillar ok")
                .succeeding(FILESERVER, "ok"),
        );
        let report = handler(&launcher, RetryPolicy::default()).handle().await;

        assert_eq!(report.names().collect::<Vec<_>>(), [PILLAR, FILESERVER]);
        assert_eq!(
            report.get(FILESERVER),
            Some("Command '/usr/bin/sudo /usr/bin/salt-run fileserver.update' executed successfully:\nok")
        );
        assert_eq!(
            report.body(),
            "Command '/usr/bin/sudo /usr/bin/salt-run git_pillar.update' executed successfully:\npillar ok\n\
             Command '/usr/bin/sudo /usr/bin/salt-run fileserver.update' executed successfully:\nok"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_later_commands() {
        let launcher = Arc::new(
            ScriptedLauncher::new()
                .failing(PILLAR, "", "remote unreachable")
                .succeeding(FILESERVER, "ok"),
        );

        let start = Instant::now();
        let report = handler(&launcher, RetryPolicy::default()).handle().await;

        assert_eq!(launcher.calls_for(PILLAR), 10);
        assert_eq!(launcher.calls_for(FILESERVER), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(9));

        let pillar = report.get(PILLAR).unwrap();
        assert!(pillar.starts_with("Error executing command '/usr/bin/sudo /usr/bin/salt-run git_pillar.update' after 10 attempts:\n"));
        assert!(pillar.ends_with("remote unreachable"));
        assert!(report.get(FILESERVER).unwrap().contains("executed successfully"));
        assert_eq!(report.names().collect::<Vec<_>>(), [PILLAR, FILESERVER]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_run_in_order() {
        let launcher = Arc::new(
            ScriptedLauncher::new()
                .script(
                    PILLAR,
                    vec![
                        ExecutionOutcome::new(1, "", "busy"),
                        ExecutionOutcome::new(0, "", ""),
                    ],
                )
                .succeeding(FILESERVER, ""),
        );
        handler(&launcher, RetryPolicy::default()).handle().await;

        let order: Vec<String> = launcher.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(order, [PILLAR, PILLAR, FILESERVER]);
    }

    #[tokio::test]
    async fn test_empty_command_list() {
        let launcher = Arc::new(ScriptedLauncher::new());
        let handler = UpdateHandler::new(
            Vec::new(),
            CommandRunner::new(launcher.clone(), RetryPolicy::default()),
        );

        let report = handler.handle().await;
        assert!(report.is_empty());
        assert_eq!(report.body(), "");
        assert!(launcher.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_message_uses_configured_attempts() {
        let launcher = Arc::new(
            ScriptedLauncher::new()
                .failing(PILLAR, "", "")
                .failing(FILESERVER, "", ""),
        );
        let policy = RetryPolicy::new(3, Duration::from_secs(1)).unwrap();
        let report = handler(&launcher, policy).handle().await;

        assert_eq!(report.len(), 2);
        for name in [PILLAR, FILESERVER] {
            let message = report.get(name).unwrap();
            assert!(message.contains("after 3 attempts"));
            assert!(message.ends_with("No error message received."));
            assert_eq!(launcher.calls_for(name), 3);
        }
    }
}
