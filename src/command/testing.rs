//! Scripted launcher for exercising retry and reporting logic without
//! spawning processes

use super::ProcessLauncher;
use async_trait::async_trait;
use salt_update_shared::{CommandSpec, ExecutionOutcome};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::Instant;

/// Replays scripted outcomes per command name; the last outcome repeats
#[derive(Default)]
pub struct ScriptedLauncher {
    scripts: Mutex<HashMap<String, Vec<ExecutionOutcome>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, name: &str, outcomes: Vec<ExecutionOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(name.to_string(), outcomes);
        self
    }

    /// Command always exits 0 with the given stdout
    pub fn succeeding(self, name: &str, stdout: &str) -> Self {
        self.script(name, vec![ExecutionOutcome::new(0, stdout, "")])
    }

    /// Command always exits 1 with the given output
    pub fn failing(self, name: &str, stdout: &str, stderr: &str) -> Self {
        self.script(name, vec![ExecutionOutcome::new(1, stdout, stderr)])
    }

    /// Number of launches for a command name
    pub fn calls_for(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == name)
            .count()
    }

    /// Launch order and times
    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessLauncher for ScriptedLauncher {
    async fn launch(&self, command: &CommandSpec) -> ExecutionOutcome {
        let name = command.name().to_string();
        let attempt = self.calls_for(&name);
        self.calls.lock().unwrap().push((name.clone(), Instant::now()));

        let scripts = self.scripts.lock().unwrap();
        match scripts.get(&name) {
            Some(outcomes) if !outcomes.is_empty() => {
                outcomes[attempt.min(outcomes.len() - 1)].clone()
            }
            _ => ExecutionOutcome::spawn_failure("no script for command"),
        }
    }
}
