//! Per-command status messages and their aggregation into a response body

use crate::{CommandSpec, ExecutionOutcome};

/// Placeholder used when a failed command produced no stderr
pub const NO_ERROR_MESSAGE: &str = "No error message received.";

/// Message for a command that exited 0
pub fn success_message(command: &CommandSpec, outcome: &ExecutionOutcome) -> String {
    format!(
        "Command '{}' executed successfully:\n{}",
        command, outcome.stdout
    )
}

/// Message for a command that kept failing until its attempts ran out
pub fn failure_message(
    command: &CommandSpec,
    max_attempts: u32,
    outcome: &ExecutionOutcome,
) -> String {
    let error = if outcome.stderr.is_empty() {
        NO_ERROR_MESSAGE
    } else {
        outcome.stderr.as_str()
    };

    let detail = if outcome.stdout.is_empty() {
        error.to_string()
    } else {
        format!("{}\n{}", outcome.stdout, error)
    };

    format!(
        "Error executing command '{}' after {} attempts:\n{}",
        command, max_attempts, detail
    )
}

/// Status messages keyed by command identifier, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    entries: Vec<(String, String)>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message; an existing key keeps its position
    pub fn insert(&mut self, name: impl Into<String>, message: impl Into<String>) {
        let name = name.into();
        let message = message.into();

        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = message,
            None => self.entries.push((name, message)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, message)| message.as_str())
    }

    /// Command identifiers in report order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newline-joined messages; keys are not emitted
    pub fn body(&self) -> String {
        self.entries
            .iter()
            .map(|(_, message)| message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
