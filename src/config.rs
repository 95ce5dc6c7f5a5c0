//! Startup configuration for the update hook

use salt_update_shared::{defaults, CommandSpec, RetryPolicy};

/// Immutable configuration handed to the server at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address for the HTTP endpoint
    pub bind_addr: String,
    /// Commands run, in order, for every update request
    pub commands: Vec<CommandSpec>,
    /// Retry policy applied to each command
    pub retry: RetryPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::BIND_ADDR.into(),
            commands: vec![
                CommandSpec::salt_run(defaults::GIT_PILLAR_UPDATE),
                CommandSpec::salt_run(defaults::FILESERVER_UPDATE),
            ],
            retry: RetryPolicy::default(),
        }
    }
}
