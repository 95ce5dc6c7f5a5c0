//! Command execution for the update endpoint
//!
//! This module handles:
//! - Spawning external commands and capturing their output
//! - Retrying failed commands with a fixed delay
//! - Running the sync command list and building the status report

mod handler;
mod launcher;
mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use handler::UpdateHandler;
pub use launcher::{ProcessLauncher, SystemLauncher};
pub use runner::CommandRunner;
