//! Remote terminal client for Termlink.
//!
//! This crate provides the session-managed HTTP client and its helpers.
//!
//! # Protocol
//!
//! | Operation | Request |
//! |---|---|
//! | Create session | `POST /create-session` with `{"userId": ...}` |
//! | Validate session | `GET /session` with `X-Session-Id` |
//! | Execute command | `POST /execute-command` with `{"command": ...}` |
//! | End session | `DELETE /session` with `X-Session-Id` |
//!
//! Every request carries the `X-API-Key` header.
//!
//! # Example
//!
//! ```no_run
//! use termlink_abstraction::ClientConfig;
//! use termlink_client::{StaticDeviceId, TerminalClient};
//!
//! # async fn example() -> Result<(), termlink_abstraction::TerminalError> {
//! let client = TerminalClient::new(
//!     ClientConfig::new("https://term.example", "my-key"),
//!     StaticDeviceId::new("device-1"),
//! );
//! let output = client.execute_command("uname -a").await?;
//! println!("{output}");
//! client.end_session().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod client;
pub mod identity;
mod wire;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use termlink_abstraction::{CommandExecutor, TerminalError, TerminalResult};
use tracing::debug;

pub use adapter::ShellCommandAdapter;
pub use client::TerminalClient;
pub use identity::{EphemeralDeviceId, StaticDeviceId};

/// A mock implementation of `CommandExecutor` for testing and demonstration.
///
/// Returns canned output per command, echoing unknown commands, and records
/// every command it receives.
#[derive(Debug, Default)]
pub struct MockExecutor {
    outputs: HashMap<String, String>,
    failure: Option<TerminalError>,
    commands: Mutex<Vec<String>>,
}

impl MockExecutor {
    /// Creates a `MockExecutor` that echoes every command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `MockExecutor` that fails every command with `error`.
    #[must_use]
    pub fn failing(error: TerminalError) -> Self {
        Self { failure: Some(error), ..Self::default() }
    }

    /// Registers canned `output` for `command`.
    #[must_use]
    pub fn with_output(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.outputs.insert(command.into(), output.into());
        self
    }

    /// Returns the commands received so far, oldest first.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(&self, command: &str) -> TerminalResult<String> {
        debug!(command = %command, "MockExecutor executing command");
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).push(command.to_string());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(self
            .outputs
            .get(command)
            .cloned()
            .unwrap_or_else(|| format!("Mock output for: {command}")))
    }
}
