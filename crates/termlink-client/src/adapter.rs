//! String-in/string-out wrapper for callers that predate `TerminalError`.

use termlink_abstraction::CommandExecutor;
use tracing::{error, info};

/// Runs shell commands through any `CommandExecutor`, flattening failures
/// into an `"Error: ..."` string.
#[derive(Debug, Clone)]
pub struct ShellCommandAdapter<E> {
    executor: E,
}

impl<E: CommandExecutor> ShellCommandAdapter<E> {
    /// Wraps `executor`.
    #[must_use]
    pub const fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Returns the wrapped executor.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Executes `command` and returns its output, or the error as display text.
    pub async fn execute_shell_command(&self, command: &str) -> String {
        info!(command = %command, "Executing shell command");

        match self.executor.execute(command).await {
            Ok(output) => {
                info!("Shell command executed successfully");
                output
            }
            Err(e) => {
                error!(error = %e, "Shell command failed");
                format!("Error: {e}")
            }
        }
    }
}
