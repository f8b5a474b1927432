//! Error types for Termlink Core.

use termlink_abstraction::TerminalError;
use thiserror::Error;

use crate::settings::SettingsError;

/// Core error type for Termlink operations.
#[derive(Error, Debug)]
pub enum TermlinkError {
    /// Settings could not be read, written or validated.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A terminal server operation failed.
    #[error("Terminal error: {0}")]
    Terminal(#[from] TerminalError),

    /// Command history could not be loaded or saved.
    #[error("History error: {0:#}")]
    History(#[from] anyhow::Error),

    /// The global tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Termlink operations.
pub type Result<T> = std::result::Result<T, TermlinkError>;
