//! Terminal client abstraction layer for Termlink.
//!
//! This crate defines the error taxonomy, configuration snapshot and seam traits
//! shared by the HTTP client and the settings layer. It performs no I/O.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when talking to the remote terminal server.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalError {
    /// The base URL and path did not form a valid request target.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport-level failure (DNS, connection, TLS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with an error payload or an unexpected shape.
    #[error("Response error: {0}")]
    Response(String),

    /// No usable session, or the session was rejected by the server.
    #[error("Session error: {0}")]
    Session(String),

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result alias used by every terminal operation.
pub type TerminalResult<T> = Result<T, TerminalError>;

/// Connection settings for one configuration generation.
///
/// Replaced wholesale whenever the owning preference store changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base address of the terminal server, e.g. `https://host.example`.
    pub base_url: String,
    /// Static key sent as `X-API-Key` on every request.
    pub api_key: String,
}

impl ClientConfig {
    /// Creates a new configuration snapshot.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into() }
    }
}

/// A server-issued session as cached by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Opaque session identifier sent as `X-Session-Id`.
    pub session_id: String,
    /// Owner id echoed back by the server, if any.
    pub user_id: Option<String>,
}

/// Something that can run a command string remotely and return its output.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// across tasks.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Executes `command` and returns the exact output text.
    ///
    /// # Errors
    /// Returns a classified `TerminalError` when the command could not be run.
    async fn execute(&self, command: &str) -> TerminalResult<String>;
}

#[async_trait]
impl<T: CommandExecutor + ?Sized> CommandExecutor for Arc<T> {
    async fn execute(&self, command: &str) -> TerminalResult<String> {
        (**self).execute(command).await
    }
}

/// Source of the stable per-installation identifier used as session owner.
pub trait DeviceIdentity: Send + Sync {
    /// Returns the device identifier.
    fn device_id(&self) -> String;
}

impl<T: DeviceIdentity + ?Sized> DeviceIdentity for Arc<T> {
    fn device_id(&self) -> String {
        (**self).device_id()
    }
}
