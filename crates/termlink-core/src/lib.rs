//! Termlink Core - settings, identity and lifecycle glue around the terminal client.
//!
//! This crate provides:
//! - Terminal preferences persisted as TOML, with change notification
//! - A persisted device identifier used as session owner
//! - Command history and reset operations
//! - Logging initialisation
//!
//! # Example
//!
//! ```rust,no_run
//! use termlink_core::{DeviceIdStore, SettingsStore, connect};
//!
//! #[tokio::main]
//! async fn main() -> termlink_core::Result<()> {
//!     termlink_core::logging::init_logging(termlink_core::logging::DEFAULT_LOG_DIRECTIVE)?;
//!
//!     let store = SettingsStore::open_default()?;
//!     let client = connect(&store, DeviceIdStore::new());
//!
//!     println!("{}", client.execute_command("uptime").await?);
//!     client.end_session().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod history;
pub mod logging;
pub mod reset;
pub mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use termlink_abstraction::DeviceIdentity;
use termlink_client::TerminalClient;

pub use device::DeviceIdStore;
pub use error::{Result, TermlinkError};
pub use history::CommandHistory;
pub use reset::reset_all;
pub use settings::{
    ColorTheme, ConnectionOverrides, SettingsError, SettingsStore, TerminalSettings,
};

/// Directory holding Termlink's settings, history and device id.
#[must_use]
pub fn termlink_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".termlink")
}

/// Builds a client from the store's current settings and keeps it in sync
/// with later connection changes.
///
/// Must be called from within a Tokio runtime.
pub fn connect(
    store: &SettingsStore,
    identity: impl DeviceIdentity + 'static,
) -> Arc<TerminalClient> {
    let configs = store.subscribe();
    let client = Arc::new(TerminalClient::new(configs.borrow().clone(), identity));
    let _watcher = client.follow_settings(configs);
    client
}
