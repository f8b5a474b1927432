//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TermlinkError};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_DIRECTIVE: &str = "termlink_client=info,termlink_core=info,warn";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_directive`.
///
/// # Errors
/// Returns `TermlinkError::Logging` if a global subscriber is already set.
pub fn init_logging(default_directive: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| TermlinkError::Logging(e.to_string()))
}
