//! Persisted per-installation device identifier.

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use termlink_abstraction::DeviceIdentity;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Device identifier stored in `~/.termlink/device-id`.
///
/// The identifier is generated and written on first use, then reused for the
/// lifetime of the installation. If the file cannot be written the generated
/// value is still kept for the lifetime of this store.
#[derive(Debug)]
pub struct DeviceIdStore {
    path: PathBuf,
    cached: OnceLock<String>,
}

impl DeviceIdStore {
    /// Creates a store at the default location.
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(crate::termlink_home().join("device-id"))
    }

    /// Creates a store at a custom location.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cached: OnceLock::new() }
    }

    /// Returns the stored identifier, creating it if necessary.
    pub fn load_or_create(&self) -> &str {
        self.cached.get_or_init(|| {
            if let Ok(content) = fs::read_to_string(&self.path) {
                let id = content.trim();
                if !id.is_empty() {
                    debug!(path = %self.path.display(), "Loaded device identifier");
                    return id.to_string();
                }
            }

            let id = Uuid::new_v4().to_string();
            match self.persist(&id) {
                Ok(()) => info!(path = %self.path.display(), "Generated device identifier"),
                Err(e) => warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to persist device identifier, using it for this run only"
                ),
            }
            id
        })
    }

    fn persist(&self, id: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, id)
    }
}

impl Default for DeviceIdStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceIdentity for DeviceIdStore {
    fn device_id(&self) -> String {
        self.load_or_create().to_string()
    }
}
