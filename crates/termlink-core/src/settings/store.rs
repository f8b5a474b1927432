//! Settings ownership and change notification.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use termlink_abstraction::ClientConfig;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    API_KEY_ENV, ColorTheme, ConnectionOverrides, DEFAULT_FONT_SIZE, SERVER_URL_ENV,
    SettingsResult, TerminalSettings, non_empty, supported_font_size,
};

/// Owns the terminal preferences and publishes connection changes.
///
/// Every edit goes through the store. Subscribers receive a new `ClientConfig`
/// only when the effective server URL or API key actually change. Environment
/// overrides shadow the stored values but only the stored values are saved.
///
/// # Examples
///
/// ```no_run
/// use termlink_core::settings::SettingsStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SettingsStore::open_default()?;
/// let mut changes = store.subscribe();
///
/// store.set_server_url("https://term.example")?;
/// assert!(changes.has_changed()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SettingsStore {
    /// Backing TOML file; `None` keeps settings in memory only.
    path: Option<PathBuf>,
    /// Values as stored in the file, without overrides.
    settings: RwLock<TerminalSettings>,
    overrides: ConnectionOverrides,
    config_tx: watch::Sender<ClientConfig>,
}

impl SettingsStore {
    /// Creates a store that never touches the filesystem.
    #[must_use]
    pub fn in_memory(settings: TerminalSettings) -> Self {
        Self::from_parts(None, settings, ConnectionOverrides::default())
    }

    /// Opens the store backed by `path`, falling back to defaults when the
    /// file does not exist. `TERMLINK_SERVER_URL` and `TERMLINK_API_KEY`
    /// override the file when set.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> SettingsResult<Self> {
        Self::open_with_overrides(path, ConnectionOverrides::from_env())
    }

    /// Opens the store backed by `path` with explicit connection overrides.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open_with_overrides(
        path: impl Into<PathBuf>,
        overrides: ConnectionOverrides,
    ) -> SettingsResult<Self> {
        let path = path.into();
        let mut settings = Self::load_file(&path)?;
        settings.normalize();

        info!(
            path = %path.display(),
            server_url = %overrides.apply(&settings).server_url,
            overridden = overrides != ConnectionOverrides::default(),
            "Terminal settings loaded"
        );
        Ok(Self::from_parts(Some(path), settings, overrides))
    }

    /// Opens the store at `~/.termlink/settings.toml`.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open_default() -> SettingsResult<Self> {
        Self::open(Self::default_path())
    }

    /// Default settings file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        crate::termlink_home().join("settings.toml")
    }

    fn from_parts(
        path: Option<PathBuf>,
        settings: TerminalSettings,
        overrides: ConnectionOverrides,
    ) -> Self {
        let (config_tx, _) = watch::channel(overrides.apply(&settings).client_config());
        Self { path, settings: RwLock::new(settings), overrides, config_tx }
    }

    fn load_file(path: &Path) -> SettingsResult<TerminalSettings> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(TerminalSettings::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn save_file(path: &Path, settings: &TerminalSettings) -> SettingsResult<()> {
        let content = toml::to_string_pretty(settings)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the effective settings, environment overrides applied.
    #[must_use]
    pub fn settings(&self) -> TerminalSettings {
        self.overrides.apply(&self.stored_settings())
    }

    /// Returns the settings as stored, without environment overrides.
    #[must_use]
    pub fn stored_settings(&self) -> TerminalSettings {
        self.settings.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the current connection settings.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        self.config_tx.borrow().clone()
    }

    /// Subscribes to connection changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ClientConfig> {
        self.config_tx.subscribe()
    }

    /// Applies `edit` to a copy of the stored settings, persists it, then
    /// commits it and notifies subscribers if the effective connection changed.
    fn update(&self, edit: impl FnOnce(&mut TerminalSettings)) -> SettingsResult<()> {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        edit(&mut next);

        if next == *guard {
            return Ok(());
        }
        if let Some(path) = &self.path {
            Self::save_file(path, &next)?;
        }

        let config = self.overrides.apply(&next).client_config();
        *guard = next;
        drop(guard);

        let changed = self.config_tx.send_if_modified(|current| {
            if *current == config {
                false
            } else {
                *current = config;
                true
            }
        });
        if changed {
            info!("Terminal connection settings changed");
        }
        Ok(())
    }

    /// Sets the server URL.
    ///
    /// # Errors
    /// Rejects blank input; returns I/O errors from persisting.
    pub fn set_server_url(&self, url: &str) -> SettingsResult<()> {
        let url = non_empty("server URL", url)?;
        self.update(|s| s.server_url = url)?;
        if self.overrides.server_url.is_some() {
            warn!("Stored terminal server URL updated but {SERVER_URL_ENV} takes precedence");
        }
        info!("Updated terminal server URL");
        Ok(())
    }

    /// Sets the API key.
    ///
    /// # Errors
    /// Rejects blank input; returns I/O errors from persisting.
    pub fn set_api_key(&self, key: &str) -> SettingsResult<()> {
        let key = non_empty("API key", key)?;
        self.update(|s| s.api_key = key)?;
        if self.overrides.api_key.is_some() {
            warn!("Stored terminal API key updated but {API_KEY_ENV} takes precedence");
        }
        info!("Updated terminal API key");
        Ok(())
    }

    /// Sets the font size.
    ///
    /// # Errors
    /// Rejects sizes outside `FONT_SIZES`; returns I/O errors from persisting.
    pub fn set_font_size(&self, size: u8) -> SettingsResult<()> {
        let size = supported_font_size(size)?;
        self.update(|s| s.font_size = size)?;
        info!(font_size = size, "Updated terminal font size");
        Ok(())
    }

    /// Sets the color theme.
    ///
    /// # Errors
    /// Returns I/O errors from persisting.
    pub fn set_color_theme(&self, theme: ColorTheme) -> SettingsResult<()> {
        self.update(|s| s.color_theme = theme)?;
        info!(theme = theme.label(), "Updated terminal color theme");
        Ok(())
    }

    /// Shows or hides the terminal button.
    ///
    /// # Errors
    /// Returns I/O errors from persisting.
    pub fn set_show_terminal_button(&self, show: bool) -> SettingsResult<()> {
        self.update(|s| s.show_terminal_button = show)?;
        info!(show, "Updated terminal button visibility");
        Ok(())
    }

    /// Restores font size and color theme to their defaults. Server URL and
    /// API key are left alone.
    ///
    /// # Errors
    /// Returns I/O errors from persisting.
    pub fn reset_terminal_preferences(&self) -> SettingsResult<()> {
        self.update(|s| {
            s.font_size = DEFAULT_FONT_SIZE;
            s.color_theme = ColorTheme::Default;
        })?;
        info!("Terminal settings reset to defaults");
        Ok(())
    }
}
