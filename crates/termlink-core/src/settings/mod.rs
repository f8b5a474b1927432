//! Terminal preferences.
//!
//! `TerminalSettings` is the persisted preference set; `SettingsStore` owns it
//! and tells interested clients when the connection fields change.

mod store;

use serde::{Deserialize, Serialize};
use termlink_abstraction::ClientConfig;
use thiserror::Error;
use tracing::warn;

pub use store::SettingsStore;

/// Server used when no URL has been configured.
pub const DEFAULT_SERVER_URL: &str = "https://backdoor-backend.onrender.com";

/// Placeholder key used when no API key has been configured.
pub const DEFAULT_API_KEY: &str = "your-api-key-here";

/// Font size used when none (or an unsupported one) is configured.
pub const DEFAULT_FONT_SIZE: u8 = 14;

/// Font sizes offered to the user, in points.
pub const FONT_SIZES: [u8; 7] = [10, 12, 14, 16, 18, 20, 24];

/// Environment variable overriding the configured server URL.
pub const SERVER_URL_ENV: &str = "TERMLINK_SERVER_URL";

/// Environment variable overriding the configured API key.
pub const API_KEY_ENV: &str = "TERMLINK_API_KEY";

/// Errors that can occur while loading, saving or editing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the settings file.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize settings.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Rejected setting value.
    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Terminal color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Default,
    Light,
    Dark,
    Solarized,
}

impl ColorTheme {
    /// All themes in picker order.
    pub const ALL: [Self; 4] = [Self::Default, Self::Light, Self::Dark, Self::Solarized];

    /// Maps a picker index to a theme, clamping past-the-end indices to the
    /// last theme.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::Solarized => "Solarized",
        }
    }
}

/// Persisted terminal preferences.
///
/// Missing keys fall back to their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Terminal server base URL.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// API key sent with every request.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Font size in points.
    #[serde(default = "default_font_size")]
    pub font_size: u8,

    /// Color theme.
    #[serde(default)]
    pub color_theme: ColorTheme,

    /// Whether the floating terminal button is shown.
    #[serde(default)]
    pub show_terminal_button: bool,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

const fn default_font_size() -> u8 {
    DEFAULT_FONT_SIZE
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            api_key: default_api_key(),
            font_size: DEFAULT_FONT_SIZE,
            color_theme: ColorTheme::Default,
            show_terminal_button: false,
        }
    }
}

impl TerminalSettings {
    /// Returns the connection part of the settings.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.server_url.clone(), self.api_key.clone())
    }

    /// Replaces unsupported or blank values with defaults.
    pub fn normalize(&mut self) {
        if !FONT_SIZES.contains(&self.font_size) {
            warn!(font_size = self.font_size, "Unsupported font size, using default");
            self.font_size = DEFAULT_FONT_SIZE;
        }
        if self.server_url.trim().is_empty() {
            self.server_url = default_server_url();
        }
        if self.api_key.trim().is_empty() {
            self.api_key = default_api_key();
        }
    }
}

/// Connection values taken from the environment.
///
/// They shadow the file values for the lifetime of a `SettingsStore` and are
/// never written back to the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
}

impl ConnectionOverrides {
    /// Reads `TERMLINK_SERVER_URL` and `TERMLINK_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds overrides from `lookup`, ignoring unset and blank values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup_set = |name: &str| {
            lookup(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
        };

        Self { server_url: lookup_set(SERVER_URL_ENV), api_key: lookup_set(API_KEY_ENV) }
    }

    /// Returns `settings` with the overridden fields replaced.
    #[must_use]
    pub fn apply(&self, settings: &TerminalSettings) -> TerminalSettings {
        let mut effective = settings.clone();
        if let Some(url) = &self.server_url {
            effective.server_url.clone_from(url);
        }
        if let Some(key) = &self.api_key {
            effective.api_key.clone_from(key);
        }
        effective
    }
}

/// Validates a user-entered server URL or API key.
pub(crate) fn non_empty(field: &str, value: &str) -> SettingsResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SettingsError::InvalidValue(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Validates a font size against `FONT_SIZES`.
pub(crate) fn supported_font_size(size: u8) -> SettingsResult<u8> {
    if FONT_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(SettingsError::InvalidValue(format!(
            "font size {size}pt is not one of {FONT_SIZES:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TerminalSettings::default();
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.api_key, DEFAULT_API_KEY);
        assert_eq!(settings.font_size, 14);
        assert_eq!(settings.color_theme, ColorTheme::Default);
        assert!(!settings.show_terminal_button);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let settings: TerminalSettings = toml::from_str(
            r#"
server_url = "https://term.example"
color_theme = "solarized"
"#,
        )
        .unwrap();
        assert_eq!(settings.server_url, "https://term.example");
        assert_eq!(settings.api_key, DEFAULT_API_KEY);
        assert_eq!(settings.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(settings.color_theme, ColorTheme::Solarized);
    }

    #[test]
    fn test_client_config() {
        let settings = TerminalSettings {
            server_url: "https://term.example".to_string(),
            api_key: "secret".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.client_config(), ClientConfig::new("https://term.example", "secret"));
    }

    #[test]
    fn test_color_theme_from_index_clamps() {
        assert_eq!(ColorTheme::from_index(0), ColorTheme::Default);
        assert_eq!(ColorTheme::from_index(2), ColorTheme::Dark);
        assert_eq!(ColorTheme::from_index(3), ColorTheme::Solarized);
        assert_eq!(ColorTheme::from_index(42), ColorTheme::Solarized);
        assert_eq!(ColorTheme::Light.label(), "Light");
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let overrides = ConnectionOverrides::from_lookup(|name| match name {
            SERVER_URL_ENV => Some(" https://env.example ".to_string()),
            API_KEY_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(overrides.server_url.as_deref(), Some("https://env.example"));
        assert_eq!(overrides.api_key, None);

        let settings = TerminalSettings::default();
        let effective = overrides.apply(&settings);
        assert_eq!(effective.server_url, "https://env.example");
        assert_eq!(effective.api_key, DEFAULT_API_KEY);
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_normalize() {
        let mut settings = TerminalSettings {
            server_url: " ".to_string(),
            font_size: 0,
            ..Default::default()
        };
        settings.normalize();
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_validators() {
        assert_eq!(non_empty("server URL", "  https://a.example ").unwrap(), "https://a.example");
        assert!(matches!(non_empty("API key", ""), Err(SettingsError::InvalidValue(_))));
        assert_eq!(supported_font_size(18).unwrap(), 18);
        assert!(matches!(supported_font_size(13), Err(SettingsError::InvalidValue(_))));
    }
}
