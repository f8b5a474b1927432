//! Full terminal reset.

use std::path::Path;

use termlink_client::TerminalClient;
use tracing::{info, warn};

use crate::error::Result;
use crate::history::CommandHistory;
use crate::settings::SettingsStore;

/// Resets display preferences, clears and saves the command history, and ends
/// the active session.
///
/// Every step runs even if an earlier one fails; the first error is returned.
///
/// # Errors
/// Returns the first settings, history or session error encountered.
pub async fn reset_all(
    store: &SettingsStore,
    history: &mut CommandHistory,
    history_path: &Path,
    client: &TerminalClient,
) -> Result<()> {
    let preferences = store.reset_terminal_preferences();

    history.clear();
    let saved = history.save(history_path);

    let ended = client.end_session().await;
    if let Err(e) = &ended {
        warn!(error = %e, "Failed to end terminal session during reset");
    }

    info!("Terminal fully reset (settings, history, and session)");

    preferences?;
    saved?;
    ended?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TermlinkError;
    use crate::settings::{ColorTheme, DEFAULT_FONT_SIZE, TerminalSettings};
    use termlink_abstraction::ClientConfig;
    use termlink_client::StaticDeviceId;
    use tempfile::TempDir;

    fn store() -> SettingsStore {
        let store = SettingsStore::in_memory(TerminalSettings::default());
        store.set_font_size(20).unwrap();
        store.set_color_theme(ColorTheme::Dark).unwrap();
        store
    }

    #[tokio::test]
    async fn test_reset_all_without_session() {
        let temp_dir = TempDir::new().unwrap();
        let history_path = temp_dir.path().join("history.json");
        let store = store();
        let mut history = CommandHistory::new();
        history.push("ls");

        let client = TerminalClient::new(
            ClientConfig::new("http://127.0.0.1:1", "key"),
            StaticDeviceId::new("device-1"),
        );

        reset_all(&store, &mut history, &history_path, &client).await.unwrap();

        assert_eq!(store.settings().font_size, DEFAULT_FONT_SIZE);
        assert_eq!(store.settings().color_theme, ColorTheme::Default);
        assert!(history.is_empty());
        assert!(CommandHistory::load(&history_path).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_all_ends_session() {
        let mut server = mockito::Server::new_async().await;
        let _create = server
            .mock("POST", "/create-session")
            .with_status(200)
            .with_body(r#"{"sessionId": "sess-1"}"#)
            .create_async()
            .await;

        let temp_dir = TempDir::new().unwrap();
        let history_path = temp_dir.path().join("history.json");
        let store = store();
        let mut history = CommandHistory::new();
        history.push("top");

        let client = TerminalClient::new(
            ClientConfig::new(server.url(), "key"),
            StaticDeviceId::new("device-1"),
        );
        client.acquire_session().await.unwrap();

        let delete = server
            .mock("DELETE", "/session")
            .match_header("x-session-id", "sess-1")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        reset_all(&store, &mut history, &history_path, &client).await.unwrap();
        delete.assert_async().await;

        assert!(!client.has_active_session());
        assert!(history.is_empty());
        assert_eq!(store.settings().font_size, DEFAULT_FONT_SIZE);
    }

    #[tokio::test]
    async fn test_reset_all_reports_history_failure_after_other_steps() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let store = store();
        let mut history = CommandHistory::new();
        history.push("ls");
        let client = TerminalClient::new(
            ClientConfig::new("http://127.0.0.1:1", "key"),
            StaticDeviceId::new("device-1"),
        );

        // Parent of the history path is a regular file.
        let err = reset_all(&store, &mut history, &blocker.join("history.json"), &client)
            .await
            .unwrap_err();

        assert!(matches!(err, TermlinkError::History(_)));
        assert!(history.is_empty());
        assert_eq!(store.settings().color_theme, ColorTheme::Default);
    }
}
