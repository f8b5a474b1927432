//! Session-managed command client.
//!
//! `TerminalClient` keeps at most one server session per instance. Every
//! protected call first acquires a session (validate the cached one, else
//! create a new one) and then performs exactly one protocol call.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use termlink_abstraction::{
    ClientConfig, CommandExecutor, DeviceIdentity, SessionInfo, TerminalError, TerminalResult,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::wire::{
    self, API_KEY_HEADER, CREATE_SESSION_PATH, CommandRequest, CreateSessionRequest,
    EXECUTE_COMMAND_PATH, SESSION_ID_HEADER, SESSION_PATH,
};

/// Mutable state shared by concurrent callers.
#[derive(Debug)]
struct ClientState {
    config: ClientConfig,
    session: Option<SessionInfo>,
    /// Bumped on every configuration change.
    generation: u64,
}

/// Client for a remote command-execution server.
///
/// Share it behind an `Arc`; all methods take `&self`. Results are returned on
/// whichever executor polls the future.
pub struct TerminalClient {
    client: Client,
    identity: Arc<dyn DeviceIdentity>,
    state: RwLock<ClientState>,
}

impl std::fmt::Debug for TerminalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("TerminalClient")
            .field("base_url", &state.config.base_url)
            .field("has_session", &state.session.is_some())
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}

impl TerminalClient {
    /// Creates a client with a default HTTP client.
    ///
    /// # Arguments
    /// * `config` - Server address and API key
    /// * `identity` - Source of the session owner id
    #[must_use]
    pub fn new(config: ClientConfig, identity: impl DeviceIdentity + 'static) -> Self {
        Self::with_http_client(config, identity, Client::new())
    }

    /// Creates a client that sends requests through `client`.
    #[must_use]
    pub fn with_http_client(
        config: ClientConfig,
        identity: impl DeviceIdentity + 'static,
        client: Client,
    ) -> Self {
        info!(base_url = %config.base_url, "TerminalClient initialized");

        Self {
            client,
            identity: Arc::new(identity),
            state: RwLock::new(ClientState { config, session: None, generation: 0 }),
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, ClientState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, ClientState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> (ClientConfig, Option<SessionInfo>, u64) {
        let state = self.read_state();
        (state.config.clone(), state.session.clone(), state.generation)
    }

    /// Returns the configuration currently in use.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        self.read_state().config.clone()
    }

    /// Returns true if a session id is cached.
    #[must_use]
    pub fn has_active_session(&self) -> bool {
        self.read_state().session.is_some()
    }

    /// Returns the cached session, if any.
    #[must_use]
    pub fn session(&self) -> Option<SessionInfo> {
        self.read_state().session.clone()
    }

    /// Replaces the configuration and drops the cached session if either field
    /// differs from the current one. Identical configs are ignored.
    pub fn on_configuration_changed(&self, new_config: ClientConfig) {
        let mut state = self.write_state();
        if state.config == new_config {
            debug!("Terminal configuration unchanged");
            return;
        }

        state.config = new_config;
        state.session = None;
        state.generation += 1;
        info!(
            base_url = %state.config.base_url,
            generation = state.generation,
            "Terminal settings changed, session reset"
        );
    }

    /// Applies every configuration published on `configs` until the sender is
    /// dropped.
    pub fn follow_settings(
        self: &Arc<Self>,
        mut configs: watch::Receiver<ClientConfig>,
    ) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            while configs.changed().await.is_ok() {
                let config = configs.borrow_and_update().clone();
                client.on_configuration_changed(config);
            }
            debug!("Settings channel closed");
        })
    }

    /// Returns a usable session id, validating the cached session or creating a
    /// new one.
    ///
    /// # Errors
    /// Returns the classified error of the creation request when no session
    /// could be obtained.
    pub async fn acquire_session(&self) -> TerminalResult<String> {
        self.acquire().await.map(|(_, session_id)| session_id)
    }

    /// Acquisition, also returning the config the session belongs to.
    async fn acquire(&self) -> TerminalResult<(ClientConfig, String)> {
        let (config, cached, generation) = self.snapshot();

        if let Some(session) = cached {
            match self.validate_session(&config, &session.session_id).await {
                Ok(()) => {
                    info!("Using existing terminal session");
                    return Ok((config, session.session_id));
                }
                Err(e) => {
                    info!(error = %e, "Terminal session invalid, creating new one");
                    self.forget_session(&session.session_id);
                }
            }
        } else {
            info!("Creating new terminal session");
        }

        let session_id = self.create_session(&config, generation).await?;
        Ok((config, session_id))
    }

    /// Forgets `session_id` unless another caller already replaced it.
    fn forget_session(&self, session_id: &str) {
        let mut state = self.write_state();
        if state.session.as_ref().is_some_and(|s| s.session_id == session_id) {
            state.session = None;
        }
    }

    async fn validate_session(
        &self,
        config: &ClientConfig,
        session_id: &str,
    ) -> TerminalResult<()> {
        let url = wire::endpoint(&config.base_url, SESSION_PATH).inspect_err(|_| {
            error!("Invalid URL for terminal session validation");
        })?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &config.api_key)
            .header(SESSION_ID_HEADER, session_id)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network error validating terminal session");
                TerminalError::Network(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = %status, "Terminal session expired");
            return Err(TerminalError::Session(format!("Session expired (HTTP {status})")));
        }

        debug!("Terminal session validated successfully");
        Ok(())
    }

    async fn create_session(
        &self,
        config: &ClientConfig,
        generation: u64,
    ) -> TerminalResult<String> {
        let url = wire::endpoint(&config.base_url, CREATE_SESSION_PATH).inspect_err(|_| {
            error!("Invalid URL for terminal session creation");
        })?;

        let device_id = self.identity.device_id();
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &config.api_key)
            .json(&CreateSessionRequest { user_id: &device_id })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network error creating terminal session");
                TerminalError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, "Failed to read terminal session response");
            TerminalError::Network(e.to_string())
        })?;

        let session = wire::decode_create_session(status, &body).inspect_err(|e| {
            error!(error = %e, status = %status, "Terminal session creation failed");
        })?;
        let session_id = session.session_id.clone();

        let mut state = self.write_state();
        if state.generation == generation {
            state.session = Some(session);
            info!("Terminal session created successfully");
        } else {
            warn!("Terminal settings changed while creating session, not caching it");
        }

        Ok(session_id)
    }

    /// Executes `command` on the server and returns its output.
    ///
    /// # Errors
    /// Returns an error if no session could be acquired or the execution
    /// request failed. The execution request is never sent without a session.
    pub async fn execute_command(&self, command: &str) -> TerminalResult<String> {
        debug!(command = %command, "Executing terminal command");

        let (config, session_id) = self.acquire().await.inspect_err(|e| {
            error!(error = %e, "Failed to acquire session for command execution");
        })?;

        self.execute_with_session(&config, &session_id, command).await
    }

    async fn execute_with_session(
        &self,
        config: &ClientConfig,
        session_id: &str,
        command: &str,
    ) -> TerminalResult<String> {
        let url = wire::endpoint(&config.base_url, EXECUTE_COMMAND_PATH).inspect_err(|_| {
            error!("Invalid URL for command execution");
        })?;

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &config.api_key)
            .header(SESSION_ID_HEADER, session_id)
            .json(&CommandRequest { command })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network error executing command");
                TerminalError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, "Failed to read command response");
            TerminalError::Network(e.to_string())
        })?;

        let output = wire::decode_command_output(status, &body).inspect_err(|e| {
            error!(error = %e, status = %status, "Command execution failed");
        })?;

        info!(output_len = output.len(), "Command executed successfully");
        Ok(output)
    }

    /// Terminates the cached session on the server and forgets it locally.
    ///
    /// Succeeds without any request when no session is cached.
    ///
    /// # Errors
    /// Returns `InvalidEndpoint` or `Network` if the termination request could
    /// not be delivered; the session stays cached in that case.
    pub async fn end_session(&self) -> TerminalResult<()> {
        let (config, cached, _) = self.snapshot();
        let Some(session) = cached else {
            info!("No active terminal session to end");
            return Ok(());
        };

        let url = wire::endpoint(&config.base_url, SESSION_PATH).inspect_err(|_| {
            error!("Invalid URL for terminal session termination");
        })?;

        let response = self
            .client
            .delete(url)
            .header(API_KEY_HEADER, &config.api_key)
            .header(SESSION_ID_HEADER, &session.session_id)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network error ending terminal session");
                TerminalError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Server did not acknowledge session termination");
        }

        self.forget_session(&session.session_id);
        info!("Terminal session ended successfully");
        Ok(())
    }
}

#[async_trait]
impl CommandExecutor for TerminalClient {
    async fn execute(&self, command: &str) -> TerminalResult<String> {
        self.execute_command(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticDeviceId;

    fn client(base_url: &str) -> TerminalClient {
        TerminalClient::new(ClientConfig::new(base_url, "test-key"), StaticDeviceId::new("device-1"))
    }

    #[test]
    fn test_new_client_has_no_session() {
        let client = client("https://term.example");
        assert!(!client.has_active_session());
        assert_eq!(client.session(), None);
        assert_eq!(client.config(), ClientConfig::new("https://term.example", "test-key"));
    }

    #[test]
    fn test_configuration_change_clears_session() {
        let client = client("https://term.example");
        client.write_state().session =
            Some(SessionInfo { session_id: "s1".to_string(), user_id: None });

        client.on_configuration_changed(ClientConfig::new("https://term.example", "test-key"));
        assert!(client.has_active_session(), "identical config must be a no-op");
        assert_eq!(client.read_state().generation, 0);

        client.on_configuration_changed(ClientConfig::new("https://term.example", "other-key"));
        assert!(!client.has_active_session());
        assert_eq!(client.config().api_key, "other-key");
        assert_eq!(client.read_state().generation, 1);
    }

    #[test]
    fn test_forget_session_keeps_newer_session() {
        let client = client("https://term.example");
        client.write_state().session =
            Some(SessionInfo { session_id: "s2".to_string(), user_id: None });

        client.forget_session("s1");
        assert_eq!(client.session().map(|s| s.session_id), Some("s2".to_string()));

        client.forget_session("s2");
        assert!(!client.has_active_session());
    }

    #[tokio::test]
    async fn test_end_session_without_session_is_noop() {
        // Unroutable address: any request would fail with a network error.
        let client = client("http://127.0.0.1:1");
        assert!(client.end_session().await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_base_url_fails_before_sending() {
        let client = client("not a url");
        let err = client.execute_command("ls").await.unwrap_err();
        assert!(matches!(err, TerminalError::InvalidEndpoint(_)));
        assert!(!client.has_active_session());
    }

    #[tokio::test]
    async fn test_end_session_network_failure_keeps_session() {
        let client = client("http://127.0.0.1:1");
        client.write_state().session =
            Some(SessionInfo { session_id: "s1".to_string(), user_id: None });

        let err = client.end_session().await.unwrap_err();
        assert!(matches!(err, TerminalError::Network(_)));
        assert_eq!(client.session().map(|s| s.session_id), Some("s1".to_string()));
    }

    #[tokio::test]
    async fn test_session_from_stale_generation_is_returned_but_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/create-session")
            .with_status(200)
            .with_body(r#"{"sessionId": "stale-sess"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client(&server.url());
        let (config, _, generation) = client.snapshot();
        client.on_configuration_changed(ClientConfig::new(server.url(), "rotated-key"));

        let session_id = client.create_session(&config, generation).await.unwrap();

        assert_eq!(session_id, "stale-sess");
        assert!(!client.has_active_session());
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_follow_settings_applies_published_config() {
        let client = Arc::new(client("https://a.example"));
        client.write_state().session =
            Some(SessionInfo { session_id: "s1".to_string(), user_id: None });

        let (tx, rx) = watch::channel(client.config());
        let handle = client.follow_settings(rx);

        tx.send(ClientConfig::new("https://b.example", "test-key")).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(client.config().base_url, "https://b.example");
        assert!(!client.has_active_session());
    }
}
