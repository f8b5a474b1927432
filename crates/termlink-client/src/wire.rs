//! Wire format for the terminal server's HTTP+JSON protocol.
//!
//! Request bodies are typed; response bodies are inspected as loose JSON objects
//! because an `error` field takes precedence over every other field.

use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use termlink_abstraction::{SessionInfo, TerminalError, TerminalResult};

pub(crate) const CREATE_SESSION_PATH: &str = "/create-session";
pub(crate) const SESSION_PATH: &str = "/session";
pub(crate) const EXECUTE_COMMAND_PATH: &str = "/execute-command";

pub(crate) const API_KEY_HEADER: &str = "X-API-Key";
pub(crate) const SESSION_ID_HEADER: &str = "X-Session-Id";

#[derive(Debug, Serialize)]
pub(crate) struct CreateSessionRequest<'a> {
    #[serde(rename = "userId")]
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommandRequest<'a> {
    pub command: &'a str,
}

/// Joins `path` onto `base_url`, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base_url: &str, path: &str) -> TerminalResult<Url> {
    let raw = format!("{}{}", base_url.trim().trim_end_matches('/'), path);
    let url =
        Url::parse(&raw).map_err(|e| TerminalError::InvalidEndpoint(format!("{raw}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TerminalError::InvalidEndpoint(format!("{raw}: unsupported scheme '{other}'"))),
    }
}

/// Decodes a body into a JSON object, surfacing a server `error` field first.
///
/// `not_object` builds the error for well-formed JSON that is not an object;
/// session creation reports it as a response error, command execution as a
/// parse error.
fn decode_object(
    status: StatusCode,
    body: &[u8],
    not_object: fn(String) -> TerminalError,
) -> TerminalResult<Map<String, Value>> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => {
            return Err(TerminalError::Response(format!("Server returned HTTP {status}")));
        }
        Err(e) => return Err(TerminalError::Parse(format!("JSON parsing error: {e}"))),
    };

    let Value::Object(map) = value else {
        return Err(not_object("Could not parse response".to_string()));
    };

    if let Some(message) = map.get("error").and_then(Value::as_str) {
        return Err(TerminalError::Response(message.to_string()));
    }

    Ok(map)
}

fn required_str(map: &Map<String, Value>, field: &str) -> TerminalResult<String> {
    map.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TerminalError::Response("Invalid response format".to_string()))
}

/// Decodes a `/create-session` response.
pub(crate) fn decode_create_session(status: StatusCode, body: &[u8]) -> TerminalResult<SessionInfo> {
    let map = decode_object(status, body, TerminalError::Response)?;
    let session_id = required_str(&map, "sessionId")?;
    let user_id = map.get("userId").and_then(Value::as_str).map(str::to_string);

    Ok(SessionInfo { session_id, user_id })
}

/// Decodes an `/execute-command` response into the command output.
pub(crate) fn decode_command_output(status: StatusCode, body: &[u8]) -> TerminalResult<String> {
    let map = decode_object(status, body, TerminalError::Parse)?;
    required_str(&map, "output")
}
