//! Small helpers shared by the reqwest-based adapters.

use std::time::Duration;

use anyhow::Context;
use hp_core::{Absence, Lookup};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

/// Build a client whose requests time out after `timeout`.
pub(crate) fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

/// Join `base` and `path` with exactly one slash between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map a transport failure to an absence.
pub(crate) fn absence_of(error: &reqwest::Error) -> Absence {
    if error.is_timeout() {
        Absence::Unreachable("request timed out".to_string())
    } else if let Some(status) = error.status() {
        Absence::Status(status.as_u16())
    } else {
        Absence::Unreachable(error.to_string())
    }
}

/// Read a JSON body from a response, treating non-2xx as absence.
pub(crate) async fn json_lookup(sent: Result<Response, reqwest::Error>) -> Lookup<Value> {
    let response = match sent {
        Ok(response) => response,
        Err(err) => return Lookup::Absent(absence_of(&err)),
    };
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Lookup::not_found();
    }
    if !status.is_success() {
        return Lookup::Absent(Absence::Status(status.as_u16()));
    }
    match response.json::<Value>().await {
        Ok(value) => Lookup::Found(value),
        Err(err) => Lookup::Absent(Absence::Malformed(err.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Extract the backend's `{"error": "..."}` message, if any.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://api.hpfs.ru/", "/devices/lookup"),
            "https://api.hpfs.ru/devices/lookup"
        );
        assert_eq!(join_url("http://192.168.4.1", "hello"), "http://192.168.4.1/hello");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error":"claim expired"}"#),
            Some("claim expired".to_string())
        );
        assert_eq!(error_message(r#"{"error":"  "}"#), None);
        assert_eq!(error_message("<html>"), None);
    }
}
