//! Setup-network domain: home Wi-Fi credentials and scan results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::shape::{first_match, Strategy};
use crate::ids::ClaimCode;

/// Home network credentials handed to the device.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl std::fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /wifi/config` on the setup network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiConfigRequest {
    pub ssid: String,
    pub password: String,
    pub claim: ClaimCode,
}

impl WifiConfigRequest {
    pub fn new(credentials: &WifiCredentials, claim: ClaimCode) -> Self {
        Self {
            ssid: credentials.ssid.clone(),
            password: credentials.password.clone(),
            claim,
        }
    }
}

/// Body of the device's `GET /hello` on the setup network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HelloAck {
    #[serde(default)]
    pub ok: bool,
}

const SCAN_STRATEGIES: &[Strategy<Vec<String>>] = &[networks_field, bare_array];

/// Parse a `/wifi/scan` body (`{"networks": [...]}` or a bare array)
/// and clean the list.
pub fn parse_scan(value: &Value) -> Option<Vec<String>> {
    first_match(value, SCAN_STRATEGIES).map(normalize_network_list)
}

/// Trim names, drop blanks and duplicates, sort case-insensitively.
pub fn normalize_network_list(raw: Vec<String>) -> Vec<String> {
    let mut networks: Vec<String> = raw
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    networks.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    networks.dedup();
    networks
}

fn strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn networks_field(value: &Value) -> Option<Vec<String>> {
    value
        .as_object()?
        .get("networks")?
        .as_array()
        .map(|items| strings(items))
}

fn bare_array(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| strings(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_scan_accepts_both_shapes() {
        let wrapped = json!({"networks": ["Home", " office ", "Home", ""]});
        let bare = json!(["office", "Home"]);
        assert_eq!(
            parse_scan(&wrapped),
            Some(vec!["Home".to_string(), "office".to_string()])
        );
        assert_eq!(parse_scan(&wrapped), parse_scan(&bare));
        assert_eq!(parse_scan(&json!({"ok": true})), None);
    }

    #[test]
    fn test_normalize_sorts_case_insensitively() {
        let cleaned = normalize_network_list(vec![
            "beta".to_string(),
            "Alpha".to_string(),
            "alpha".to_string(),
            "  ".to_string(),
        ]);
        assert_eq!(cleaned, vec!["Alpha", "alpha", "beta"]);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = WifiCredentials {
            ssid: "Home".to_string(),
            password: "secret".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("Home"));
        assert!(!rendered.contains("secret"));
    }
}
