//! HTTP client for the device while it serves its own setup network.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use hp_core::ports::DeviceSetupPort;
use hp_core::settings::HttpSettings;
use hp_core::setup::{parse_scan, HelloAck, WifiConfigRequest};
use reqwest::Response;
use serde_json::Value;
use tracing::{debug, info};

use crate::http::{build_client, join_url};

const HELLO_PATH: &str = "/hello";
const SCAN_PATH: &str = "/wifi/scan";
const CONFIG_PATH: &str = "/wifi/config";

pub struct SetupApClient {
    client: reqwest::Client,
    base_url: String,
}

impl SetupApClient {
    /// `base_url` is the device address on the setup network (`http://192.168.4.1`).
    pub fn new(base_url: impl Into<String>, http: &HttpSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(http.setup_timeout)?,
            base_url: base_url.into(),
        })
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = join_url(&self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        ensure_success(response, &url)
    }
}

fn ensure_success(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        bail!("{url} answered with status {}", status.as_u16());
    }
    Ok(response)
}

#[async_trait]
impl DeviceSetupPort for SetupApClient {
    async fn hello(&self) -> Result<HelloAck> {
        let ack = self
            .get(HELLO_PATH)
            .await?
            .json::<HelloAck>()
            .await
            .context("unexpected /hello body")?;
        debug!(ok = ack.ok, "setup hello");
        Ok(ack)
    }

    async fn scan_networks(&self) -> Result<Vec<String>> {
        let body = self
            .get(SCAN_PATH)
            .await?
            .json::<Value>()
            .await
            .context("scan response is not JSON")?;
        let networks =
            parse_scan(&body).ok_or_else(|| anyhow!("scan response has no network list"))?;
        info!(count = networks.len(), "scanned networks");
        Ok(networks)
    }

    async fn send_wifi_config(&self, request: &WifiConfigRequest) -> Result<()> {
        let url = join_url(&self.base_url, CONFIG_PATH);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        ensure_success(response, &url)?;
        info!(ssid = %request.ssid, "credentials delivered to device");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::setup::WifiCredentials;
    use hp_core::ClaimCode;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client(server: &Server) -> SetupApClient {
        SetupApClient::new(server.url(), &HttpSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_hello_reads_ok_flag() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/hello")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        assert!(client(&server).hello().await.unwrap().ok);
    }

    #[tokio::test]
    async fn test_scan_cleans_network_list() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/wifi/scan")
            .with_status(200)
            .with_body(r#"{"networks":[" home ","","Office","home","apt"]}"#)
            .create_async()
            .await;

        let networks = client(&server).scan_networks().await.unwrap();

        assert_eq!(networks, vec!["apt", "home", "Office"]);
    }

    #[tokio::test]
    async fn test_scan_rejects_unknown_shape() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/wifi/scan")
            .with_status(200)
            .with_body(r#"{"status":"busy"}"#)
            .create_async()
            .await;

        assert!(client(&server).scan_networks().await.is_err());
    }

    #[tokio::test]
    async fn test_send_wifi_config_posts_credentials() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/wifi/config")
            .match_body(Matcher::Json(json!({
                "ssid": "Home",
                "password": "secret",
                "claim": "785"
            })))
            .with_status(200)
            .create_async()
            .await;
        let request = WifiConfigRequest::new(
            &WifiCredentials {
                ssid: "Home".to_string(),
                password: "secret".to_string(),
            },
            ClaimCode::parse("785").unwrap(),
        );

        client(&server).send_wifi_config(&request).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_wifi_config_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/wifi/config")
            .with_status(400)
            .create_async()
            .await;
        let request = WifiConfigRequest::new(
            &WifiCredentials {
                ssid: "Home".to_string(),
                password: String::new(),
            },
            ClaimCode::parse("785").unwrap(),
        );

        let err = client(&server).send_wifi_config(&request).await.unwrap_err();

        assert!(err.to_string().contains("400"), "{err}");
    }
}
