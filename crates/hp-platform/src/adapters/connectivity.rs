//! Reachability checks used while the host switches networks.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use hp_core::ports::ConnectivityPort;
use reqwest::Url;
use tokio::net::TcpStream;
use tracing::debug;

use crate::http::build_client;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const WARMUP_TIMEOUT: Duration = Duration::from_secs(6);

/// Public resolvers used as the internet reachability signal.
pub const DEFAULT_INTERNET_PROBES: &[&str] = &["1.1.1.1:443", "8.8.8.8:53"];

/// Connectivity checks based on plain TCP connects plus one HEAD request.
pub struct TcpConnectivity {
    setup_endpoint: String,
    internet_probes: Vec<String>,
    backend_url: String,
    client: reqwest::Client,
}

impl TcpConnectivity {
    pub fn new(setup_base_url: &str, backend_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            setup_endpoint: endpoint_of(setup_base_url)?,
            internet_probes: DEFAULT_INTERNET_PROBES
                .iter()
                .map(|probe| probe.to_string())
                .collect(),
            backend_url: backend_url.into(),
            client: build_client(WARMUP_TIMEOUT)?,
        })
    }

    /// Replace the `host:port` targets used by [`ConnectivityPort::has_internet`].
    pub fn with_internet_probes(mut self, probes: Vec<String>) -> Self {
        self.internet_probes = probes;
        self
    }
}

/// `host:port` of an HTTP base URL, using the scheme's default port.
fn endpoint_of(base_url: &str) -> Result<String> {
    let url = Url::parse(base_url).with_context(|| format!("invalid URL: {base_url}"))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("URL has no host: {base_url}"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow!("URL has no port: {base_url}"))?;
    Ok(format!("{host}:{port}"))
}

async fn can_open(endpoint: &str) -> bool {
    match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(endpoint)).await {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            debug!(%endpoint, error = %err, "connect failed");
            false
        }
        Err(_) => {
            debug!(%endpoint, "connect timed out");
            false
        }
    }
}

#[async_trait]
impl ConnectivityPort for TcpConnectivity {
    async fn setup_network_reachable(&self) -> bool {
        can_open(&self.setup_endpoint).await
    }

    async fn has_internet(&self) -> bool {
        for probe in &self.internet_probes {
            if can_open(probe).await {
                return true;
            }
        }
        false
    }

    async fn reach_backend(&self) -> bool {
        match self.client.head(&self.backend_url).send().await {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "backend warm-up answered");
                true
            }
            Err(err) => {
                debug!(error = %err, "backend warm-up failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tokio::net::TcpListener;

    #[test]
    fn test_endpoint_of_uses_default_port() {
        assert_eq!(endpoint_of("http://192.168.4.1").unwrap(), "192.168.4.1:80");
        assert_eq!(endpoint_of("http://10.0.0.2:8080/").unwrap(), "10.0.0.2:8080");
        assert!(endpoint_of("not a url").is_err());
    }

    #[tokio::test]
    async fn test_setup_network_reachable_with_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connectivity =
            TcpConnectivity::new(&format!("http://127.0.0.1:{port}"), "http://127.0.0.1:9")
                .unwrap();

        assert!(connectivity.setup_network_reachable().await);

        drop(listener);
        assert!(!connectivity.setup_network_reachable().await);
    }

    #[tokio::test]
    async fn test_has_internet_tries_each_probe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().to_string();
        let connectivity = TcpConnectivity::new("http://127.0.0.1:9", "http://127.0.0.1:9")
            .unwrap()
            .with_internet_probes(vec!["127.0.0.1:9".to_string(), open]);

        assert!(connectivity.has_internet().await);

        let offline = connectivity.with_internet_probes(vec!["127.0.0.1:9".to_string()]);
        assert!(!offline.has_internet().await);
    }

    #[tokio::test]
    async fn test_reach_backend_accepts_any_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/")
            .with_status(405)
            .create_async()
            .await;
        let connectivity = TcpConnectivity::new("http://127.0.0.1:9", server.url()).unwrap();

        assert!(connectivity.reach_backend().await);
        mock.assert_async().await;
    }
}
