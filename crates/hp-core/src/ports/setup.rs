//! Ports for the setup-network handoff.

use anyhow::Result;
use async_trait::async_trait;

use crate::setup::{HelloAck, WifiConfigRequest};

/// HTTP surface of the device on its own setup network.
#[async_trait]
pub trait DeviceSetupPort: Send + Sync {
    /// `GET /hello`.
    async fn hello(&self) -> Result<HelloAck>;

    /// `GET /wifi/scan`, already cleaned.
    async fn scan_networks(&self) -> Result<Vec<String>>;

    /// `POST /wifi/config`.
    async fn send_wifi_config(&self, request: &WifiConfigRequest) -> Result<()>;
}

/// "Join local network named X with optional passphrase".
#[async_trait]
pub trait NetworkJoinPort: Send + Sync {
    /// Request association; returns once the request was accepted.
    async fn join(&self, ssid: &str, passphrase: Option<&str>) -> Result<()>;

    /// Drop the stored configuration for `ssid`.
    async fn forget(&self, ssid: &str) -> Result<()>;
}

/// Reachability checks used while switching networks.
#[async_trait]
pub trait ConnectivityPort: Send + Sync {
    /// Whether the device's setup endpoint answers.
    async fn setup_network_reachable(&self) -> bool;

    /// Whether general internet connectivity is available.
    async fn has_internet(&self) -> bool;

    /// One lightweight request to the backend; `true` on any answer.
    async fn reach_backend(&self) -> bool;
}
