//! Setup-network handoff
//!
//! 设备配网流程：加入设备热点 → /hello → /wifi/scan → /wifi/config →
//! 离开热点 → 等待互联网 → 预热后端。之后才开始设备发现。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hp_core::ports::{ConnectivityPort, DeviceSetupPort, NetworkJoinPort};
use hp_core::settings::ProvisioningSettings;
use hp_core::setup::{WifiConfigRequest, WifiCredentials};
use hp_core::{ClaimCode, DeviceNaming};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("failed to join setup network {ssid}: {reason}")]
    JoinFailed { ssid: String, reason: String },

    #[error("setup network {ssid} did not become reachable")]
    SetupNetworkUnreachable { ssid: String },

    #[error("device did not respond on the setup network: {0}")]
    DeviceUnresponsive(String),

    #[error("device rejected the Wi-Fi configuration: {0}")]
    ConfigRejected(String),

    #[error("still connected to setup network {ssid}")]
    StillOnSetupNetwork { ssid: String },

    #[error("no internet connection after leaving the setup network")]
    NoInternet,
}

pub struct SetupHandoff {
    join: Arc<dyn NetworkJoinPort>,
    device: Arc<dyn DeviceSetupPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    naming: DeviceNaming,
    passphrase: String,
    settings: ProvisioningSettings,
}

impl SetupHandoff {
    pub fn new(
        join: Arc<dyn NetworkJoinPort>,
        device: Arc<dyn DeviceSetupPort>,
        connectivity: Arc<dyn ConnectivityPort>,
        naming: DeviceNaming,
        passphrase: String,
        settings: ProvisioningSettings,
    ) -> Self {
        Self {
            join,
            device,
            connectivity,
            naming,
            passphrase,
            settings,
        }
    }

    /// Join the device's setup network and list the networks it can see.
    pub async fn connect(&self, code: &ClaimCode) -> Result<Vec<String>, HandoffError> {
        let ssid = self.naming.setup_ssid(code);
        let span = info_span!("usecase.setup_handoff.connect", ssid = %ssid);
        async {
            let passphrase = Some(self.passphrase.as_str()).filter(|p| !p.is_empty());
            self.join
                .join(&ssid, passphrase)
                .await
                .map_err(|err| HandoffError::JoinFailed {
                    ssid: ssid.clone(),
                    reason: err.to_string(),
                })?;

            let reachable = wait_until(self.settings.join_max_wait, self.settings.poll_interval, || {
                self.connectivity.setup_network_reachable()
            })
            .await;
            if !reachable {
                return Err(HandoffError::SetupNetworkUnreachable { ssid: ssid.clone() });
            }

            let ack = self
                .device
                .hello()
                .await
                .map_err(|err| HandoffError::DeviceUnresponsive(err.to_string()))?;
            if !ack.ok {
                return Err(HandoffError::DeviceUnresponsive(
                    "hello was not acknowledged".to_string(),
                ));
            }

            let networks = self
                .device
                .scan_networks()
                .await
                .map_err(|err| HandoffError::DeviceUnresponsive(err.to_string()))?;
            info!(count = networks.len(), "setup network joined");
            Ok(networks)
        }
        .instrument(span)
        .await
    }

    /// Hand the home network credentials to the device and wait until this
    /// host is back online.
    pub async fn send_credentials(
        &self,
        code: &ClaimCode,
        credentials: &WifiCredentials,
    ) -> Result<(), HandoffError> {
        let ssid = self.naming.setup_ssid(code);
        let span = info_span!(
            "usecase.setup_handoff.send_credentials",
            ssid = %ssid,
            home_ssid = %credentials.ssid
        );
        async {
            let request = WifiConfigRequest::new(credentials, code.clone());
            self.device
                .send_wifi_config(&request)
                .await
                .map_err(|err| HandoffError::ConfigRejected(err.to_string()))?;

            if let Err(err) = self.join.forget(&ssid).await {
                warn!(error = %err, "failed to forget setup network");
            }

            let left = wait_until(self.settings.leave_max_wait, self.settings.poll_interval, || async {
                !self.connectivity.setup_network_reachable().await
            })
            .await;
            if !left {
                return Err(HandoffError::StillOnSetupNetwork { ssid: ssid.clone() });
            }

            let online = wait_until(
                self.settings.internet_max_wait,
                self.settings.poll_interval,
                || self.connectivity.has_internet(),
            )
            .await;
            if !online {
                return Err(HandoffError::NoInternet);
            }

            sleep(self.settings.cooldown).await;
            self.warm_up().await;
            info!("device handed over to home network");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Best-effort backend warm-up with capped exponential backoff.
    async fn warm_up(&self) {
        let backoff = self.settings.warmup_backoff;
        for attempt in 0..self.settings.warmup_attempts {
            if self.connectivity.reach_backend().await {
                debug!(attempt, "backend reachable");
                return;
            }
            sleep(backoff.delay_for(attempt)).await;
        }
        warn!("backend still unreachable after warm-up");
    }
}

/// Poll `check` every `interval` until it holds or `max_wait` elapses.
async fn wait_until<F, Fut>(max_wait: Duration, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + max_wait;
    loop {
        if check().await {
            return true;
        }
        if Instant::now() + interval > deadline {
            return false;
        }
        sleep(interval).await;
    }
}
