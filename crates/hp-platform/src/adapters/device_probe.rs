//! Identity probe: `GET http://<host>:<port>/hello`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use hp_core::backend::shape::device_id_of;
use hp_core::ports::{DeviceProbePort, ProbeTarget};
use hp_core::{Absence, DeviceId, Lookup};
use serde_json::Value;
use tracing::debug;

use crate::http::absence_of;

/// Device Probe over plain HTTP.
pub struct HttpDeviceProbe {
    client: reqwest::Client,
    identity_path: String,
}

impl HttpDeviceProbe {
    /// `identity_path` is the well-known path served by the firmware (`/hello`).
    ///
    /// The timeout is applied per request, see [`DeviceProbePort::probe`].
    pub fn new(identity_path: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            identity_path: identity_path.into(),
        })
    }

    fn url(&self, target: &ProbeTarget) -> String {
        format!(
            "http://{}/{}",
            target,
            self.identity_path.trim_start_matches('/')
        )
    }
}

/// Identifier reported in a 2xx body, else `fallback`.
fn identity_from_body(body: &[u8], fallback: &DeviceId) -> DeviceId {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| device_id_of(&value))
        .unwrap_or_else(|| fallback.clone())
}

#[async_trait]
impl DeviceProbePort for HttpDeviceProbe {
    async fn probe(
        &self,
        target: &ProbeTarget,
        timeout: Duration,
        fallback: &DeviceId,
    ) -> Lookup<DeviceId> {
        let url = self.url(target);
        let response = match self.client.get(&url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                let absence = absence_of(&err);
                debug!(%url, %absence, "probe failed");
                return Lookup::Absent(absence);
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "probe rejected");
            return Lookup::Absent(Absence::Status(status.as_u16()));
        }

        // A 2xx answer is a hit even when the body is cut off.
        let body = response.bytes().await.unwrap_or_default();
        Lookup::Found(identity_from_body(&body, fallback))
    }
}
