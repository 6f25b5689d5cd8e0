//! Ports used by the discovery race.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::discovery::ServiceHit;
use crate::ids::{ClaimCode, DeviceId};
use crate::lookup::Lookup;

/// Port used for directory hits that advertise no usable port.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Address the identity probe is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    /// IP literal or hostname.
    pub host: String,
    pub port: u16,
}

impl ProbeTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Target for a resolved directory entry; port `0` maps to 80.
    pub fn from_hit(hit: &ServiceHit) -> Self {
        let port = if hit.port == 0 {
            DEFAULT_HTTP_PORT
        } else {
            hit.port
        };
        Self::new(hit.address.to_string(), port)
    }
}

impl Display for ProbeTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Local Service Locator: DNS-SD browse and resolve.
#[async_trait]
pub trait ServiceLocatorPort: Send + Sync {
    /// Start browsing `service_type` (e.g. `_hpfs._tcp.local.`).
    ///
    /// Every resolved entry is sent on the returned receiver; the same entry
    /// may be reported more than once. Entries that fail to resolve are
    /// dropped silently.
    async fn browse(&self, service_type: &str) -> Result<mpsc::Receiver<ServiceHit>>;

    /// Halt browsing and in-flight resolutions.
    ///
    /// Idempotent. No hit is delivered after this returns.
    fn stop(&self);
}

/// Device Probe: one bounded identity request.
#[async_trait]
pub trait DeviceProbePort: Send + Sync {
    /// Ask `target` for its identity.
    ///
    /// A 2xx response without an identifier yields `fallback`. Failures,
    /// timeouts and non-2xx statuses are absences.
    async fn probe(
        &self,
        target: &ProbeTarget,
        timeout: Duration,
        fallback: &DeviceId,
    ) -> Lookup<DeviceId>;
}

/// Server Presence Query: two read-only backend paths.
#[async_trait]
pub trait ServerPresencePort: Send + Sync {
    /// Has the backend observed `candidate`?
    async fn query_by_device_id(&self, candidate: &DeviceId) -> Lookup<DeviceId>;

    /// Device bound by the claim `code`, once the claim is fulfilled.
    async fn query_by_claim_code(&self, code: &ClaimCode) -> Lookup<DeviceId>;
}
