//! DNS-SD browse-and-resolve on the local network.
//!
//! 基于 mdns-sd 的服务浏览：每个解析出 IPv4 地址的条目都会转发给调用方。

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use hp_core::discovery::ServiceHit;
use hp_core::ports::ServiceLocatorPort;
use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const HIT_BUFFER: usize = 64;

struct ActiveBrowse {
    service_type: String,
    forwarder: JoinHandle<()>,
}

/// Local Service Locator backed by an mDNS daemon.
pub struct MdnsServiceLocator {
    daemon: ServiceDaemon,
    /// Sender of the current browse. Taken on `stop`, so nothing is delivered afterwards.
    sink: Arc<Mutex<Option<mpsc::Sender<ServiceHit>>>>,
    active: Mutex<Option<ActiveBrowse>>,
}

impl MdnsServiceLocator {
    pub fn new() -> Result<Self> {
        let daemon = ServiceDaemon::new().context("failed to start mDNS daemon")?;
        Ok(Self {
            daemon,
            sink: Arc::new(Mutex::new(None)),
            active: Mutex::new(None),
        })
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveBrowse>> {
        self.active.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn halt(&self, browse: ActiveBrowse) {
        browse.forwarder.abort();
        if let Err(err) = self.daemon.stop_browse(&browse.service_type) {
            debug!(error = %err, service_type = %browse.service_type, "stop_browse failed");
        }
    }
}

/// Convert a resolved entry into a hit carrying its first IPv4 address.
fn hit_from(info: &ServiceInfo) -> Option<ServiceHit> {
    let address = first_ipv4(info.get_addresses().iter().copied())?;
    Some(ServiceHit {
        name: info.get_fullname().to_string(),
        address,
        port: info.get_port(),
    })
}

fn first_ipv4(addresses: impl Iterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    let mut v4: Vec<Ipv4Addr> = addresses
        .filter_map(|ip| match ip {
            IpAddr::V4(v4) if !v4.is_unspecified() => Some(v4),
            _ => None,
        })
        .collect();
    v4.sort();
    v4.into_iter().next()
}

#[async_trait]
impl ServiceLocatorPort for MdnsServiceLocator {
    async fn browse(&self, service_type: &str) -> Result<mpsc::Receiver<ServiceHit>> {
        if let Some(previous) = self.active().take() {
            self.halt(previous);
        }

        let events = self
            .daemon
            .browse(service_type)
            .with_context(|| format!("failed to browse {service_type}"))?;
        let (tx, rx) = mpsc::channel(HIT_BUFFER);
        *self.sink.lock().unwrap_or_else(|p| p.into_inner()) = Some(tx);

        let sink = self.sink.clone();
        let forwarder = tokio::spawn(async move {
            while let Ok(event) = events.recv_async().await {
                let ServiceEvent::ServiceResolved(info) = event else {
                    continue;
                };
                let Some(hit) = hit_from(&info) else {
                    debug!(name = %info.get_fullname(), "resolved entry has no IPv4 address");
                    continue;
                };
                let guard = sink.lock().unwrap_or_else(|p| p.into_inner());
                let Some(tx) = guard.as_ref() else {
                    break;
                };
                if let Err(err) = tx.try_send(hit) {
                    warn!(error = %err, "dropping directory hit");
                }
            }
        });

        info!(service_type = %service_type, "DNS-SD browse started");
        *self.active() = Some(ActiveBrowse {
            service_type: service_type.to_string(),
            forwarder,
        });
        Ok(rx)
    }

    fn stop(&self) {
        self.sink.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(browse) = self.active().take() {
            info!(service_type = %browse.service_type, "DNS-SD browse stopped");
            self.halt(browse);
        }
    }
}

impl Drop for MdnsServiceLocator {
    fn drop(&mut self) {
        self.stop();
        if let Err(err) = self.daemon.shutdown() {
            debug!(error = %err, "mDNS daemon shutdown failed");
        }
    }
}
