use std::net::Ipv4Addr;

use crate::ids::{ClaimCode, DeviceId};

/// A resolved DNS-SD directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHit {
    /// Service instance name (e.g. `hpfs-785`).
    pub name: String,
    pub address: Ipv4Addr,
    /// Advertised port; `0` when the record carried none.
    pub port: u16,
}

/// Point-in-time occurrence in a discovery run.
///
/// 发现流程中的事件。每次运行以 `Finished`、`TimedOut`、`Cancelled`、
/// `Errored` 中的恰好一个结束。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    Started {
        code: ClaimCode,
    },
    DirectoryEntryFound {
        name: String,
        address: Ipv4Addr,
        port: u16,
    },
    ProbeSucceeded {
        device_id: DeviceId,
    },
    ServerObservedDevice {
        device_id: DeviceId,
    },
    Finished {
        device_id: DeviceId,
    },
    TimedOut,
    Cancelled,
    Errored {
        message: String,
    },
}

impl DiscoveryEvent {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DiscoveryEvent::Finished { .. }
                | DiscoveryEvent::TimedOut
                | DiscoveryEvent::Cancelled
                | DiscoveryEvent::Errored { .. }
        )
    }

    /// Outcome carried by a terminal event.
    pub fn outcome(&self) -> Option<DiscoveryOutcome> {
        match self {
            DiscoveryEvent::Finished { device_id } => {
                Some(DiscoveryOutcome::Found(device_id.clone()))
            }
            DiscoveryEvent::TimedOut => Some(DiscoveryOutcome::TimedOut),
            DiscoveryEvent::Cancelled => Some(DiscoveryOutcome::Cancelled),
            DiscoveryEvent::Errored { message } => {
                Some(DiscoveryOutcome::Errored(message.clone()))
            }
            _ => None,
        }
    }
}

/// Which kind of channel produced the winning identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoundVia {
    /// Device answered its identity endpoint (directory hit or hostname).
    Probe,
    /// Backend reported the device or a fulfilled claim.
    Server,
}

impl FoundVia {
    /// Intermediate event emitted just before `Finished`.
    pub fn event(self, device_id: DeviceId) -> DiscoveryEvent {
        match self {
            FoundVia::Probe => DiscoveryEvent::ProbeSucceeded { device_id },
            FoundVia::Server => DiscoveryEvent::ServerObservedDevice { device_id },
        }
    }
}

/// Terminal result of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Found(DeviceId),
    TimedOut,
    Cancelled,
    Errored(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        let id = DeviceId::from("hpfs-785");
        assert!(DiscoveryEvent::Finished {
            device_id: id.clone()
        }
        .is_terminal());
        assert!(DiscoveryEvent::TimedOut.is_terminal());
        assert!(DiscoveryEvent::Cancelled.is_terminal());
        assert!(!DiscoveryEvent::ProbeSucceeded {
            device_id: id.clone()
        }
        .is_terminal());
        assert!(!DiscoveryEvent::Started {
            code: ClaimCode::parse("785").unwrap()
        }
        .is_terminal());
    }

    #[test]
    fn test_outcome_of_finished() {
        let event = DiscoveryEvent::Finished {
            device_id: DeviceId::from("hpfs-785"),
        };
        assert_eq!(
            event.outcome(),
            Some(DiscoveryOutcome::Found(DeviceId::from("hpfs-785")))
        );
        assert_eq!(
            DiscoveryEvent::ServerObservedDevice {
                device_id: DeviceId::from("x")
            }
            .outcome(),
            None
        );
    }
}
