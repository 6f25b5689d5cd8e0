//! Port interfaces for the application layer
//!
//! Use cases in `hp-app` depend on these traits only; `hp-infra` and
//! `hp-platform` provide the implementations.
//!
//! Presence-style ports (probe, server presence, device lookup) return
//! [`Lookup`](crate::lookup::Lookup) instead of errors: at these seams a
//! failed request means "not there yet".

pub mod backend;
pub mod discovery;
pub mod identity;
pub mod setup;
pub mod storage;

pub use backend::{AttachError, DeviceBackendPort, DeviceListRefreshPort};
pub use discovery::{DeviceProbePort, ProbeTarget, ServerPresencePort, ServiceLocatorPort};
pub use identity::CurrentUserPort;
pub use setup::{ConnectivityPort, DeviceSetupPort, NetworkJoinPort};
pub use storage::{AuthTokenPort, DeviceCachePort};
