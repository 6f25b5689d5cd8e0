//! # hp-platform
//!
//! Network-facing implementations of the `hp-core` ports:
//! DNS-SD browsing, the device identity probe, the backend REST client,
//! the setup-network HTTP client, reachability checks and network joining.

pub mod adapters;
mod http;

pub use adapters::{
    BackendClient, HttpDeviceProbe, ManualNetworkJoin, MdnsServiceLocator, NmcliNetworkJoin,
    SetupApClient, TcpConnectivity,
};
