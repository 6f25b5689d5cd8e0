//! Adapters implementing the `hp-core` ports.

pub mod backend_client;
pub mod connectivity;
pub mod device_probe;
pub mod mdns_locator;
pub mod network_join;
pub mod setup_ap;

pub use backend_client::BackendClient;
pub use connectivity::TcpConnectivity;
pub use device_probe::HttpDeviceProbe;
pub use mdns_locator::MdnsServiceLocator;
pub use network_join::{ManualNetworkJoin, NmcliNetworkJoin};
pub use setup_ap::SetupApClient;
