//! # hp-core
//!
//! Core domain models and ports for claiming HPFS irrigation controllers.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! value objects, the discovery event model, response-shape parsing, retry
//! policies and the port traits implemented by `hp-infra` / `hp-platform`.

pub mod auth;
pub mod backend;
pub mod config;
pub mod discovery;
pub mod ids;
pub mod lookup;
pub mod naming;
pub mod ports;
pub mod settings;
pub mod setup;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use discovery::{BackoffPolicy, DiscoveryEvent, DiscoveryOutcome, ServiceHit};
pub use ids::{ClaimCode, ClaimCodeError, DeviceId, PlantId, UserId};
pub use lookup::{Absence, Lookup};
pub use naming::DeviceNaming;
pub use settings::Settings;
