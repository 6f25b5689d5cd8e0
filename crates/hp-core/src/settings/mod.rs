pub mod defaults;
pub mod duration_ms;
pub mod model;

pub use model::{
    ClaimSettings, DiscoverySettings, HttpSettings, ProvisioningSettings, Settings,
    SettingsError, CURRENT_SCHEMA_VERSION,
};
