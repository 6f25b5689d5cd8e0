pub mod claim;
pub mod devices;
pub mod discovery;
pub mod provisioning;
