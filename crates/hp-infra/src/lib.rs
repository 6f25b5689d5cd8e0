//! File-backed implementations of the `hp-core` storage ports.

pub mod auth;
pub mod device;
pub mod fs;

pub use auth::{FileTokenStore, TokenCurrentUser};
pub use device::FileDeviceCache;
