//! ID type wrappers for type safety.

pub mod claim_code;
pub mod device_id;
mod numeric;

pub use claim_code::{ClaimCode, ClaimCodeError};
pub use device_id::DeviceId;
pub use numeric::{PlantId, UserId};
