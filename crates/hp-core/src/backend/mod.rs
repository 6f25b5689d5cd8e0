//! Backend wire model and response-shape parsing.

mod model;
pub mod shape;

pub use model::{AttachRequest, ClaimStatus, DeviceRecord, PlantRecord};
