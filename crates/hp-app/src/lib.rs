//! HPFS claim flow orchestration layer
//!
//! Use cases built on the `hp-core` ports: the discovery race, the
//! attach-and-confirm sequencer, the claim session controller, the
//! setup-network handoff and the device directory.

pub mod usecases;

pub use usecases::claim::{
    AttachConfirmation, ClaimAttachSequencer, ClaimFlowError, ClaimReport, ClaimSession,
    ClaimSessionController, SequencerError,
};
pub use usecases::devices::DeviceDirectory;
pub use usecases::discovery::{DiscoveryOrchestrator, DiscoveryRun, DiscoveryRunHandle};
pub use usecases::provisioning::{HandoffError, SetupHandoff};
