mod sequencer;
mod session;

pub use sequencer::{AttachConfirmation, ClaimAttachSequencer, SequencerError};
pub use session::{ClaimFlowError, ClaimReport, ClaimSession, ClaimSessionController};
