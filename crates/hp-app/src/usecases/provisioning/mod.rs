mod handoff;

pub use handoff::{HandoffError, SetupHandoff};
