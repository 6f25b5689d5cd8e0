//! Discovery domain: events emitted by a discovery run and the retry policy
//! used by its server-polling channel.

mod backoff;
mod event;

pub use backoff::BackoffPolicy;
pub use event::{DiscoveryEvent, DiscoveryOutcome, FoundVia, ServiceHit};
