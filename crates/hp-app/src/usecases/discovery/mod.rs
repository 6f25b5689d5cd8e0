//! Discovery race
//!
//! ```text
//! start(code)
//!   ├─ directory channel: DNS-SD hits → probe each endpoint
//!   ├─ hostname channel:  probe <prefix>-<code>.<domain> within the local window
//!   ├─ server channel:    device lookup, then claim status, with backoff
//!   └─ overall timer
//!         ↓
//!   EventGate (first terminal writer wins) → ordered event stream
//! ```

mod channels;
mod gate;
mod orchestrator;
mod run;

pub use orchestrator::DiscoveryOrchestrator;
pub use run::{DiscoveryRun, DiscoveryRunHandle};
