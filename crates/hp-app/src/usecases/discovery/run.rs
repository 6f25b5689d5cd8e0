use std::sync::{Arc, Mutex};

use futures::Stream;
use hp_core::discovery::FoundVia;
use hp_core::ports::ServiceLocatorPort;
use hp_core::{DeviceId, DiscoveryEvent, DiscoveryOutcome};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use super::gate::EventGate;

/// State shared by the channel tasks of one run.
pub(crate) struct RunShared {
    pub(crate) gate: EventGate,
    locator: Arc<dyn ServiceLocatorPort>,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl RunShared {
    pub(crate) fn new(
        locator: Arc<dyn ServiceLocatorPort>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<DiscoveryEvent>) {
        let (gate, events) = EventGate::new();
        let shared = Arc::new(Self {
            gate,
            locator,
            tasks: Mutex::new(Vec::new()),
        });
        (shared, events)
    }

    /// Track a channel task so teardown can abort it.
    pub(crate) fn register(&self, handle: AbortHandle) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
        if self.gate.is_closed() {
            handle.abort();
        } else {
            tasks.push(handle);
        }
    }

    /// Report a winning identifier. Late winners are ignored.
    pub(crate) fn finish(&self, via: FoundVia, device_id: DeviceId) -> bool {
        let won = self.gate.terminate([
            via.event(device_id.clone()),
            DiscoveryEvent::Finished {
                device_id: device_id.clone(),
            },
        ]);
        if won {
            info!(device_id = %device_id, via = ?via, "discovery finished");
            self.teardown();
        } else {
            debug!(device_id = %device_id, via = ?via, "late result dropped");
        }
        won
    }

    pub(crate) fn time_out(&self, reason: &'static str) -> bool {
        let won = self.gate.terminate([DiscoveryEvent::TimedOut]);
        if won {
            info!(reason, "discovery timed out");
            self.teardown();
        }
        won
    }

    pub(crate) fn fail(&self, message: String) -> bool {
        let won = self.gate.terminate([DiscoveryEvent::Errored { message }]);
        if won {
            self.teardown();
        }
        won
    }

    pub(crate) fn cancel(&self) -> bool {
        let won = self.gate.terminate([DiscoveryEvent::Cancelled]);
        if won {
            info!("discovery cancelled");
            self.teardown();
        }
        won
    }

    fn close_silently(&self) {
        if self.gate.close_silently() {
            debug!("discovery run dropped while running");
            self.teardown();
        }
    }

    /// Stop the locator and abort every channel task.
    fn teardown(&self) {
        self.locator.stop();
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|p| p.into_inner()));
        for task in tasks {
            task.abort();
        }
    }
}

/// One discovery attempt.
///
/// Yields events in order and ends after exactly one terminal event.
/// Dropping the run tears down every channel without emitting anything.
pub struct DiscoveryRun {
    shared: Arc<RunShared>,
    events: mpsc::UnboundedReceiver<DiscoveryEvent>,
}

impl DiscoveryRun {
    pub(crate) fn new(
        shared: Arc<RunShared>,
        events: mpsc::UnboundedReceiver<DiscoveryEvent>,
    ) -> Self {
        Self { shared, events }
    }

    /// Next event, or `None` after the terminal event was consumed.
    pub async fn next_event(&mut self) -> Option<DiscoveryEvent> {
        self.events.recv().await
    }

    /// Drain events until the run ends and return its outcome.
    pub async fn wait(mut self) -> DiscoveryOutcome {
        while let Some(event) = self.next_event().await {
            if let Some(outcome) = event.outcome() {
                return outcome;
            }
        }
        self.outcome().unwrap_or(DiscoveryOutcome::Cancelled)
    }

    /// Consume the run as an event stream.
    pub fn into_stream(self) -> impl Stream<Item = DiscoveryEvent> {
        futures::stream::unfold(self, |mut run| async move {
            run.next_event().await.map(|event| (event, run))
        })
    }

    pub fn handle(&self) -> DiscoveryRunHandle {
        DiscoveryRunHandle {
            shared: self.shared.clone(),
        }
    }

    /// Cancel the run. See [`DiscoveryRunHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    pub fn is_running(&self) -> bool {
        !self.shared.gate.is_closed()
    }

    /// Terminal outcome, once reached.
    pub fn outcome(&self) -> Option<DiscoveryOutcome> {
        self.shared.gate.outcome()
    }
}

impl Drop for DiscoveryRun {
    fn drop(&mut self) {
        self.shared.close_silently();
    }
}

/// Clonable cancellation handle of a [`DiscoveryRun`].
#[derive(Clone)]
pub struct DiscoveryRunHandle {
    shared: Arc<RunShared>,
}

impl DiscoveryRunHandle {
    /// Cancel the run.
    ///
    /// Emits `Cancelled` only if the run was still running; returns whether
    /// this call did it. Repeated calls are no-ops.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    pub fn is_running(&self) -> bool {
        !self.shared.gate.is_closed()
    }
}

impl std::fmt::Debug for DiscoveryRunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryRunHandle")
            .field("running", &self.is_running())
            .finish()
    }
}
