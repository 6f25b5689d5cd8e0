//! Single-writer event gate.
//!
//! Producers append through [`EventGate::emit`]; exactly one caller of
//! [`EventGate::terminate`] flips the gate and appends the terminal batch.
//! Appends are serialized by the sender mutex, so the consumer sees a strict
//! order and nothing after the terminal event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use hp_core::{DiscoveryEvent, DiscoveryOutcome};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

type Sender = mpsc::UnboundedSender<DiscoveryEvent>;

pub(crate) struct EventGate {
    closed: AtomicBool,
    cancel: CancellationToken,
    tx: Mutex<Option<Sender>>,
    outcome: Mutex<Option<DiscoveryOutcome>>,
}

impl EventGate {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<DiscoveryEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gate = Self {
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            tx: Mutex::new(Some(tx)),
            outcome: Mutex::new(None),
        };
        (gate, rx)
    }

    /// Append a non-terminal event. Returns `false` once the gate is closed.
    pub(crate) fn emit(&self, event: DiscoveryEvent) -> bool {
        let tx = lock(&self.tx);
        if self.is_closed() {
            return false;
        }
        match &*tx {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Close the gate and append `events` as the final batch.
    ///
    /// Only the first caller succeeds; every later call is a no-op returning
    /// `false`. The last event of the batch should be terminal.
    pub(crate) fn terminate<I>(&self, events: I) -> bool
    where
        I: IntoIterator<Item = DiscoveryEvent>,
    {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.cancel.cancel();

        let mut tx = lock(&self.tx);
        let sender = tx.take();
        for event in events {
            if let Some(outcome) = event.outcome() {
                *lock(&self.outcome) = Some(outcome);
            }
            if let Some(sender) = sender.as_ref() {
                let _ = sender.send(event);
            }
        }
        true
    }

    /// Close without emitting anything (consumer went away).
    pub(crate) fn close_silently(&self) -> bool {
        self.terminate(std::iter::empty())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once the gate is closed.
    pub(crate) fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub(crate) fn outcome(&self) -> Option<DiscoveryOutcome> {
        lock(&self.outcome).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::DeviceId;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    fn finished(id: &str) -> DiscoveryEvent {
        DiscoveryEvent::Finished {
            device_id: DeviceId::from(id),
        }
    }

    #[test]
    fn test_only_first_terminate_wins() {
        let (gate, mut rx) = EventGate::new();

        assert!(gate.emit(DiscoveryEvent::DirectoryEntryFound {
            name: "hpfs-785".to_string(),
            address: Ipv4Addr::new(192, 168, 1, 40),
            port: 80,
        }));
        assert!(gate.terminate([finished("a")]));
        assert!(!gate.terminate([finished("b")]));
        assert!(!gate.emit(DiscoveryEvent::Cancelled));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], finished("a"));
        assert_eq!(gate.outcome(), Some(DiscoveryOutcome::Found(DeviceId::from("a"))));
    }

    #[test]
    fn test_receiver_ends_after_terminal_batch() {
        let (gate, mut rx) = EventGate::new();
        gate.terminate([DiscoveryEvent::Cancelled]);

        assert_eq!(rx.try_recv().ok(), Some(DiscoveryEvent::Cancelled));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_concurrent_terminators_produce_one_terminal_event() {
        for _ in 0..50 {
            let (gate, mut rx) = EventGate::new();
            let gate = Arc::new(gate);
            let winners: usize = (0..8)
                .map(|i| {
                    let gate = gate.clone();
                    std::thread::spawn(move || gate.terminate([finished(&format!("d{i}"))]))
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|handle| usize::from(handle.join().unwrap()))
                .sum();
            assert_eq!(winners, 1);

            let mut terminals = 0;
            while let Ok(event) = rx.try_recv() {
                assert!(event.is_terminal());
                terminals += 1;
            }
            assert_eq!(terminals, 1);
        }
    }
}
