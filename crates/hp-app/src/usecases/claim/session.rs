//! Claim session controller
//!
//! Owns one [`ClaimSession`] and at most one active discovery run. Starting
//! a new run always cancels and tears down the previous one first.

use std::future::Future;
use std::sync::Arc;

use hp_core::{ClaimCode, DeviceId, DiscoveryEvent, DiscoveryOutcome, PlantId};
use tracing::{info, info_span, Instrument};

use super::sequencer::{AttachConfirmation, ClaimAttachSequencer, SequencerError};
use crate::usecases::discovery::{DiscoveryOrchestrator, DiscoveryRun, DiscoveryRunHandle};

/// Claim code, target plant and (once known) the device identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSession {
    pub code: ClaimCode,
    pub plant_id: PlantId,
    pub device_id: Option<DeviceId>,
}

impl ClaimSession {
    pub fn new(code: ClaimCode, plant_id: PlantId) -> Self {
        Self {
            code,
            plant_id,
            device_id: None,
        }
    }
}

/// Why a claim flow did not complete.
#[derive(Debug, thiserror::Error)]
pub enum ClaimFlowError {
    #[error("device was not found before the discovery deadline")]
    DiscoveryTimedOut,

    #[error("discovery was cancelled")]
    DiscoveryCancelled,

    #[error("discovery failed: {0}")]
    DiscoveryErrored(String),

    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

/// Successful end of a claim flow.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimReport {
    pub device_id: DeviceId,
    pub confirmation: AttachConfirmation,
}

pub struct ClaimSessionController {
    orchestrator: DiscoveryOrchestrator,
    sequencer: Arc<ClaimAttachSequencer>,
    session: ClaimSession,
    active: Option<DiscoveryRunHandle>,
}

impl ClaimSessionController {
    pub fn new(
        orchestrator: DiscoveryOrchestrator,
        sequencer: Arc<ClaimAttachSequencer>,
        session: ClaimSession,
    ) -> Self {
        Self {
            orchestrator,
            sequencer,
            session,
            active: None,
        }
    }

    pub fn session(&self) -> &ClaimSession {
        &self.session
    }

    /// Start a fresh discovery run, tearing down any previous one first.
    pub fn start_discovery(&mut self) -> DiscoveryRun {
        self.cancel_discovery();
        let run = self.orchestrator.start(self.session.code.clone());
        self.active = Some(run.handle());
        run
    }

    /// Cancel the active run, if any. Returns whether a run was cancelled.
    pub fn cancel_discovery(&mut self) -> bool {
        match self.active.take() {
            Some(handle) => handle.cancel(),
            None => false,
        }
    }

    pub fn has_active_run(&self) -> bool {
        self.active.as_ref().is_some_and(|h| h.is_running())
    }

    /// Discover the device, then attach and confirm it.
    ///
    /// `on_event` sees every discovery event in order.
    pub async fn run_to_completion<F>(&mut self, on_event: F) -> Result<ClaimReport, ClaimFlowError>
    where
        F: FnMut(&DiscoveryEvent),
    {
        self.run_to_completion_until(on_event, std::future::pending())
            .await
    }

    /// Same as [`run_to_completion`](Self::run_to_completion), but cancels
    /// discovery once `interrupt` resolves. The run still ends with its
    /// `Cancelled` event, which `on_event` sees.
    pub async fn run_to_completion_until<F, I>(
        &mut self,
        mut on_event: F,
        interrupt: I,
    ) -> Result<ClaimReport, ClaimFlowError>
    where
        F: FnMut(&DiscoveryEvent),
        I: Future<Output = ()>,
    {
        let span = info_span!("usecase.claim_device.execute", code = %self.session.code);
        let mut run = self.start_discovery();
        let handle = run.handle();

        let outcome = async {
            tokio::pin!(interrupt);
            let mut interrupted = false;
            loop {
                let event = tokio::select! {
                    event = run.next_event() => event,
                    _ = &mut interrupt, if !interrupted => {
                        interrupted = true;
                        if handle.cancel() {
                            info!("claim interrupted, discovery cancelled");
                        }
                        continue;
                    }
                };
                match event {
                    Some(event) => {
                        on_event(&event);
                        if let Some(outcome) = event.outcome() {
                            return outcome;
                        }
                    }
                    None => return run.outcome().unwrap_or(DiscoveryOutcome::Cancelled),
                }
            }
        }
        .instrument(span.clone())
        .await;
        self.active = None;

        let device_id = match outcome {
            DiscoveryOutcome::Found(device_id) => device_id,
            DiscoveryOutcome::TimedOut => return Err(ClaimFlowError::DiscoveryTimedOut),
            DiscoveryOutcome::Cancelled => return Err(ClaimFlowError::DiscoveryCancelled),
            DiscoveryOutcome::Errored(message) => {
                return Err(ClaimFlowError::DiscoveryErrored(message))
            }
        };
        info!(parent: &span, device_id = %device_id, "device discovered");

        let confirmation = self.confirm(device_id.clone()).await?;
        Ok(ClaimReport {
            device_id,
            confirmation,
        })
    }

    /// User-override path: the device id is already known locally.
    ///
    /// Cancels any active run, then uses the same attach-and-confirm contract.
    pub async fn attach_known_device(
        &mut self,
        device_id: DeviceId,
    ) -> Result<AttachConfirmation, ClaimFlowError> {
        if self.cancel_discovery() {
            info!(device_id = %device_id, "discovery cancelled by manual attach");
        }
        Ok(self.confirm(device_id).await?)
    }

    async fn confirm(&mut self, device_id: DeviceId) -> Result<AttachConfirmation, SequencerError> {
        self.session.device_id = Some(device_id.clone());
        self.sequencer
            .attach_and_confirm(&device_id, self.session.plant_id, &self.session.code)
            .await
    }
}
