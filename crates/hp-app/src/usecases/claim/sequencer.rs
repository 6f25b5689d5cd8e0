use std::sync::Arc;

use hp_core::backend::{AttachRequest, DeviceRecord};
use hp_core::lookup::Lookup;
use hp_core::ports::{AttachError, CurrentUserPort, DeviceBackendPort, DeviceListRefreshPort};
use hp_core::settings::ClaimSettings;
use hp_core::{ClaimCode, DeviceId, PlantId};
use tracing::{debug, info, info_span, warn, Instrument};

/// Terminal failures of attach-and-confirm.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// The attach call failed; no confirmation poll was made.
    #[error("attach rejected: {0}")]
    AttachRejected(#[source] AttachError),

    /// Attach was accepted but the binding never became visible. The device
    /// may still end up attached.
    #[error("attach not confirmed after {attempts} polls")]
    ConfirmationTimeout { attempts: u32 },
}

/// Proof that the backend shows the device attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachConfirmation {
    pub device_id: DeviceId,
    /// 1-based index of the satisfying poll.
    pub attempts: u32,
    pub record: DeviceRecord,
}

/// Claim/Attach Sequencer
///
/// Performs the irreversible attach call once, then polls the device lookup at
/// a fixed interval until the backend shows the device owned by the current
/// user (or flagged attached).
pub struct ClaimAttachSequencer {
    backend: Arc<dyn DeviceBackendPort>,
    current_user: Arc<dyn CurrentUserPort>,
    refresh: Arc<dyn DeviceListRefreshPort>,
    settings: ClaimSettings,
}

impl ClaimAttachSequencer {
    pub fn new(
        backend: Arc<dyn DeviceBackendPort>,
        current_user: Arc<dyn CurrentUserPort>,
        refresh: Arc<dyn DeviceListRefreshPort>,
        settings: ClaimSettings,
    ) -> Self {
        Self {
            backend,
            current_user,
            refresh,
            settings,
        }
    }

    pub async fn attach_and_confirm(
        &self,
        device_id: &DeviceId,
        plant_id: PlantId,
        claim: &ClaimCode,
    ) -> Result<AttachConfirmation, SequencerError> {
        let span = info_span!(
            "usecase.attach_device.execute",
            device_id = %device_id,
            plant_id = %plant_id,
            code = %claim
        );
        async {
            // 1. attach (never retried)
            let request = AttachRequest {
                device_id: device_id.clone(),
                plant_id,
                claim: claim.clone(),
            };
            if let Err(err) = self.backend.attach(&request).await {
                warn!(error = %err, "attach failed");
                return Err(SequencerError::AttachRejected(err));
            }
            info!("attach accepted, waiting for confirmation");

            // 2. poll for visibility
            let user = self.current_user.current_user().await;
            if user.is_none() {
                debug!("no current user; only the attached flag can confirm");
            }
            let max_attempts = self.settings.confirm_max_attempts;
            for attempt in 1..=max_attempts {
                tokio::time::sleep(self.settings.confirm_interval).await;

                match self.backend.lookup_device(device_id).await {
                    Lookup::Found(record) if record.is_attached_to(user) => {
                        info!(attempt, "attach confirmed");
                        // 3. refresh the local device list
                        if let Err(err) = self.refresh.refresh_devices().await {
                            warn!(error = %err, "device list refresh failed after attach");
                        }
                        return Ok(AttachConfirmation {
                            device_id: device_id.clone(),
                            attempts: attempt,
                            record,
                        });
                    }
                    Lookup::Found(record) => {
                        debug!(attempt, owner = ?record.owner_id, "device visible but not attached yet");
                    }
                    Lookup::Absent(reason) => {
                        debug!(attempt, reason = %reason, "device not visible yet");
                    }
                }
            }

            warn!(attempts = max_attempts, "attach not confirmed");
            Err(SequencerError::ConfirmationTimeout {
                attempts: max_attempts,
            })
        }
        .instrument(span)
        .await
    }
}
