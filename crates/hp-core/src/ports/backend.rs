//! Account-side backend operations.

use anyhow::Result;
use async_trait::async_trait;

use crate::backend::{AttachRequest, DeviceRecord, PlantRecord};
use crate::ids::DeviceId;
use crate::lookup::Lookup;

/// Failure of the attach call. Always terminal for the attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachError {
    /// Backend answered with a non-2xx status (or `ok: false`).
    #[error("attach rejected with status {status}{}", rejection_suffix(.message))]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    /// Request never got an answer.
    #[error("attach request failed: {0}")]
    Unreachable(String),
}

fn rejection_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

#[async_trait]
pub trait DeviceBackendPort: Send + Sync {
    /// `POST /devices/attach`. Not retried by callers.
    async fn attach(&self, request: &AttachRequest) -> Result<(), AttachError>;

    /// Current backend view of one device (object or first array record).
    async fn lookup_device(&self, device_id: &DeviceId) -> Lookup<DeviceRecord>;

    /// Devices owned by the current account.
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>>;

    /// Plants the current account can attach devices to.
    async fn list_plants(&self) -> Result<Vec<PlantRecord>>;
}

/// "Refresh local device-list cache from server".
#[async_trait]
pub trait DeviceListRefreshPort: Send + Sync {
    async fn refresh_devices(&self) -> Result<()>;
}
