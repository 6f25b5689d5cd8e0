//! Local persistence ports.

use anyhow::Result;
use async_trait::async_trait;

use crate::auth::AuthTokens;
use crate::backend::DeviceRecord;

/// Last known device list, kept across runs.
#[async_trait]
pub trait DeviceCachePort: Send + Sync {
    /// `Ok(None)` when nothing has been cached yet.
    async fn load(&self) -> Result<Option<Vec<DeviceRecord>>>;

    async fn save(&self, devices: &[DeviceRecord]) -> Result<()>;
}

/// "Persist/retrieve auth token".
#[async_trait]
pub trait AuthTokenPort: Send + Sync {
    async fn load(&self) -> Result<Option<AuthTokens>>;

    async fn save(&self, tokens: &AuthTokens) -> Result<()>;

    /// Remove stored tokens. Succeeds when nothing is stored.
    async fn clear(&self) -> Result<()>;
}
