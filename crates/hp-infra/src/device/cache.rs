use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use hp_core::backend::DeviceRecord;
use hp_core::ports::DeviceCachePort;
use tracing::debug;

use crate::fs::{read_json, write_json_atomic};

/// Device list cache stored as a JSON array (`devices-cache.json`).
pub struct FileDeviceCache {
    path: PathBuf,
}

impl FileDeviceCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeviceCachePort for FileDeviceCache {
    async fn load(&self) -> Result<Option<Vec<DeviceRecord>>> {
        read_json(&self.path).await
    }

    async fn save(&self, devices: &[DeviceRecord]) -> Result<()> {
        write_json_atomic(&self.path, devices).await?;
        debug!(count = devices.len(), path = %self.path.display(), "device cache written");
        Ok(())
    }
}
