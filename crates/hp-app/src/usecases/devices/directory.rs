//! Device directory
//!
//! Explicitly constructed context object owning the account's device and
//! plant lists. Screens and commands share one instance instead of reaching
//! for process-wide stores.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use hp_core::backend::{DeviceRecord, PlantRecord};
use hp_core::ports::{DeviceBackendPort, DeviceCachePort, DeviceListRefreshPort};
use hp_core::{DeviceId, PlantId};
use tokio::sync::RwLock;
use tracing::{debug, info, info_span, warn, Instrument};

pub struct DeviceDirectory {
    backend: Arc<dyn DeviceBackendPort>,
    cache: Arc<dyn DeviceCachePort>,
    devices: RwLock<Vec<DeviceRecord>>,
    plants: RwLock<Vec<PlantRecord>>,
}

impl DeviceDirectory {
    pub fn new(backend: Arc<dyn DeviceBackendPort>, cache: Arc<dyn DeviceCachePort>) -> Self {
        Self {
            backend,
            cache,
            devices: RwLock::new(Vec::new()),
            plants: RwLock::new(Vec::new()),
        }
    }

    pub async fn devices(&self) -> Vec<DeviceRecord> {
        self.devices.read().await.clone()
    }

    pub async fn plants(&self) -> Vec<PlantRecord> {
        self.plants.read().await.clone()
    }

    /// Replace the in-memory list with the cached one, if any.
    ///
    /// Returns the number of cached devices.
    pub async fn load_from_cache(&self) -> Result<usize> {
        let Some(cached) = self.cache.load().await.context("failed to read device cache")? else {
            debug!("device cache is empty");
            return Ok(0);
        };
        let count = cached.len();
        *self.devices.write().await = cached;
        Ok(count)
    }

    /// Fetch the device list from the backend and persist it.
    ///
    /// On failure the current list is kept as is.
    pub async fn refresh_from_server(&self) -> Result<Vec<DeviceRecord>> {
        let span = info_span!("usecase.refresh_devices.execute");
        async {
            let rows = self
                .backend
                .list_devices()
                .await
                .context("failed to list devices")?;

            if let Err(err) = self.cache.save(&rows).await {
                warn!(error = %err, "failed to write device cache");
            }
            *self.devices.write().await = rows.clone();
            info!(count = rows.len(), "device list refreshed");
            Ok(rows)
        }
        .instrument(span)
        .await
    }

    pub async fn refresh_plants(&self) -> Result<Vec<PlantRecord>> {
        let plants = self
            .backend
            .list_plants()
            .await
            .context("failed to list plants")?;
        *self.plants.write().await = plants.clone();
        Ok(plants)
    }

    /// Add a freshly claimed device without waiting for a refresh.
    ///
    /// No-op when a device with the same id is already listed; returns
    /// whether the device was added.
    pub async fn add_claimed_device(&self, device_id: DeviceId, plant_id: PlantId) -> bool {
        let mut devices = self.devices.write().await;
        if devices
            .iter()
            .any(|d| d.identifier().as_ref() == Some(&device_id))
        {
            return false;
        }
        devices.push(DeviceRecord {
            plant_id: Some(plant_id),
            online: Some(true),
            ..DeviceRecord::with_id(device_id)
        });
        true
    }

    pub async fn find(&self, device_id: &DeviceId) -> Option<DeviceRecord> {
        self.devices
            .read()
            .await
            .iter()
            .find(|d| d.identifier().as_ref() == Some(device_id))
            .cloned()
    }
}

#[async_trait]
impl DeviceListRefreshPort for DeviceDirectory {
    async fn refresh_devices(&self) -> Result<()> {
        self.refresh_from_server().await.map(|_| ())
    }
}
