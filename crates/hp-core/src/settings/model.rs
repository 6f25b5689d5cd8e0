use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::duration_ms;
use crate::discovery::BackoffPolicy;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Settings that cannot drive a discovery run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("overall discovery timeout must be greater than zero")]
    ZeroOverallTimeout,
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("server backoff must not shrink (multiplier {multiplier}) and cap must be >= base")]
    InvalidBackoff { multiplier: f64 },
    #[error("confirmation attempts must be greater than zero")]
    ZeroConfirmAttempts,
}

/// Discovery race tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Hard deadline of a run; also the lifetime of server polling.
    #[serde(rename = "overall_timeout_ms", with = "duration_ms")]
    pub overall_timeout: Duration,
    /// Lifetime of the well-known hostname channel.
    #[serde(rename = "local_window_ms", with = "duration_ms")]
    pub local_window: Duration,
    #[serde(rename = "hostname_probe_timeout_ms", with = "duration_ms")]
    pub hostname_probe_timeout: Duration,
    #[serde(rename = "hostname_retry_interval_ms", with = "duration_ms")]
    pub hostname_retry_interval: Duration,
    #[serde(rename = "directory_probe_timeout_ms", with = "duration_ms")]
    pub directory_probe_timeout: Duration,
    pub server_backoff: BackoffPolicy,
}

impl DiscoverySettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.overall_timeout.is_zero() {
            return Err(SettingsError::ZeroOverallTimeout);
        }
        let durations = [
            ("hostname_probe_timeout_ms", self.hostname_probe_timeout),
            ("hostname_retry_interval_ms", self.hostname_retry_interval),
            ("directory_probe_timeout_ms", self.directory_probe_timeout),
        ];
        if let Some((field, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(SettingsError::ZeroDuration { field: *field });
        }
        if !self.server_backoff.is_well_formed() || self.server_backoff.base.is_zero() {
            return Err(SettingsError::InvalidBackoff {
                multiplier: self.server_backoff.multiplier,
            });
        }
        Ok(())
    }
}

/// Attach confirmation polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimSettings {
    #[serde(rename = "confirm_interval_ms", with = "duration_ms")]
    pub confirm_interval: Duration,
    pub confirm_max_attempts: u32,
}

impl ClaimSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.confirm_max_attempts == 0 {
            return Err(SettingsError::ZeroConfirmAttempts);
        }
        Ok(())
    }
}

/// Setup-network handoff waits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningSettings {
    #[serde(rename = "join_max_wait_ms", with = "duration_ms")]
    pub join_max_wait: Duration,
    #[serde(rename = "leave_max_wait_ms", with = "duration_ms")]
    pub leave_max_wait: Duration,
    #[serde(rename = "internet_max_wait_ms", with = "duration_ms")]
    pub internet_max_wait: Duration,
    #[serde(rename = "poll_interval_ms", with = "duration_ms")]
    pub poll_interval: Duration,
    #[serde(rename = "cooldown_ms", with = "duration_ms")]
    pub cooldown: Duration,
    pub warmup_attempts: u32,
    pub warmup_backoff: BackoffPolicy,
}

/// Per-request timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    #[serde(rename = "backend_timeout_ms", with = "duration_ms")]
    pub backend_timeout: Duration,
    #[serde(rename = "attach_timeout_ms", with = "duration_ms")]
    pub attach_timeout: Duration,
    #[serde(rename = "setup_timeout_ms", with = "duration_ms")]
    pub setup_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub claim: ClaimSettings,

    #[serde(default)]
    pub provisioning: ProvisioningSettings,

    #[serde(default)]
    pub http: HttpSettings,
}

fn current_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}
