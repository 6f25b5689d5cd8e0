use std::time::Duration;

use super::model::*;
use crate::discovery::BackoffPolicy;

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_millis(60_000),
            local_window: Duration::from_millis(12_000),
            hostname_probe_timeout: Duration::from_millis(2_000),
            hostname_retry_interval: Duration::from_millis(600),
            directory_probe_timeout: Duration::from_millis(2_800),
            server_backoff: BackoffPolicy::new(
                Duration::from_millis(700),
                1.4,
                Duration::from_millis(2_000),
            ),
        }
    }
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            confirm_interval: Duration::from_millis(1_500),
            confirm_max_attempts: 20,
        }
    }
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            join_max_wait: Duration::from_millis(20_000),
            leave_max_wait: Duration::from_millis(35_000),
            internet_max_wait: Duration::from_millis(60_000),
            poll_interval: Duration::from_millis(800),
            cooldown: Duration::from_millis(1_000),
            warmup_attempts: 3,
            warmup_backoff: BackoffPolicy::new(
                Duration::from_millis(1_000),
                1.6,
                Duration::from_millis(3_000),
            ),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_millis(5_500),
            attach_timeout: Duration::from_millis(8_000),
            setup_timeout: Duration::from_millis(8_000),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            discovery: DiscoverySettings::default(),
            claim: ClaimSettings::default(),
            provisioning: ProvisioningSettings::default(),
            http: HttpSettings::default(),
        }
    }
}
