//! Naming conventions shared by the device firmware and the backend.

use serde::{Deserialize, Serialize};

use crate::ids::{ClaimCode, DeviceId};

/// Device naming conventions.
///
/// 设备命名约定：设备 ID、mDNS 主机名、服务类型与临时热点名称都由此派生。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceNaming {
    /// Prefix of device identifiers and hostnames (`hpfs`).
    pub prefix: String,
    /// Local-link domain (`local`).
    pub local_domain: String,
    /// DNS-SD service type advertised on the home network (`_hpfs._tcp`).
    pub service_type: String,
    /// SSID prefix of the temporary setup network (`HPFS_SETUP_`).
    pub setup_ssid_prefix: String,
    /// Identity endpoint served by the device (`/hello`).
    pub identity_path: String,
}

impl Default for DeviceNaming {
    fn default() -> Self {
        Self {
            prefix: "hpfs".to_string(),
            local_domain: "local".to_string(),
            service_type: "_hpfs._tcp".to_string(),
            setup_ssid_prefix: "HPFS_SETUP_".to_string(),
            identity_path: "/hello".to_string(),
        }
    }
}

impl DeviceNaming {
    /// Deterministic identifier used when the device does not report one.
    pub fn fallback_device_id(&self, code: &ClaimCode) -> DeviceId {
        DeviceId::new(format!("{}-{}", self.prefix, code))
    }

    /// Well-known hostname of the device on the home network.
    pub fn local_hostname(&self, code: &ClaimCode) -> String {
        format!("{}-{}.{}", self.prefix, code, self.local_domain)
    }

    /// Name of the temporary setup network.
    pub fn setup_ssid(&self, code: &ClaimCode) -> String {
        format!("{}{}", self.setup_ssid_prefix, code)
    }

    /// Fully qualified DNS-SD browse type, e.g. `_hpfs._tcp.local.`.
    pub fn browse_type(&self) -> String {
        format!(
            "{}.{}.",
            self.service_type.trim_end_matches('.'),
            self.local_domain.trim_end_matches('.')
        )
    }

    /// Normalise a raw identifier: a bare claim code becomes `<prefix>-<code>`.
    pub fn normalize_device_id(&self, raw: &DeviceId) -> DeviceId {
        let expected = format!("{}-", self.prefix);
        if raw.as_str().starts_with(&expected) {
            return raw.clone();
        }
        match ClaimCode::parse(raw.as_str()) {
            Ok(code) => self.fallback_device_id(&code),
            Err(_) => raw.clone(),
        }
    }
}
