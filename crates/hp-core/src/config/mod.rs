//! # Configuration DTO / 配置数据
//!
//! TOML → [`AppConfig`] mapping. Missing string fields map to empty values;
//! deciding what an empty value means is left to the caller (bootstrap).
//! Tunables are delegated to [`Settings`], which carries its own per-field
//! defaults.

use std::path::PathBuf;

use anyhow::Context;

use crate::naming::DeviceNaming;
use crate::settings::Settings;

/// Default backend API base.
pub const DEFAULT_API_BASE_URL: &str = "https://api.hpfs.ru";
/// Address of the device on its own setup network.
pub const DEFAULT_SETUP_AP_BASE_URL: &str = "http://192.168.4.1";
/// Shared passphrase of the setup network.
pub const DEFAULT_SETUP_AP_PASSPHRASE: &str = "setup1234";

/// Application configuration DTO
/// 应用配置 DTO
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Backend base URL (may be empty)
    pub api_base_url: String,

    /// Device HTTP base on the setup network (may be empty)
    pub setup_ap_base_url: String,

    /// Setup network passphrase (may be empty)
    pub setup_ap_passphrase: String,

    /// Data directory for cache, tokens and logs (path only, no existence check)
    pub data_dir: PathBuf,

    pub naming: DeviceNaming,

    pub settings: Settings,
}

impl AppConfig {
    /// Create AppConfig from a TOML value.
    ///
    /// Only malformed `[naming]` / tunable tables are errors; absent values are
    /// facts, not failures.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let string_at = |table: &str, key: &str| {
            toml_value
                .get(table)
                .and_then(|t| t.get(key))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        let naming = match toml_value.get("naming") {
            Some(value) => value
                .clone()
                .try_into::<DeviceNaming>()
                .context("invalid [naming] table")?,
            None => DeviceNaming::default(),
        };

        let settings = toml_value
            .clone()
            .try_into::<Settings>()
            .context("invalid tunables")?;

        Ok(Self {
            api_base_url: string_at("backend", "api_base_url"),
            setup_ap_base_url: string_at("setup", "base_url"),
            setup_ap_passphrase: string_at("setup", "passphrase"),
            data_dir: PathBuf::from(string_at("storage", "data_dir")),
            naming,
            settings,
        })
    }

    /// Create AppConfig with production defaults rooted at `data_dir`.
    ///
    /// The caller computes `data_dir` (e.g. with the `dirs` crate).
    pub fn with_system_defaults(data_dir: PathBuf) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            setup_ap_base_url: DEFAULT_SETUP_AP_BASE_URL.to_string(),
            setup_ap_passphrase: DEFAULT_SETUP_AP_PASSPHRASE.to_string(),
            data_dir,
            naming: DeviceNaming::default(),
            settings: Settings::default(),
        }
    }

    pub fn device_cache_path(&self) -> PathBuf {
        self.data_dir.join("devices-cache.json")
    }

    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join("auth.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
