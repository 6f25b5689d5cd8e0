//! # Configuration Loader / 配置加载器
//!
//! ## Responsibilities / 职责
//!
//! - ✅ Read TOML configuration files / 读取 TOML 配置文件
//! - ✅ Parse TOML into AppConfig DTO / 将 TOML 解析为 AppConfig DTO
//! - ✅ Fill empty fields with system defaults / 用系统默认值填充空字段
//!
//! Tunable validation happens in the use cases (e.g. discovery settings are
//! checked when a run starts), not here.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use hp_core::config::{
    AppConfig, DEFAULT_API_BASE_URL, DEFAULT_SETUP_AP_BASE_URL, DEFAULT_SETUP_AP_PASSPHRASE,
};

/// Name of the config file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// Pure data loading: missing values stay empty.
///
/// # Errors / 错误
///
/// - File cannot be read (I/O error)
/// - Content is not valid TOML (parse error)
/// - `[naming]` or a tunables table is malformed (mapping error)
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

/// Default data directory: `<platform data dir>/hpfs`.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("hpfs"))
        .ok_or_else(|| anyhow!("Could not determine the platform data directory"))
}

/// Resolve the effective configuration.
///
/// 1. `explicit` path, when given (must exist)
/// 2. `<data_dir>/config.toml`, when present
/// 3. system defaults
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let data_dir = default_data_dir()?;
    let config = match explicit {
        Some(path) => load_config(path)?,
        None => {
            let candidate = data_dir.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                load_config(&candidate)?
            } else {
                AppConfig::with_system_defaults(data_dir.clone())
            }
        }
    };
    Ok(apply_defaults(config, data_dir))
}

/// Replace empty values with the system defaults.
/// 空值使用系统默认值。
pub fn apply_defaults(mut config: AppConfig, data_dir: PathBuf) -> AppConfig {
    fn fill(value: &mut String, default: &str) {
        if value.trim().is_empty() {
            *value = default.to_string();
        }
    }

    fill(&mut config.api_base_url, DEFAULT_API_BASE_URL);
    fill(&mut config.setup_ap_base_url, DEFAULT_SETUP_AP_BASE_URL);
    fill(&mut config.setup_ap_passphrase, DEFAULT_SETUP_AP_PASSPHRASE);
    if config.data_dir.as_os_str().is_empty() {
        config.data_dir = data_dir;
    }
    config
}
