//! # Dependency Injection / 依赖注入模块
//!
//! ## Responsibilities / 职责
//!
//! - ✅ Create infra implementations (token store, device cache) / 创建 infra 层实现
//! - ✅ Create platform implementations (DNS-SD, HTTP clients) / 创建 platform 层实现
//! - ✅ Inject them into the use cases / 注入到用例
//!
//! ## Prohibited / 禁止事项
//!
//! ❌ **No business logic / 禁止包含任何业务逻辑**
//!
//! This is the only place allowed to depend on hp-infra + hp-platform +
//! hp-app simultaneously.
//! 这是唯一允许同时依赖 hp-infra、hp-platform 和 hp-app 的地方。

use std::sync::Arc;

use hp_app::{ClaimAttachSequencer, DeviceDirectory, DiscoveryOrchestrator, SetupHandoff};
use hp_core::config::AppConfig;
use hp_core::ports::*;
use hp_infra::{FileDeviceCache, FileTokenStore, TokenCurrentUser};
use hp_platform::{
    BackendClient, HttpDeviceProbe, ManualNetworkJoin, MdnsServiceLocator, NmcliNetworkJoin,
    SetupApClient, TcpConnectivity,
};

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
/// 依赖注入错误（基础设施初始化失败）
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(String),

    #[error("mDNS daemon initialization failed: {0}")]
    LocatorInit(String),

    #[error("Invalid endpoint configuration: {0}")]
    EndpointConfig(String),
}

/// How the host joins the device's setup network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// NetworkManager via `nmcli`.
    Nmcli,
    /// The operator switches networks by hand.
    Manual,
}

/// Assembled dependencies.
///
/// Storage adapters are created eagerly; network adapters are created on
/// demand so commands that do not touch the network never start an mDNS
/// daemon.
pub struct AppDeps {
    pub config: AppConfig,
    pub tokens: Arc<dyn AuthTokenPort>,
    pub current_user: Arc<dyn CurrentUserPort>,
    pub backend: Arc<BackendClient>,
    pub directory: Arc<DeviceDirectory>,
}

impl AppDeps {
    pub fn wire(config: AppConfig) -> WiringResult<Self> {
        let tokens: Arc<dyn AuthTokenPort> = Arc::new(FileTokenStore::new(config.token_path()));
        let current_user: Arc<dyn CurrentUserPort> =
            Arc::new(TokenCurrentUser::new(tokens.clone()));
        let cache: Arc<dyn DeviceCachePort> =
            Arc::new(FileDeviceCache::new(config.device_cache_path()));

        let backend = Arc::new(
            BackendClient::new(
                config.api_base_url.clone(),
                config.naming.clone(),
                tokens.clone(),
                &config.settings.http,
            )
            .map_err(|e| WiringError::HttpClientInit(e.to_string()))?,
        );
        let directory = Arc::new(DeviceDirectory::new(backend.clone(), cache));

        Ok(Self {
            config,
            tokens,
            current_user,
            backend,
            directory,
        })
    }

    /// Discovery race over DNS-SD, the `/hello` probe and the backend.
    pub fn orchestrator(&self) -> WiringResult<DiscoveryOrchestrator> {
        let locator =
            MdnsServiceLocator::new().map_err(|e| WiringError::LocatorInit(e.to_string()))?;
        let probe = HttpDeviceProbe::new(self.config.naming.identity_path.clone())
            .map_err(|e| WiringError::HttpClientInit(e.to_string()))?;

        Ok(DiscoveryOrchestrator::new(
            Arc::new(locator),
            Arc::new(probe),
            self.backend.clone(),
            self.config.naming.clone(),
            self.config.settings.discovery.clone(),
        ))
    }

    pub fn sequencer(&self) -> Arc<ClaimAttachSequencer> {
        Arc::new(ClaimAttachSequencer::new(
            self.backend.clone(),
            self.current_user.clone(),
            self.directory.clone(),
            self.config.settings.claim.clone(),
        ))
    }

    pub fn handoff(&self, mode: JoinMode) -> WiringResult<SetupHandoff> {
        let join: Arc<dyn NetworkJoinPort> = match mode {
            JoinMode::Nmcli => Arc::new(NmcliNetworkJoin::default()),
            JoinMode::Manual => Arc::new(ManualNetworkJoin),
        };
        let device = SetupApClient::new(
            self.config.setup_ap_base_url.clone(),
            &self.config.settings.http,
        )
        .map_err(|e| WiringError::HttpClientInit(e.to_string()))?;
        let connectivity = TcpConnectivity::new(
            &self.config.setup_ap_base_url,
            self.config.api_base_url.clone(),
        )
        .map_err(|e| WiringError::EndpointConfig(e.to_string()))?;

        Ok(SetupHandoff::new(
            join,
            Arc::new(device),
            Arc::new(connectivity),
            self.config.naming.clone(),
            self.config.setup_ap_passphrase.clone(),
            self.config.settings.provisioning.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_wire_uses_data_dir_for_storage() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::with_system_defaults(dir.path().to_path_buf());

        let deps = AppDeps::wire(config).unwrap();

        assert!(deps.tokens.load().await.unwrap().is_none());
        assert!(deps.current_user.current_user().await.is_none());
        assert_eq!(deps.directory.load_from_cache().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_handoff_rejects_invalid_setup_url() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::with_system_defaults(dir.path().to_path_buf());
        config.setup_ap_base_url = "not a url".to_string();
        let deps = AppDeps::wire(config).unwrap();

        assert!(matches!(
            deps.handoff(JoinMode::Manual),
            Err(WiringError::EndpointConfig(_))
        ));
    }
}
