use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use hp_core::ports::{DeviceProbePort, ServerPresencePort, ServiceLocatorPort};
use hp_core::settings::DiscoverySettings;
use hp_core::{ClaimCode, DeviceNaming, DiscoveryEvent};
use tracing::{info, info_span, warn, Instrument, Span};

use super::channels::{
    directory_channel, hostname_channel, overall_timer, server_channel, ChannelContext,
};
use super::run::{DiscoveryRun, RunShared};

/// Discovery Orchestrator
///
/// 发现编排器：并发运行三个发现通道（目录浏览+探测、主机名探测、服务器轮询），
/// 第一个得到设备 ID 的通道获胜，事件流以唯一的终止事件结束。
///
/// Each call to [`start`](Self::start) creates an independent
/// [`DiscoveryRun`]. Must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    locator: Arc<dyn ServiceLocatorPort>,
    probe: Arc<dyn DeviceProbePort>,
    presence: Arc<dyn ServerPresencePort>,
    naming: DeviceNaming,
    settings: DiscoverySettings,
}

impl DiscoveryOrchestrator {
    pub fn new(
        locator: Arc<dyn ServiceLocatorPort>,
        probe: Arc<dyn DeviceProbePort>,
        presence: Arc<dyn ServerPresencePort>,
        naming: DeviceNaming,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            locator,
            probe,
            presence,
            naming,
            settings,
        }
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Start racing the three channels for `code`.
    ///
    /// The returned run has already emitted `Started`. Malformed settings
    /// end the run immediately with `Errored`.
    pub fn start(&self, code: ClaimCode) -> DiscoveryRun {
        let span = info_span!("usecase.discover_device.run", code = %code);
        let _entered = span.enter();

        let (shared, events) = RunShared::new(self.locator.clone());
        shared
            .gate
            .emit(DiscoveryEvent::Started { code: code.clone() });

        if let Err(err) = self.settings.validate() {
            warn!(error = %err, "refusing to start discovery");
            shared.fail(format!("invalid discovery settings: {err}"));
            return DiscoveryRun::new(shared, events);
        }

        let ctx = Arc::new(ChannelContext {
            shared: shared.clone(),
            locator: self.locator.clone(),
            probe: self.probe.clone(),
            presence: self.presence.clone(),
            fallback: self.naming.fallback_device_id(&code),
            hostname: self.naming.local_hostname(&code),
            browse_type: self.naming.browse_type(),
            settings: self.settings.clone(),
            directory_hit: AtomicBool::new(false),
            code,
        });
        info!(
            hostname = %ctx.hostname,
            fallback = %ctx.fallback,
            timeout_ms = ctx.settings.overall_timeout.as_millis() as u64,
            "discovery started"
        );

        spawn_channel(&shared, "timer", &span, overall_timer(ctx.clone()));
        spawn_channel(&shared, "directory", &span, directory_channel(ctx.clone()));
        spawn_channel(&shared, "hostname", &span, hostname_channel(ctx.clone()));
        spawn_channel(&shared, "server", &span, server_channel(ctx));

        DiscoveryRun::new(shared, events)
    }
}

fn spawn_channel<F>(shared: &RunShared, channel: &'static str, parent: &Span, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let span = info_span!(parent: parent, "discovery.channel", channel);
    let handle = tokio::spawn(future.instrument(span));
    shared.register(handle.abort_handle());
}
