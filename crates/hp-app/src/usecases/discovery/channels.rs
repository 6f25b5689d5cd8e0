//! The three racing channels and the overall deadline timer.
//!
//! Channels swallow every transient failure: a failed probe or query is
//! "no hit this iteration". Each one checks the gate before emitting and
//! before starting a new iteration.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hp_core::discovery::FoundVia;
use hp_core::lookup::Lookup;
use hp_core::ports::discovery::DEFAULT_HTTP_PORT;
use hp_core::ports::{DeviceProbePort, ProbeTarget, ServerPresencePort, ServiceLocatorPort};
use hp_core::settings::DiscoverySettings;
use hp_core::{ClaimCode, DeviceId, DiscoveryEvent};
use tokio::task::JoinSet;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, trace, warn};

use super::run::RunShared;

/// Everything a channel needs for one run.
pub(crate) struct ChannelContext {
    pub(crate) shared: Arc<RunShared>,
    pub(crate) locator: Arc<dyn ServiceLocatorPort>,
    pub(crate) probe: Arc<dyn DeviceProbePort>,
    pub(crate) presence: Arc<dyn ServerPresencePort>,
    pub(crate) code: ClaimCode,
    /// `<prefix>-<code>`; probe fallback and server lookup candidate.
    pub(crate) fallback: DeviceId,
    pub(crate) hostname: String,
    pub(crate) browse_type: String,
    pub(crate) settings: DiscoverySettings,
    /// Set once the directory channel saw any resolved entry.
    pub(crate) directory_hit: AtomicBool,
}

impl ChannelContext {
    fn closed(&self) -> bool {
        self.shared.gate.is_closed()
    }
}

/// Channel A: directory browse, probing every resolved endpoint.
pub(crate) async fn directory_channel(ctx: Arc<ChannelContext>) {
    let mut hits = match ctx.locator.browse(&ctx.browse_type).await {
        Ok(hits) => hits,
        Err(err) => {
            warn!(error = %err, "directory browse unavailable");
            return;
        }
    };
    if ctx.closed() {
        ctx.locator.stop();
        return;
    }

    let mut announced = HashSet::new();
    let mut in_flight = HashSet::new();
    let mut probes: JoinSet<ProbeTarget> = JoinSet::new();

    loop {
        tokio::select! {
            _ = ctx.shared.gate.closed() => return,
            Some(done) = probes.join_next(), if !probes.is_empty() => {
                if let Ok(target) = done {
                    in_flight.remove(&target);
                }
            }
            hit = hits.recv() => {
                let Some(hit) = hit else { break };
                ctx.directory_hit.store(true, Ordering::Release);
                let target = ProbeTarget::from_hit(&hit);

                if announced.insert(target.clone()) {
                    debug!(name = %hit.name, target = %target, "directory entry resolved");
                    ctx.shared.gate.emit(DiscoveryEvent::DirectoryEntryFound {
                        name: hit.name.clone(),
                        address: hit.address,
                        port: hit.port,
                    });
                }
                if !in_flight.insert(target.clone()) {
                    trace!(target = %target, "probe already in flight");
                    continue;
                }

                let ctx = ctx.clone();
                probes.spawn(async move {
                    let timeout = ctx.settings.directory_probe_timeout;
                    if let Lookup::Found(device_id) =
                        ctx.probe.probe(&target, timeout, &ctx.fallback).await
                    {
                        ctx.shared.finish(FoundVia::Probe, device_id);
                    }
                    target
                });
            }
        }
    }

    // Browse ended on its own; let the probes already started finish.
    tokio::select! {
        _ = ctx.shared.gate.closed() => {}
        _ = async { while probes.join_next().await.is_some() {} } => {}
    }
}

/// Channel B: probe the well-known hostname until the local window closes.
pub(crate) async fn hostname_channel(ctx: Arc<ChannelContext>) {
    let target = ProbeTarget::new(ctx.hostname.clone(), DEFAULT_HTTP_PORT);
    let window = sleep(ctx.settings.local_window);
    tokio::pin!(window);

    loop {
        if ctx.closed() {
            return;
        }
        tokio::select! {
            _ = ctx.shared.gate.closed() => return,
            _ = &mut window => break,
            result = ctx.probe.probe(&target, ctx.settings.hostname_probe_timeout, &ctx.fallback) => {
                match result {
                    Lookup::Found(device_id) => {
                        ctx.shared.finish(FoundVia::Probe, device_id);
                        return;
                    }
                    Lookup::Absent(reason) => {
                        trace!(target = %target, reason = %reason, "hostname probe missed");
                    }
                }
            }
        }
        tokio::select! {
            _ = ctx.shared.gate.closed() => return,
            _ = &mut window => break,
            _ = sleep(ctx.settings.hostname_retry_interval) => {}
        }
    }
    debug!(host = %ctx.hostname, "local window elapsed");
}

/// Channel C: poll the backend with capped exponential backoff until the
/// overall deadline.
pub(crate) async fn server_channel(ctx: Arc<ChannelContext>) {
    let deadline = Instant::now() + ctx.settings.overall_timeout;
    let backoff = ctx.settings.server_backoff;
    let mut attempt: u32 = 0;

    while Instant::now() < deadline {
        if ctx.closed() {
            return;
        }
        if let Lookup::Found(device_id) = ctx.presence.query_by_device_id(&ctx.fallback).await {
            ctx.shared.finish(FoundVia::Server, device_id);
            return;
        }
        if ctx.closed() {
            return;
        }
        if let Lookup::Found(device_id) = ctx.presence.query_by_claim_code(&ctx.code).await {
            ctx.shared.finish(FoundVia::Server, device_id);
            return;
        }

        attempt = attempt.saturating_add(1);
        let wake = (Instant::now() + backoff.delay_for(attempt)).min(deadline);
        trace!(attempt, "server presence not yet visible");
        tokio::select! {
            _ = ctx.shared.gate.closed() => return,
            _ = sleep_until(wake) => {}
        }
    }

    if !ctx.directory_hit.load(Ordering::Acquire) {
        ctx.shared.time_out("server polling exhausted without a directory hit");
    }
}

/// Hard deadline for the whole run.
pub(crate) async fn overall_timer(ctx: Arc<ChannelContext>) {
    tokio::select! {
        _ = ctx.shared.gate.closed() => {}
        _ = sleep(ctx.settings.overall_timeout) => {
            ctx.shared.time_out("overall deadline reached");
        }
    }
}
