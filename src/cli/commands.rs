//! Command handlers.

use anyhow::{anyhow, bail, Result};
use hp_app::{ClaimSession, ClaimSessionController};
use hp_core::auth::AuthTokens;
use hp_core::setup::WifiCredentials;
use hp_core::{ClaimCode, DeviceId, DiscoveryOutcome, PlantId};
use tracing::{info, warn};

use super::output;
use crate::bootstrap::{AppDeps, JoinMode};

async fn ensure_signed_in(deps: &AppDeps) -> Result<()> {
    match deps.tokens.load().await? {
        Some(_) => Ok(()),
        None => bail!("not signed in; store a token with `hpfs token --access <jwt>`"),
    }
}

/// Resolves on the first Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

pub(super) async fn discover(deps: &AppDeps, code: ClaimCode) -> Result<()> {
    let orchestrator = deps.orchestrator()?;
    let mut run = orchestrator.start(code);
    let handle = run.handle();

    let outcome = loop {
        let event = tokio::select! {
            event = run.next_event() => event,
            _ = tokio::signal::ctrl_c(), if handle.is_running() => {
                info!("interrupted, cancelling discovery");
                handle.cancel();
                continue;
            }
        };
        match event {
            Some(event) => {
                output::print_event(&event);
                if let Some(outcome) = event.outcome() {
                    break outcome;
                }
            }
            None => break run.outcome().unwrap_or(DiscoveryOutcome::Cancelled),
        }
    };

    match outcome {
        DiscoveryOutcome::Found(_) => Ok(()),
        DiscoveryOutcome::TimedOut => bail!("device not found"),
        DiscoveryOutcome::Cancelled => bail!("discovery cancelled"),
        DiscoveryOutcome::Errored(message) => bail!("discovery failed: {message}"),
    }
}

pub(super) async fn claim(
    deps: &AppDeps,
    code: ClaimCode,
    plant: i64,
    device: Option<String>,
) -> Result<()> {
    ensure_signed_in(deps).await?;
    deps.config.settings.claim.validate()?;
    let plant_id = PlantId::new(plant);
    let mut controller = ClaimSessionController::new(
        deps.orchestrator()?,
        deps.sequencer(),
        ClaimSession::new(code, plant_id),
    );

    let result = match device {
        Some(raw) => {
            let device_id = deps
                .config
                .naming
                .normalize_device_id(&DeviceId::from(raw.trim()));
            controller.attach_known_device(device_id).await
        }
        None => controller
            .run_to_completion_until(output::print_event, interrupted())
            .await
            .map(|report| report.confirmation),
    };

    let confirmation = result.map_err(|e| anyhow!(output::describe_flow_error(&e)))?;
    println!("{}", output::describe_confirmation(&confirmation));
    deps.directory
        .add_claimed_device(confirmation.device_id, plant_id)
        .await;
    Ok(())
}

pub(super) async fn provision(
    deps: &AppDeps,
    code: ClaimCode,
    plant: i64,
    ssid: String,
    password: String,
    mode: JoinMode,
) -> Result<()> {
    ensure_signed_in(deps).await?;
    let handoff = deps.handoff(mode)?;

    let networks = handoff
        .connect(&code)
        .await
        .map_err(|e| anyhow!(output::describe_handoff_error(&e)))?;
    println!("device sees {} network(s)", networks.len());
    if !networks.iter().any(|name| name == &ssid) {
        warn!(%ssid, "network not in the device's scan results");
        println!("note: {ssid} was not in the device's scan results");
    }

    let credentials = WifiCredentials { ssid, password };
    handoff
        .send_credentials(&code, &credentials)
        .await
        .map_err(|e| anyhow!(output::describe_handoff_error(&e)))?;
    println!("credentials delivered, back online");

    claim(deps, code, plant, None).await
}

pub(super) async fn devices(deps: &AppDeps, refresh: bool, plants: bool) -> Result<()> {
    let cached = deps.directory.load_from_cache().await?;

    if refresh || cached == 0 {
        ensure_signed_in(deps).await?;
        if let Err(err) = deps.directory.refresh_from_server().await {
            if cached == 0 {
                return Err(err);
            }
            warn!(error = %err, "showing cached device list");
            println!("note: backend unavailable, showing cached list");
        }
    }

    for device in deps.directory.devices().await {
        println!("{}", output::describe_device(&device));
    }

    if plants {
        for plant in deps.directory.refresh_plants().await? {
            println!("{}", output::describe_plant(&plant));
        }
    }
    Ok(())
}

pub(super) async fn token(
    deps: &AppDeps,
    access: Option<String>,
    refresh: Option<String>,
    clear: bool,
) -> Result<()> {
    if clear {
        deps.tokens.clear().await?;
        println!("tokens cleared");
        return Ok(());
    }

    if let Some(access) = access {
        let tokens = AuthTokens {
            access: access.trim().to_string(),
            refresh: refresh.map(|r| r.trim().to_string()),
        };
        deps.tokens.save(&tokens).await?;
        match tokens.user_id() {
            Some(user) => println!("token saved for user {user}"),
            None => println!("token saved; it carries no readable user id"),
        }
        return Ok(());
    }

    match deps.tokens.load().await? {
        Some(tokens) => match tokens.user_id() {
            Some(user) => println!("signed in as user {user}"),
            None => println!("signed in (user id unknown)"),
        },
        None => println!("not signed in"),
    }
    Ok(())
}
