//! User-facing text for events, outcomes and listings.
//!
//! 面向用户的文本只在这里生成；核心层只返回结构化结果。

use chrono::DateTime;
use hp_app::{AttachConfirmation, ClaimFlowError, HandoffError, SequencerError};
use hp_core::backend::{DeviceRecord, PlantRecord};
use hp_core::DiscoveryEvent;

pub fn describe_event(event: &DiscoveryEvent) -> String {
    match event {
        DiscoveryEvent::Started { code } => format!("searching for device with claim code {code}"),
        DiscoveryEvent::DirectoryEntryFound {
            name,
            address,
            port,
        } => format!("found {name} at {address}:{port}"),
        DiscoveryEvent::ProbeSucceeded { device_id } => {
            format!("{device_id} answered on the local network")
        }
        DiscoveryEvent::ServerObservedDevice { device_id } => {
            format!("backend sees {device_id}")
        }
        DiscoveryEvent::Finished { device_id } => format!("device found: {device_id}"),
        DiscoveryEvent::TimedOut => {
            "no device found in time; check that it is powered and on the same network, then retry"
                .to_string()
        }
        DiscoveryEvent::Cancelled => "discovery cancelled".to_string(),
        DiscoveryEvent::Errored { message } => format!("discovery failed: {message}"),
    }
}

pub fn print_event(event: &DiscoveryEvent) {
    println!("{}", describe_event(event));
}

pub fn describe_flow_error(error: &ClaimFlowError) -> String {
    match error {
        ClaimFlowError::DiscoveryTimedOut => describe_event(&DiscoveryEvent::TimedOut),
        ClaimFlowError::DiscoveryCancelled => describe_event(&DiscoveryEvent::Cancelled),
        ClaimFlowError::DiscoveryErrored(message) => format!("discovery failed: {message}"),
        ClaimFlowError::Sequencer(SequencerError::AttachRejected(reason)) => {
            format!("the backend refused the attach ({reason}); check the claim code and plant")
        }
        ClaimFlowError::Sequencer(SequencerError::ConfirmationTimeout { attempts }) => format!(
            "attach was sent but not confirmed after {attempts} checks; the device may still \
             appear, run `hpfs devices --refresh` in a minute"
        ),
    }
}

pub fn describe_handoff_error(error: &HandoffError) -> String {
    match error {
        HandoffError::JoinFailed { .. } | HandoffError::SetupNetworkUnreachable { .. } => {
            format!("{error}; make sure the device is in setup mode and nearby")
        }
        HandoffError::StillOnSetupNetwork { ssid } => {
            format!("still on {ssid}; reconnect this host to the home network and run `hpfs claim`")
        }
        HandoffError::NoInternet => {
            "no internet after setup; reconnect this host and run `hpfs claim`".to_string()
        }
        other => other.to_string(),
    }
}

pub fn describe_confirmation(confirmation: &AttachConfirmation) -> String {
    format!(
        "{} attached (confirmed on check {})",
        confirmation.device_id, confirmation.attempts
    )
}

fn last_seen(record: &DeviceRecord) -> String {
    record
        .last_seen_at
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn describe_device(record: &DeviceRecord) -> String {
    let id = record
        .identifier()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "<unknown>".to_string());
    let plant = record
        .plant_id
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let online = match record.online {
        Some(true) => "online",
        Some(false) => "offline",
        None => "unknown",
    };
    format!("{id}\tplant {plant}\t{online}\tlast seen {}", last_seen(record))
}

pub fn describe_plant(plant: &PlantRecord) -> String {
    if plant.location.is_empty() {
        format!("{}\t{}", plant.id, plant.name)
    } else {
        format!("{}\t{} ({})", plant.id, plant.name, plant.location)
    }
}
