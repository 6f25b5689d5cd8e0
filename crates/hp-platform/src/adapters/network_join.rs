//! Joining and forgetting Wi-Fi networks.
//!
//! - [`NmcliNetworkJoin`]: drives NetworkManager through `nmcli`.
//! - [`ManualNetworkJoin`]: asks the operator to switch networks by hand; the
//!   handoff then waits for the setup endpoint to become reachable.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hp_core::ports::NetworkJoinPort;
use tokio::process::Command;
use tracing::{info, warn};

const NMCLI: &str = "nmcli";

pub struct NmcliNetworkJoin {
    program: String,
}

impl Default for NmcliNetworkJoin {
    fn default() -> Self {
        Self {
            program: NMCLI.to_string(),
        }
    }
}

impl NmcliNetworkJoin {
    /// Use another executable with the same command line (wrappers, tests).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} {} exited with {}: {}",
                self.program,
                args.first().map(String::as_str).unwrap_or_default(),
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }
}

fn join_args(ssid: &str, passphrase: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "device".to_string(),
        "wifi".to_string(),
        "connect".to_string(),
        ssid.to_string(),
    ];
    if let Some(passphrase) = passphrase.filter(|p| !p.is_empty()) {
        args.push("password".to_string());
        args.push(passphrase.to_string());
    }
    args
}

fn forget_args(ssid: &str) -> Vec<String> {
    vec![
        "connection".to_string(),
        "delete".to_string(),
        "id".to_string(),
        ssid.to_string(),
    ]
}

#[async_trait]
impl NetworkJoinPort for NmcliNetworkJoin {
    async fn join(&self, ssid: &str, passphrase: Option<&str>) -> Result<()> {
        info!(%ssid, "joining network via nmcli");
        self.run(join_args(ssid, passphrase)).await
    }

    async fn forget(&self, ssid: &str) -> Result<()> {
        info!(%ssid, "forgetting network via nmcli");
        self.run(forget_args(ssid)).await
    }
}

/// Operator-driven join: logs what to do and returns immediately.
#[derive(Debug, Default)]
pub struct ManualNetworkJoin;

#[async_trait]
impl NetworkJoinPort for ManualNetworkJoin {
    async fn join(&self, ssid: &str, passphrase: Option<&str>) -> Result<()> {
        match passphrase.filter(|p| !p.is_empty()) {
            Some(_) => warn!(%ssid, "connect this host to the setup network (passphrase from config)"),
            None => warn!(%ssid, "connect this host to the open setup network"),
        }
        Ok(())
    }

    async fn forget(&self, ssid: &str) -> Result<()> {
        warn!(%ssid, "reconnect this host to the home network");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_args() {
        assert_eq!(
            join_args("HPFS_SETUP_785", Some("setup1234")),
            vec!["device", "wifi", "connect", "HPFS_SETUP_785", "password", "setup1234"]
        );
        assert_eq!(
            join_args("HPFS_SETUP_785", Some("")),
            vec!["device", "wifi", "connect", "HPFS_SETUP_785"]
        );
        assert_eq!(
            forget_args("HPFS_SETUP_785"),
            vec!["connection", "delete", "id", "HPFS_SETUP_785"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_maps_to_result() {
        let ok = NmcliNetworkJoin::with_program("true");
        assert!(ok.join("HPFS_SETUP_785", None).await.is_ok());

        let failing = NmcliNetworkJoin::with_program("false");
        assert!(failing.forget("HPFS_SETUP_785").await.is_err());

        let missing = NmcliNetworkJoin::with_program("/nonexistent/nmcli");
        assert!(missing.join("HPFS_SETUP_785", None).await.is_err());
    }

    #[tokio::test]
    async fn test_manual_join_always_accepts() {
        let join = ManualNetworkJoin;
        assert!(join.join("HPFS_SETUP_785", Some("setup1234")).await.is_ok());
        assert!(join.forget("HPFS_SETUP_785").await.is_ok());
    }
}
