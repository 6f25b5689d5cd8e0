//! Command line interface.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hp_core::{ClaimCode, ClaimCodeError};

use crate::bootstrap::{AppDeps, JoinMode};

#[derive(Parser, Debug)]
#[command(name = "hpfs")]
#[command(about = "Discover and claim HPFS irrigation controllers", long_about = None)]
pub struct Cli {
    /// Config file (default: <data dir>/hpfs/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find a device on the local network or through the backend
    Discover {
        /// Three-digit claim code printed on the device
        #[arg(short, long, value_parser = parse_claim_code)]
        code: ClaimCode,
    },
    /// Discover a device, attach it to a plant and wait for confirmation
    Claim {
        #[arg(short, long, value_parser = parse_claim_code)]
        code: ClaimCode,
        /// Plant to attach the device to
        #[arg(short, long)]
        plant: i64,
        /// Skip discovery and attach this device id (or bare claim code)
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Give a device in setup mode the home Wi-Fi, then claim it
    Provision {
        #[arg(short, long, value_parser = parse_claim_code)]
        code: ClaimCode,
        #[arg(short, long)]
        plant: i64,
        /// Home network name
        #[arg(long)]
        ssid: String,
        /// Home network password (empty for open networks)
        #[arg(long, default_value = "")]
        password: String,
        /// Switch networks by hand instead of using nmcli
        #[arg(long)]
        manual_join: bool,
    },
    /// List devices on this account
    Devices {
        /// Fetch the list from the backend instead of the local cache
        #[arg(long)]
        refresh: bool,
        /// Also list plants
        #[arg(long)]
        plants: bool,
    },
    /// Store, show or clear backend tokens
    Token {
        /// Access token (JWT)
        #[arg(long)]
        access: Option<String>,
        /// Refresh token (JWT)
        #[arg(long, requires = "access")]
        refresh: Option<String>,
        /// Remove stored tokens
        #[arg(long, conflicts_with_all = ["access", "refresh"])]
        clear: bool,
    },
}

/// Claim codes are strict; only surrounding whitespace is forgiven.
pub fn parse_claim_code(raw: &str) -> Result<ClaimCode, ClaimCodeError> {
    ClaimCode::parse(raw.trim())
}

pub async fn run(command: Commands, deps: &AppDeps) -> anyhow::Result<()> {
    match command {
        Commands::Discover { code } => commands::discover(deps, code).await,
        Commands::Claim {
            code,
            plant,
            device,
        } => commands::claim(deps, code, plant, device).await,
        Commands::Provision {
            code,
            plant,
            ssid,
            password,
            manual_join,
        } => {
            let mode = if manual_join {
                JoinMode::Manual
            } else {
                JoinMode::Nmcli
            };
            commands::provision(deps, code, plant, ssid, password, mode).await
        }
        Commands::Devices { refresh, plants } => commands::devices(deps, refresh, plants).await,
        Commands::Token {
            access,
            refresh,
            clear,
        } => commands::token(deps, access, refresh, clear).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_claim_code_trims_whitespace() {
        assert_eq!(parse_claim_code(" 785\n").unwrap().as_str(), "785");
        assert!(parse_claim_code("78 5").is_err());
        assert!(parse_claim_code("7850").is_err());
    }

    #[test]
    fn test_claim_command_parses() {
        let cli = Cli::try_parse_from([
            "hpfs", "claim", "--code", "785", "--plant", "3", "--device", "hpfs-9f1c",
        ])
        .unwrap();

        match cli.command {
            Commands::Claim {
                code,
                plant,
                device,
            } => {
                assert_eq!(code.as_str(), "785");
                assert_eq!(plant, 3);
                assert_eq!(device.as_deref(), Some("hpfs-9f1c"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_code_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["hpfs", "discover", "--code", "12a"]).is_err());
    }

    #[test]
    fn test_token_flags_conflict() {
        assert!(Cli::try_parse_from(["hpfs", "token", "--refresh", "r"]).is_err());
        assert!(Cli::try_parse_from(["hpfs", "token", "--access", "a", "--clear"]).is_err());
        assert!(Cli::try_parse_from(["hpfs", "token", "--clear"]).is_ok());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["hpfs", "devices", "--config", "/tmp/hpfs.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/hpfs.toml")));
    }
}
