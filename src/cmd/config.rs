//! Configuration view and validation commands: `roomboard config`.

use std::path::Path;

use anyhow::Result;

use roomboard::config::{GateConfig, RoomboardToml, ROOM_SECRET_ENV, SYNC_SECRET_ENV};

use super::super::ConfigCommands;

pub fn cmd_config(config_path: &Path, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Roomboard Configuration");
            println!("=======================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                RoomboardToml::load(config_path)?
            } else {
                println!("No config file at {}; using defaults.", config_path.display());
                RoomboardToml::default()
            };
            println!();

            println!("[server]");
            println!("  port = {}", toml.server.port);
            println!("  dev = {}", toml.server.dev);
            println!();
            println!("[sync]");
            println!("  base_url = \"{}\"", toml.sync.base_url);
            println!();
            if !toml.rooms.is_empty() {
                println!("[rooms]");
                for room_id in toml.rooms.keys() {
                    println!("  \"{}\" (key set)", room_id);
                }
                println!();
            }

            let config = GateConfig::resolve(&toml);
            println!("Effective values (with env overrides):");
            println!(
                "  {} = {}",
                SYNC_SECRET_ENV,
                if config.sync_secret.is_some() { "set" } else { "unset" }
            );
            println!(
                "  {} = {}",
                ROOM_SECRET_ENV,
                if std::env::var_os(ROOM_SECRET_ENV).is_some() { "set" } else { "unset" }
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            let toml = RoomboardToml::load(config_path)?;
            let warnings = toml.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                anyhow::bail!("{} already exists", config_path.display());
            }
            RoomboardToml::default().save(config_path)?;
            println!("Created {}", config_path.display());
        }
    }

    Ok(())
}
