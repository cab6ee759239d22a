// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ChassisConfig, ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Find the chassis configuration file
///
/// Search order:
/// 1. `CHASSIS_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("CHASSIS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by CHASSIS_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet CHASSIS_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file is not found or contains invalid TOML. Validation is
/// left to [`crate::validate_config`] so callers can inspect a rejected config.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ChassisConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: ChassisConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let lowered = value.to_lowercase();
    lowered == "true" || lowered == "1" || lowered == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `CHASSIS_HOST` -> `link.host`
/// - `CHASSIS_TX_PORT` -> `link.tx_port`
/// - `CHASSIS_RX_PORT` -> `link.rx_port`
/// - `CHASSIS_ACK_REQUIRED` -> `link.ack_required`
/// - `CHASSIS_ACK_TOKEN` -> `link.ack_token`
/// - `CHASSIS_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut ChassisConfig) {
    if let Ok(value) = env::var("CHASSIS_HOST") {
        config.link.host = value;
    }
    if let Ok(value) = env::var("CHASSIS_TX_PORT") {
        if let Ok(port) = value.parse::<u16>() {
            config.link.tx_port = port;
        }
    }
    if let Ok(value) = env::var("CHASSIS_RX_PORT") {
        if let Ok(port) = value.parse::<u16>() {
            config.link.rx_port = port;
        }
    }
    if let Ok(value) = env::var("CHASSIS_ACK_REQUIRED") {
        config.link.ack_required = parse_flag(&value);
    }
    if let Ok(value) = env::var("CHASSIS_ACK_TOKEN") {
        config.link.ack_token = value;
    }
    if let Ok(value) = env::var("CHASSIS_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys: `host`, `tx_port`, `rx_port`, `ack_required`, `framing`, `role`, `log_level`.
pub fn apply_cli_overrides(config: &mut ChassisConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("host") {
        config.link.host = value.clone();
    }
    if let Some(value) = cli_args.get("tx_port") {
        if let Ok(port) = value.parse::<u16>() {
            config.link.tx_port = port;
        }
    }
    if let Some(value) = cli_args.get("rx_port") {
        if let Ok(port) = value.parse::<u16>() {
            config.link.rx_port = port;
        }
    }
    if let Some(value) = cli_args.get("ack_required") {
        config.link.ack_required = parse_flag(value);
    }
    if let Some(value) = cli_args.get("framing") {
        config.link.framing = value.clone();
    }
    if let Some(value) = cli_args.get("role") {
        config.link.role = value.clone();
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
