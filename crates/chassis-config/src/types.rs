// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section in `chassis_configuration.toml`. Missing
//! keys fall back to the reference chassis deployment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChassisConfig {
    pub link: LinkSettings,
    pub logging: LoggingSettings,
}

/// Duplex link settings (`[link]`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkSettings {
    pub host: String,
    pub tx_port: u16,
    pub rx_port: u16,
    pub ack_required: bool,
    pub ack_token: String,
    /// "connect" or "accept"
    pub role: String,
    /// "datagram" or "length_prefixed"
    pub framing: String,
    pub max_message_size: usize,
    /// 0 = unbounded transmit queue
    pub max_pending: usize,
    /// 0 = OS default
    pub connect_timeout_ms: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            tx_port: 8081,
            rx_port: 8082,
            ack_required: true,
            ack_token: "OK".to_string(),
            role: "connect".to_string(),
            framing: "datagram".to_string(),
            max_message_size: 1024,
            max_pending: 0,
            connect_timeout_ms: 0,
        }
    }
}

/// Logging settings (`[logging]`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub log_dir: Option<PathBuf>,
    pub retention_runs: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            retention_runs: 10,
        }
    }
}
