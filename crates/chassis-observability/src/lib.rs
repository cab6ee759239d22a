// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # chassis-observability
//!
//! Logging setup shared by every chassis-link crate, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "chassis_link",
    "chassis_transport",
    "chassis_config",
    "chassis_observability",
];
