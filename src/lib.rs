// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # chassis-link
//!
//! Hardware-in-the-loop link between a test harness and an embedded chassis.
//! Two long-lived TCP connections carry text in each direction, one worker
//! thread per connection keeps the application from ever blocking on the
//! network, and an optional `OK` acknowledgment paces every transfer.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! chassis-link = "0.1"
//! ```
//!
//! ```rust,no_run
//! use chassis_link::prelude::*;
//!
//! let config = chassis_link::config::load_config(None, None)?;
//! let _logging = chassis_link::init_logging(&config)?;
//! let link = chassis_link::open_link(&config)?;
//!
//! link.write("motor left 30")?;
//! println!("chassis says {}", link.read()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crates
//!
//! - [`transport`]: the link itself (`chassis-transport`)
//! - [`config`]: `chassis_configuration.toml` loading (`chassis-config`)
//! - [`observability`]: logging setup (`chassis-observability`)
//!
//! ## Feature Flags
//!
//! - **`file-logging`**: JSON log files in timestamped run folders

pub use chassis_config as config;
pub use chassis_observability as observability;
pub use chassis_transport as transport;

use chassis_config::ChassisConfig;
use chassis_transport::{ChassisLink, LinkConfig, TransportResult};
use tracing::info;

/// Version of the umbrella crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open a link using the `[link]` section of a loaded configuration
pub fn open_link(config: &ChassisConfig) -> TransportResult<ChassisLink> {
    let link_config = LinkConfig::from_settings(&config.link)?;
    info!(
        "[CHASSIS-LINK] Opening {:?} link on {} / {}",
        link_config.role,
        link_config.tx_address(),
        link_config.rx_address()
    );
    ChassisLink::open(link_config)
}

/// Install console logging at `logging.level`, raised per crate by
/// `--debug-<crate>` arguments and `CHASSIS_DEBUG`
#[cfg(not(feature = "file-logging"))]
pub fn init_logging(config: &ChassisConfig) -> anyhow::Result<()> {
    let debug_flags = chassis_observability::parse_debug_flags();
    chassis_observability::init_console_logging(&debug_flags, &config.logging.level)
}

/// Install console logging plus a JSON file under `logging.log_dir`
///
/// Keep the returned guard alive; dropping it flushes and stops file output.
#[cfg(feature = "file-logging")]
pub fn init_logging(config: &ChassisConfig) -> anyhow::Result<chassis_observability::LoggingGuard> {
    let debug_flags = chassis_observability::parse_debug_flags();
    chassis_observability::init_logging(
        &debug_flags,
        &config.logging.level,
        config.logging.log_dir.clone(),
        Some(config.logging.retention_runs),
    )
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use chassis_config::{load_config, validate_config, ChassisConfig, ConfigError};
    pub use chassis_transport::prelude::*;
    pub use chassis_transport::ChassisSimulator;
}
