// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # chassis-transport
//!
//! Duplex text link to an embedded chassis over two long-lived TCP
//! connections: one carries commands to the device, the other carries
//! telemetry back. Each connection is driven by its own worker thread, and
//! the application talks to the workers through two FIFO queues.
//!
//! ## Acknowledgment protocol
//!
//! With acknowledgments on (the default), every payload is answered by the
//! token `OK` on the same connection before the next payload may be sent:
//!
//! ```text
//! Sender:   write(payload)        Receiver: read() -> payload
//! Sender:   read() -> token       Receiver: write(token)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use chassis_transport::prelude::*;
//!
//! let config = LinkConfig::new("192.168.4.1", 8081, 8082);
//! let link = ChassisLink::open(config)?;
//!
//! link.write("lights on")?;
//! match link.read_timeout(std::time::Duration::from_secs(1)) {
//!     Ok(reply) => println!("chassis: {}", reply),
//!     Err(TransportError::Timeout) => println!("no telemetry yet"),
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), TransportError>(())
//! ```
//!
//! ## Architecture
//!
//! 1. **Common**: errors, configuration, the message type
//! 2. **Connector**: establishes the connection pair (connect or accept)
//! 3. **Framing**: datagram or length-prefixed units on the stream
//! 4. **Workers**: transmit and receive loops, one thread each
//! 5. **Link**: the facade owning queues, workers and connections
//! 6. **Peer**: a synchronous chassis simulator for tests

pub mod common;
pub mod connector;
pub mod framing;
pub mod link;
pub mod peer;
pub mod queue;
pub mod stats;
pub mod traits;
mod worker;

// Re-export commonly used types
pub use common::{
    Framing, LinkConfig, LinkRole, Message, TransportError, TransportResult, DEFAULT_ACK_TOKEN,
    DEFAULT_HOST, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_RX_PORT, DEFAULT_TX_PORT,
};
pub use connector::{ChassisListener, ConnectionPair, Connector};
pub use link::ChassisLink;
pub use peer::{ChassisSimulator, SimulatorListener};
pub use stats::LinkStats;
pub use traits::{MessageSink, MessageSource, Transport, TransportStats};
pub use worker::WorkerState;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::common::*;
    pub use crate::traits::*;
    pub use crate::{ChassisLink, ChassisListener, LinkStats, WorkerState};
}
