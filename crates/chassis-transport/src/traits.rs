// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport trait definitions
//!
//! Application code that only needs to move text to and from the chassis can
//! depend on these traits instead of [`crate::ChassisLink`], which keeps test
//! doubles simple.

use std::time::Duration;

use crate::common::{Message, TransportResult};

/// Base transport trait
pub trait Transport: Send + Sync {
    /// Stop the transport and release its connections
    fn stop(&mut self) -> TransportResult<()>;

    /// Check if transport is running
    fn is_running(&self) -> bool;

    /// Get transport name/type
    fn transport_type(&self) -> &str;
}

/// Outbound half
pub trait MessageSink: Transport {
    /// Queue a message for delivery without waiting for it to be sent
    fn write(&self, message: Message) -> TransportResult<()>;
}

/// Inbound half
pub trait MessageSource: Transport {
    /// Block until a message is available
    fn read(&self) -> TransportResult<Message>;

    /// Block for at most `timeout`
    fn read_timeout(&self, timeout: Duration) -> TransportResult<Message>;

    /// Non-blocking read
    fn try_read(&self) -> TransportResult<Option<Message>>;
}

/// Statistics tracking
///
/// For monitoring link throughput and health.
pub trait TransportStats {
    /// Get total messages sent (and acknowledged, when acks are on)
    fn messages_sent(&self) -> u64;

    /// Get total messages received
    fn messages_received(&self) -> u64;

    /// Get total bytes sent
    fn bytes_sent(&self) -> u64;

    /// Get total bytes received
    fn bytes_received(&self) -> u64;

    /// Get number of workers that terminated on an error
    fn error_count(&self) -> u64;
}
