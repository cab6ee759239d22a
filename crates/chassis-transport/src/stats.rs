// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Link counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::TransportStats;

/// Counters shared by both workers
#[derive(Debug, Default)]
pub(crate) struct LinkCounters {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    acks_sent: AtomicU64,
    acks_received: AtomicU64,
    errors: AtomicU64,
}

impl LinkCounters {
    pub(crate) fn record_sent(&self, bytes: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self, bytes: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_ack_sent(&self) {
        self.acks_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ack_received(&self) {
        self.acks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LinkStats {
        LinkStats {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
            acks_received: self.acks_received.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the link counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Payloads written (and acknowledged, when acks are on)
    pub messages_sent: u64,
    /// Payloads delivered to the receive queue
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Tokens written back for inbound payloads
    pub acks_sent: u64,
    /// Tokens read back for outbound payloads
    pub acks_received: u64,
    /// Workers that terminated on an error
    pub errors: u64,
}

impl TransportStats for LinkStats {
    fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    fn messages_received(&self) -> u64 {
        self.messages_received
    }

    fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    fn error_count(&self) -> u64 {
        self.errors
    }
}
