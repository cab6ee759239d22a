// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Duplex chassis link
//!
//! [`ChassisLink`] owns the connection pair, both queues and both workers.
//! The application only ever touches the queues: `write` enqueues and returns
//! immediately, `read` blocks on the receive queue's condition variable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::common::{Framing, LinkConfig, Message, TransportError, TransportResult};
use crate::connector::{ChassisListener, ConnectionPair, Connector};
use crate::framing::FrameCodec;
use crate::queue::MessageQueue;
use crate::stats::{LinkCounters, LinkStats};
use crate::traits::{MessageSink, MessageSource, Transport};
use crate::worker::{self, WorkerContext, WorkerHandle, WorkerState};

/// Bidirectional, optionally acknowledged text link to a chassis
///
/// # Example
///
/// ```no_run
/// use chassis_transport::{ChassisLink, LinkConfig};
///
/// let link = ChassisLink::open(LinkConfig::new("192.168.4.1", 8081, 8082))?;
/// link.write("throttle 40")?;
/// let telemetry = link.read()?;
/// println!("{}", telemetry);
/// # Ok::<(), chassis_transport::TransportError>(())
/// ```
pub struct ChassisLink {
    config: LinkConfig,
    outbound: Arc<MessageQueue<Message>>,
    inbound: Arc<MessageQueue<Message>>,
    transmitter: WorkerHandle,
    receiver: WorkerHandle,
    cancel: Arc<AtomicBool>,
    counters: Arc<LinkCounters>,
}

impl ChassisLink {
    /// Establish both connections per `config.role` and start the workers
    pub fn open(config: LinkConfig) -> TransportResult<Self> {
        let connector = Connector::new(config)?;
        let connections = connector.establish()?;
        Self::from_connections(connector.config().clone(), connections)
    }

    /// Accept the peer on an already bound listener and start the workers
    pub fn from_listener(config: LinkConfig, listener: ChassisListener) -> TransportResult<Self> {
        config.validate()?;
        let connections = listener.accept()?;
        Self::from_connections(config, connections)
    }

    /// Start the workers on connections established elsewhere
    pub fn from_connections(config: LinkConfig, connections: ConnectionPair) -> TransportResult<Self> {
        config.validate()?;

        let cancel = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(LinkCounters::default());
        let outbound = Arc::new(MessageQueue::new(config.max_pending));
        let inbound = Arc::new(MessageQueue::unbounded());

        let context = || WorkerContext {
            codec: FrameCodec::new(config.framing, config.max_message_size),
            ack_token: config
                .ack_required
                .then(|| config.ack_token.as_bytes().to_vec()),
            cancel: Arc::clone(&cancel),
            counters: Arc::clone(&counters),
        };

        let ConnectionPair { tx, rx } = connections;
        let mut transmitter = worker::spawn_transmit(tx, Arc::clone(&outbound), context())?;
        let receiver = match worker::spawn_receive(rx, Arc::clone(&inbound), context()) {
            Ok(receiver) => receiver,
            Err(e) => {
                cancel.store(true, Ordering::Release);
                outbound.close();
                transmitter.interrupt();
                transmitter.join();
                return Err(e);
            }
        };

        info!(
            "[CHASSIS-LINK] Link up (ack: {}, framing: {:?})",
            config.ack_required, config.framing
        );

        Ok(Self {
            config,
            outbound,
            inbound,
            transmitter,
            receiver,
            cancel,
            counters,
        })
    }

    /// Queue a message for the chassis; never blocks on the network
    pub fn write(&self, message: impl Into<Message>) -> TransportResult<()> {
        let message = message.into();

        if message.size() > self.config.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: message.size(),
                max_size: self.config.max_message_size,
            });
        }
        if self.config.framing == Framing::Datagram && message.size() == 0 {
            return Err(TransportError::InvalidMessage(
                "empty payload cannot be sent as a datagram".to_string(),
            ));
        }
        if self.config.ack_required && message.as_bytes() == self.config.ack_token.as_bytes() {
            return Err(TransportError::ReservedPayload(message.into_string()));
        }

        self.outbound.push(message)
    }

    /// Block until a message from the chassis is available
    ///
    /// Messages received before the receive side went down are still
    /// returned; after that this fails with `Closed`.
    pub fn read(&self) -> TransportResult<Message> {
        self.inbound.pop()
    }

    pub fn read_timeout(&self, timeout: Duration) -> TransportResult<Message> {
        self.inbound.pop_timeout(timeout)
    }

    pub fn try_read(&self) -> TransportResult<Option<Message>> {
        self.inbound.try_pop()
    }

    /// Messages written but not yet delivered, oldest first
    pub fn pending_outbound(&self) -> Vec<Message> {
        self.outbound.snapshot()
    }

    /// Number of received messages not yet read
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    pub fn tx_state(&self) -> WorkerState {
        self.transmitter.state()
    }

    pub fn rx_state(&self) -> WorkerState {
        self.receiver.state()
    }

    /// True while both directions are up
    pub fn is_running(&self) -> bool {
        !self.cancel.load(Ordering::Acquire)
            && self.tx_state().is_running()
            && self.rx_state().is_running()
    }

    pub fn stats(&self) -> LinkStats {
        self.counters.snapshot()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Stop both workers and close both connections
    ///
    /// Idempotent. Afterwards `write` fails with `Closed`; `read` drains
    /// anything already received, then fails with `Closed`.
    pub fn shutdown(&mut self) {
        if self.cancel.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("[CHASSIS-LINK] Shutting down");
        self.outbound.close();
        self.inbound.close();
        self.transmitter.interrupt();
        self.receiver.interrupt();
        self.transmitter.join();
        self.receiver.join();
        info!("[CHASSIS-LINK] Shutdown complete");
    }
}

impl Drop for ChassisLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Transport for ChassisLink {
    fn stop(&mut self) -> TransportResult<()> {
        self.shutdown();
        Ok(())
    }

    fn is_running(&self) -> bool {
        ChassisLink::is_running(self)
    }

    fn transport_type(&self) -> &str {
        "chassis-tcp"
    }
}

impl MessageSink for ChassisLink {
    fn write(&self, message: Message) -> TransportResult<()> {
        ChassisLink::write(self, message)
    }
}

impl MessageSource for ChassisLink {
    fn read(&self) -> TransportResult<Message> {
        ChassisLink::read(self)
    }

    fn read_timeout(&self, timeout: Duration) -> TransportResult<Message> {
        ChassisLink::read_timeout(self, timeout)
    }

    fn try_read(&self) -> TransportResult<Option<Message>> {
        ChassisLink::try_read(self)
    }
}
