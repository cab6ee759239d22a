// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Chassis stand-in for tests and bench setups
//!
//! [`ChassisSimulator`] plays the device end of a link synchronously: one
//! call, one unit on the wire. It speaks the same framing and acknowledgment
//! protocol as [`crate::ChassisLink`] but has no worker threads, so tests can
//! drive every step of the exchange (or break it on purpose).

use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::common::{LinkConfig, LinkRole, Message, TransportError, TransportResult};
use crate::connector::{ChassisListener, ConnectionPair, Connector};
use crate::framing::FrameCodec;

/// Bound simulator sockets waiting for a link to connect
pub struct SimulatorListener {
    config: LinkConfig,
    listener: ChassisListener,
}

impl SimulatorListener {
    /// Configuration a connecting link should use to reach this simulator
    ///
    /// Carries the actually bound ports, so binding port 0 works.
    pub fn link_config(&self) -> TransportResult<LinkConfig> {
        let mut config = self.config.mirrored();
        config.tx_port = self.listener.rx_local_addr()?.port();
        config.rx_port = self.listener.tx_local_addr()?.port();
        Ok(config)
    }

    /// Bound address the link's transmit connection must reach
    pub fn inbound_addr(&self) -> TransportResult<SocketAddr> {
        self.listener.rx_local_addr()
    }

    /// Bound address the link's receive connection must reach
    pub fn outbound_addr(&self) -> TransportResult<SocketAddr> {
        self.listener.tx_local_addr()
    }

    /// Block until the link has connected both endpoints
    pub fn accept(self) -> TransportResult<ChassisSimulator> {
        let connections = self.listener.accept()?;
        Ok(ChassisSimulator::new(self.config, connections))
    }
}

/// Device end of a chassis link
pub struct ChassisSimulator {
    config: LinkConfig,
    /// Carries payloads to the link, acknowledgments back
    outbound: TcpStream,
    outbound_codec: FrameCodec,
    /// Carries payloads from the link, acknowledgments back
    inbound: TcpStream,
    inbound_codec: FrameCodec,
}

impl ChassisSimulator {
    /// Bind the two server sockets a link configured with `link_config` connects to
    pub fn listen(link_config: &LinkConfig) -> TransportResult<SimulatorListener> {
        let config = LinkConfig {
            role: LinkRole::Accept,
            ..link_config.mirrored()
        };
        config.validate()?;

        let listener = ChassisListener::bind(&config)?;
        info!("[CHASSIS-SIM] Waiting for link");
        Ok(SimulatorListener { config, listener })
    }

    /// Connect to a link that accepts on the ports in `link_config`
    pub fn connect(link_config: &LinkConfig) -> TransportResult<Self> {
        let config = LinkConfig {
            role: LinkRole::Connect,
            ..link_config.mirrored()
        };
        let connections = Connector::new(config.clone())?.connect()?;
        Ok(Self::new(config, connections))
    }

    fn new(config: LinkConfig, connections: ConnectionPair) -> Self {
        let ConnectionPair { tx, rx } = connections;
        Self {
            outbound: tx,
            outbound_codec: FrameCodec::new(config.framing, config.max_message_size),
            inbound: rx,
            inbound_codec: FrameCodec::new(config.framing, config.max_message_size),
            config,
        }
    }

    /// Simulator-side configuration (ports from the simulator's perspective)
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Read one packet from the link, acknowledging it when acks are on
    pub fn receive_packet(&mut self) -> TransportResult<Message> {
        let bytes = self.receive_raw()?;
        let message = Message::from_bytes(bytes)?;
        if self.config.ack_required {
            let token = self.config.ack_token.clone();
            self.reply_raw(token.as_bytes())?;
        }
        debug!("[CHASSIS-SIM] Received {:?}", message.as_str());
        Ok(message)
    }

    /// Send one packet to the link and, when acks are on, verify its acknowledgment
    pub fn send_packet(&mut self, message: impl Into<Message>) -> TransportResult<()> {
        let message = message.into();
        self.send_raw(message.as_bytes())?;
        if self.config.ack_required {
            let reply = self.read_reply_raw()?;
            if reply != self.config.ack_token.as_bytes() {
                return Err(TransportError::AckMismatch {
                    expected: self.config.ack_token.clone(),
                    received: String::from_utf8_lossy(&reply).into_owned(),
                });
            }
        }
        debug!("[CHASSIS-SIM] Sent {:?}", message.as_str());
        Ok(())
    }

    /// Read one unit from the link's transmit connection
    pub fn receive_raw(&mut self) -> TransportResult<Vec<u8>> {
        self.inbound_codec.read_frame(&mut self.inbound)
    }

    /// Write one unit back on the link's transmit connection
    pub fn reply_raw(&mut self, bytes: &[u8]) -> TransportResult<()> {
        self.inbound_codec.write_frame(&mut self.inbound, bytes)
    }

    /// Write one unit to the link's receive connection
    pub fn send_raw(&mut self, bytes: &[u8]) -> TransportResult<()> {
        self.outbound_codec.write_frame(&mut self.outbound, bytes)
    }

    /// Read one unit back from the link's receive connection
    pub fn read_reply_raw(&mut self) -> TransportResult<Vec<u8>> {
        self.outbound_codec.read_frame(&mut self.outbound)
    }

    /// Bound blocking reads on both connections; expiry surfaces as `Timeout`
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> TransportResult<()> {
        self.inbound.set_read_timeout(timeout)?;
        self.outbound.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Drop the connection the link transmits on
    pub fn close_inbound(&self) {
        let _ = self.inbound.shutdown(Shutdown::Both);
    }

    /// Drop the connection the link receives on
    pub fn close_outbound(&self) {
        let _ = self.outbound.shutdown(Shutdown::Both);
    }

    /// Drop both connections
    pub fn close(self) {
        self.close_inbound();
        self.close_outbound();
        info!("[CHASSIS-SIM] Closed");
    }
}
