// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connection establishment
//!
//! The connector opens the transmit and receive connections synchronously.
//! Either endpoint failing is fatal: no half-initialized link is ever handed
//! to the workers, and nothing is retried.

use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::common::{LinkConfig, LinkRole, TransportError, TransportResult};

/// The two long-lived connections owned by a link
#[derive(Debug)]
pub struct ConnectionPair {
    /// Outbound connection (this end writes payloads, reads acks)
    pub tx: TcpStream,
    /// Inbound connection (this end reads payloads, writes acks)
    pub rx: TcpStream,
}

impl ConnectionPair {
    fn configure(self) -> TransportResult<Self> {
        // Acks are tiny and latency bound
        self.tx.set_nodelay(true)?;
        self.rx.set_nodelay(true)?;
        Ok(self)
    }
}

/// Opens the connection pair for a [`LinkConfig`]
#[derive(Debug, Clone)]
pub struct Connector {
    config: LinkConfig,
}

impl Connector {
    /// Create a connector; the configuration is validated up front
    pub fn new(config: LinkConfig) -> TransportResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Establish both connections according to the configured role
    pub fn establish(&self) -> TransportResult<ConnectionPair> {
        match self.config.role {
            LinkRole::Connect => self.connect(),
            LinkRole::Accept => self.bind()?.accept(),
        }
    }

    /// Dial the transmit port, then the receive port
    pub fn connect(&self) -> TransportResult<ConnectionPair> {
        let tx = self.connect_one(self.config.tx_port)?;
        let rx = self.connect_one(self.config.rx_port)?;

        info!(
            "🦀 [CHASSIS-LINK] Connected to {} (tx) and {} (rx)",
            self.config.tx_address(),
            self.config.rx_address()
        );

        ConnectionPair { tx, rx }.configure()
    }

    /// Bind both listening sockets without accepting yet
    pub fn bind(&self) -> TransportResult<ChassisListener> {
        ChassisListener::bind(&self.config)
    }

    fn connect_one(&self, port: u16) -> TransportResult<TcpStream> {
        let address = format!("{}:{}", self.config.host, port);
        let targets: Vec<SocketAddr> = (self.config.host.as_str(), port)
            .to_socket_addrs()
            .map_err(|e| TransportError::connection(&address, e))?
            .collect();

        let mut last_error = None;
        for target in targets {
            let attempt = match self.config.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&target, timeout),
                None => TcpStream::connect(target),
            };
            match attempt {
                Ok(stream) => {
                    debug!("[CHASSIS-LINK] Connected to {}", target);
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        let source = last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "address resolved to nothing")
        });
        Err(TransportError::connection(address, source))
    }
}

/// Both listening sockets of an accepting link, bound but not yet accepted
///
/// Binding and accepting are separate so callers can bind port 0 and hand
/// the resulting addresses to the peer before blocking in [`accept`].
///
/// [`accept`]: ChassisListener::accept
#[derive(Debug)]
pub struct ChassisListener {
    tx: TcpListener,
    rx: TcpListener,
}

impl ChassisListener {
    /// Bind `host:tx_port` and `host:rx_port`
    pub fn bind(config: &LinkConfig) -> TransportResult<Self> {
        let tx = bind_one(&config.tx_address())?;
        let rx = bind_one(&config.rx_address())?;

        let listener = Self { tx, rx };
        info!(
            "🦀 [CHASSIS-LINK] Listening on {} (tx) and {} (rx)",
            listener.tx_local_addr()?,
            listener.rx_local_addr()?
        );
        Ok(listener)
    }

    /// Bound address of the transmit listener
    pub fn tx_local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.tx.local_addr()?)
    }

    /// Bound address of the receive listener
    pub fn rx_local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.rx.local_addr()?)
    }

    /// Block until one peer connection arrived on each listener
    ///
    /// The listeners are dropped afterwards; later connection attempts are
    /// refused.
    pub fn accept(self) -> TransportResult<ConnectionPair> {
        let tx = accept_one(&self.tx)?;
        let rx = accept_one(&self.rx)?;
        ConnectionPair { tx, rx }.configure()
    }
}

fn bind_one(address: &str) -> TransportResult<TcpListener> {
    TcpListener::bind(address).map_err(|e| TransportError::connection(address, e))
}

fn accept_one(listener: &TcpListener) -> TransportResult<TcpStream> {
    let local = listener.local_addr()?;
    let (stream, peer) = listener
        .accept()
        .map_err(|e| TransportError::connection(local.to_string(), e))?;
    info!("[CHASSIS-LINK] Accepted {} on {}", peer, local);
    Ok(stream)
}
