//! Link configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use chassis_config::LinkSettings;

use crate::common::error::{TransportError, TransportResult};

/// Default chassis address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default transmit port (harness → chassis)
pub const DEFAULT_TX_PORT: u16 = 8081;

/// Default receive port (chassis → harness)
pub const DEFAULT_RX_PORT: u16 = 8082;

/// Default acknowledgment token
pub const DEFAULT_ACK_TOKEN: &str = "OK";

/// Default read buffer / maximum message size in bytes
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024;

/// Whether this end dials out or waits for the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRole {
    /// Connect to `host:tx_port` and `host:rx_port`
    #[default]
    Connect,
    /// Bind `host:tx_port` and `host:rx_port` and accept one peer on each
    Accept,
}

impl LinkRole {
    /// Parse a role name from configuration
    pub fn from_name(name: &str) -> TransportResult<Self> {
        match name {
            "connect" => Ok(Self::Connect),
            "accept" => Ok(Self::Accept),
            other => Err(TransportError::InvalidConfig(format!(
                "unknown link role '{}'",
                other
            ))),
        }
    }

    /// The role the peer must take
    pub fn opposite(self) -> Self {
        match self {
            Self::Connect => Self::Accept,
            Self::Accept => Self::Connect,
        }
    }
}

/// How message boundaries are carried on the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// One read of up to `max_message_size` bytes is one message.
    ///
    /// Matches the chassis firmware. Boundaries only survive when the
    /// transport keeps them or acknowledgments keep one unit in flight.
    #[default]
    Datagram,
    /// Every unit carries a 4-byte big-endian length prefix
    LengthPrefixed,
}

impl Framing {
    /// Parse a framing name from configuration
    pub fn from_name(name: &str) -> TransportResult<Self> {
        match name {
            "datagram" => Ok(Self::Datagram),
            "length_prefixed" => Ok(Self::LengthPrefixed),
            other => Err(TransportError::InvalidConfig(format!(
                "unknown framing '{}'",
                other
            ))),
        }
    }
}

/// Construction-time configuration of a [`crate::ChassisLink`]
///
/// Ports are named from this endpoint's perspective: this end always writes
/// on the `tx_port` connection and reads on the `rx_port` connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Chassis address (connect) or bind address (accept)
    pub host: String,

    /// Port of the outbound connection
    pub tx_port: u16,

    /// Port of the inbound connection
    pub rx_port: u16,

    /// Pace every transfer with an acknowledgment round trip
    pub ack_required: bool,

    /// Acknowledgment token
    pub ack_token: String,

    pub role: LinkRole,

    pub framing: Framing,

    /// Read buffer size and largest accepted payload
    pub max_message_size: usize,

    /// Transmit queue bound (None = unbounded)
    pub max_pending: Option<usize>,

    /// Connect timeout (None = OS default)
    pub connect_timeout: Option<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            tx_port: DEFAULT_TX_PORT,
            rx_port: DEFAULT_RX_PORT,
            ack_required: true,
            ack_token: DEFAULT_ACK_TOKEN.to_string(),
            role: LinkRole::Connect,
            framing: Framing::Datagram,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_pending: None,
            connect_timeout: None,
        }
    }
}

impl LinkConfig {
    /// Create a new config for the given chassis endpoints
    pub fn new(host: impl Into<String>, tx_port: u16, rx_port: u16) -> Self {
        Self {
            host: host.into(),
            tx_port,
            rx_port,
            ..Default::default()
        }
    }

    /// Build from the `[link]` section of `chassis_configuration.toml`
    pub fn from_settings(settings: &LinkSettings) -> TransportResult<Self> {
        let config = Self {
            host: settings.host.clone(),
            tx_port: settings.tx_port,
            rx_port: settings.rx_port,
            ack_required: settings.ack_required,
            ack_token: settings.ack_token.clone(),
            role: LinkRole::from_name(&settings.role)?,
            framing: Framing::from_name(&settings.framing)?,
            max_message_size: settings.max_message_size,
            max_pending: (settings.max_pending > 0).then_some(settings.max_pending),
            connect_timeout: (settings.connect_timeout_ms > 0)
                .then(|| Duration::from_millis(settings.connect_timeout_ms)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Enable or disable acknowledgment pacing
    pub fn with_ack(mut self, ack_required: bool) -> Self {
        self.ack_required = ack_required;
        self
    }

    /// Set the acknowledgment token
    pub fn with_ack_token(mut self, token: impl Into<String>) -> Self {
        self.ack_token = token.into();
        self
    }

    /// Set role
    pub fn with_role(mut self, role: LinkRole) -> Self {
        self.role = role;
        self
    }

    /// Set framing
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Set maximum message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Bound the transmit queue
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = Some(max_pending);
        self
    }

    /// Set connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Configuration for the other end of this link
    ///
    /// Swaps the ports (our outbound is the peer's inbound) and flips the role.
    pub fn mirrored(&self) -> Self {
        Self {
            tx_port: self.rx_port,
            rx_port: self.tx_port,
            role: self.role.opposite(),
            ..self.clone()
        }
    }

    /// `host:tx_port`
    pub fn tx_address(&self) -> String {
        format!("{}:{}", self.host, self.tx_port)
    }

    /// `host:rx_port`
    pub fn rx_address(&self) -> String {
        format!("{}:{}", self.host, self.rx_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> TransportResult<()> {
        if self.host.is_empty() {
            return Err(TransportError::InvalidConfig("host cannot be empty".to_string()));
        }

        // Port 0 asks the OS for an ephemeral port, which only makes sense when binding
        if self.role == LinkRole::Connect && (self.tx_port == 0 || self.rx_port == 0) {
            return Err(TransportError::InvalidConfig(
                "connect role requires non-zero ports".to_string(),
            ));
        }

        if self.tx_port != 0 && self.tx_port == self.rx_port {
            return Err(TransportError::InvalidConfig(format!(
                "tx_port and rx_port both use port {}",
                self.tx_port
            )));
        }

        if self.max_message_size == 0 {
            return Err(TransportError::InvalidConfig(
                "maximum message size must be greater than 0".to_string(),
            ));
        }

        if self.framing == Framing::LengthPrefixed && self.max_message_size > u32::MAX as usize {
            return Err(TransportError::InvalidConfig(
                "maximum message size does not fit a 4-byte length prefix".to_string(),
            ));
        }

        if self.ack_required {
            if self.ack_token.is_empty() {
                return Err(TransportError::InvalidConfig(
                    "acknowledgment token cannot be empty".to_string(),
                ));
            }
            if self.ack_token.len() > self.max_message_size {
                return Err(TransportError::InvalidConfig(
                    "acknowledgment token is longer than the maximum message size".to_string(),
                ));
            }
        }

        if self.max_pending == Some(0) {
            return Err(TransportError::InvalidConfig(
                "max_pending must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = LinkConfig::default();
        assert_eq!(config.tx_address(), "127.0.0.1:8081");
        assert_eq!(config.rx_address(), "127.0.0.1:8082");
        assert!(config.ack_required);
        assert_eq!(config.ack_token, "OK");
        assert_eq!(config.max_message_size, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mirrored_swaps_ports_and_role() {
        let config = LinkConfig::new("10.1.1.2", 9001, 9002).with_ack(false);
        let peer = config.mirrored();

        assert_eq!(peer.tx_port, 9002);
        assert_eq!(peer.rx_port, 9001);
        assert_eq!(peer.role, LinkRole::Accept);
        assert!(!peer.ack_required);
        assert_eq!(peer.mirrored(), config);
    }

    #[test]
    fn test_port_rules() {
        assert!(LinkConfig::new("127.0.0.1", 0, 8082).validate().is_err());
        assert!(LinkConfig::new("127.0.0.1", 8081, 8081).validate().is_err());

        // Ephemeral ports are fine when binding
        let accept = LinkConfig::new("127.0.0.1", 0, 0).with_role(LinkRole::Accept);
        assert!(accept.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(LinkConfig::default().with_max_message_size(0).validate().is_err());
        assert!(LinkConfig::default().with_ack_token("").validate().is_err());
        assert!(LinkConfig::default().with_ack(false).with_ack_token("").validate().is_ok());
        assert!(LinkConfig::default().with_max_pending(0).validate().is_err());
        assert!(LinkConfig::default()
            .with_max_message_size(1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_settings() {
        let settings = LinkSettings {
            host: "192.168.0.20".to_string(),
            framing: "length_prefixed".to_string(),
            role: "accept".to_string(),
            max_pending: 64,
            connect_timeout_ms: 250,
            ..Default::default()
        };

        let config = LinkConfig::from_settings(&settings).unwrap();
        assert_eq!(config.host, "192.168.0.20");
        assert_eq!(config.framing, Framing::LengthPrefixed);
        assert_eq!(config.role, LinkRole::Accept);
        assert_eq!(config.max_pending, Some(64));
        assert_eq!(config.connect_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_from_settings_defaults_are_unbounded() {
        let config = LinkConfig::from_settings(&LinkSettings::default()).unwrap();
        assert_eq!(config, LinkConfig::default());
    }

    #[test]
    fn test_settings_validation_agrees_with_link_validation() {
        let accept_ephemeral = LinkSettings {
            role: "accept".to_string(),
            tx_port: 0,
            rx_port: 0,
            ..Default::default()
        };
        let long_token_no_ack = LinkSettings {
            ack_required: false,
            max_message_size: 1,
            ..Default::default()
        };
        let connect_zero_port = LinkSettings {
            tx_port: 0,
            ..Default::default()
        };

        for link in [accept_ephemeral, long_token_no_ack, connect_zero_port] {
            let file_config = chassis_config::ChassisConfig {
                link: link.clone(),
                ..Default::default()
            };
            assert_eq!(
                chassis_config::validate_config(&file_config).is_ok(),
                LinkConfig::from_settings(&link).is_ok(),
                "validators disagree on {:?}",
                link
            );
        }
    }

    #[test]
    fn test_from_settings_rejects_unknown_names() {
        let settings = LinkSettings {
            framing: "newline".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            LinkConfig::from_settings(&settings),
            Err(TransportError::InvalidConfig(_))
        ));
    }
}
