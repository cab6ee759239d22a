//! Configuration validation
//!
//! Collects every problem in one pass so a misconfigured bench reports all of
//! them at once instead of one per restart.

use crate::{ChassisConfig, ConfigError, ConfigResult};

/// Framing names accepted in `link.framing`
pub const FRAMING_NAMES: &[&str] = &["datagram", "length_prefixed"];

/// Role names accepted in `link.role`
pub const ROLE_NAMES: &[&str] = &["connect", "accept"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidPort { port_name: String, port: u16 },
    PortConflict { port1: String, port2: String, port: u16 },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPort { port_name, port } => {
                write!(f, "Port {} = {} is not a usable port (1-65535)", port_name, port)
            }
            Self::PortConflict { port1, port2, port } => {
                write!(f, "Port conflict: {} and {} both use port {}", port1, port2, port)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &ChassisConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Run every check and return the individual failures
pub fn collect_errors(config: &ChassisConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_ports(config, &mut errors);
    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);
    errors
}

fn validate_ports(config: &ChassisConfig, errors: &mut Vec<ConfigValidationError>) {
    let link = &config.link;
    // Port 0 binds an ephemeral port, which only an accepting link can use
    let ephemeral_allowed = link.role == "accept";
    for (port_name, port) in [("link.tx_port", link.tx_port), ("link.rx_port", link.rx_port)] {
        if port == 0 && !ephemeral_allowed {
            errors.push(ConfigValidationError::InvalidPort {
                port_name: port_name.to_string(),
                port,
            });
        }
    }

    if link.tx_port != 0 && link.tx_port == link.rx_port {
        errors.push(ConfigValidationError::PortConflict {
            port1: "link.tx_port".to_string(),
            port2: "link.rx_port".to_string(),
            port: link.tx_port,
        });
    }
}

fn validate_required_fields(config: &ChassisConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.link.host.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "link.host".to_string(),
        });
    }
    if config.link.ack_required && config.link.ack_token.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "link.ack_token".to_string(),
        });
    }
}

fn validate_value_ranges(config: &ChassisConfig, errors: &mut Vec<ConfigValidationError>) {
    let link = &config.link;

    if link.max_message_size == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "link.max_message_size".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    } else if link.ack_required && link.ack_token.len() > link.max_message_size {
        errors.push(ConfigValidationError::InvalidValue {
            field: "link.ack_token".to_string(),
            reason: "longer than link.max_message_size".to_string(),
        });
    }

    if !FRAMING_NAMES.contains(&link.framing.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "link.framing".to_string(),
            reason: format!("must be one of {}", FRAMING_NAMES.join(", ")),
        });
    }

    if !ROLE_NAMES.contains(&link.role.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "link.role".to_string(),
            reason: format!("must be one of {}", ROLE_NAMES.join(", ")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChassisConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_port_conflict() {
        let mut config = ChassisConfig::default();
        config.link.rx_port = config.link.tx_port;

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("Port conflict"));
            assert!(msg.contains("8081"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_zero_port() {
        let mut config = ChassisConfig::default();
        config.link.tx_port = 0;

        let errors = collect_errors(&config);
        assert_eq!(
            errors,
            vec![ConfigValidationError::InvalidPort {
                port_name: "link.tx_port".to_string(),
                port: 0,
            }]
        );
    }

    #[test]
    fn test_missing_host_and_token() {
        let mut config = ChassisConfig::default();
        config.link.host = String::new();
        config.link.ack_token = String::new();

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("link.host"));
            assert!(msg.contains("link.ack_token"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_empty_token_allowed_without_ack() {
        let mut config = ChassisConfig::default();
        config.link.ack_required = false;
        config.link.ack_token = String::new();

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_ports_allowed_when_accepting() {
        let mut config = ChassisConfig::default();
        config.link.role = "accept".to_string();
        config.link.tx_port = 0;
        config.link.rx_port = 0;

        assert!(collect_errors(&config).is_empty());
    }

    #[test]
    fn test_long_token_ignored_without_ack() {
        let mut config = ChassisConfig::default();
        config.link.max_message_size = 1;
        assert!(validate_config(&config).is_err());

        config.link.ack_required = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_framing_and_role() {
        let mut config = ChassisConfig::default();
        config.link.framing = "newline".to_string();
        config.link.role = "listen".to_string();

        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 2);

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("length_prefixed"));
            assert!(msg.contains("accept"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_zero_message_size() {
        let mut config = ChassisConfig::default();
        config.link.max_message_size = 0;

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(msg)) if msg.contains("max_message_size")));
    }
}
