//! Common types shared by every part of the link

pub mod config;
pub mod error;
pub mod message;

pub use config::{
    Framing, LinkConfig, LinkRole, DEFAULT_ACK_TOKEN, DEFAULT_HOST, DEFAULT_MAX_MESSAGE_SIZE,
    DEFAULT_RX_PORT, DEFAULT_TX_PORT,
};
pub use error::{TransportError, TransportResult};
pub use message::Message;
