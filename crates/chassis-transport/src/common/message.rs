//! Message type carried over the link

use std::fmt;

use crate::common::error::{TransportError, TransportResult};

/// Opaque text payload exchanged with the chassis
///
/// The link imposes no structure beyond UTF-8; callers encode commands and
/// telemetry however the device expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    text: String,
}

impl Message {
    /// Create a new message
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Decode a message received off the wire
    pub fn from_bytes(bytes: Vec<u8>) -> TransportResult<Self> {
        String::from_utf8(bytes)
            .map(Self::new)
            .map_err(|e| TransportError::InvalidMessage(format!("payload is not UTF-8: {}", e)))
    }

    /// Text content
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Encoded bytes as written to the wire
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Get message size in bytes
    pub fn size(&self) -> usize {
        self.text.len()
    }

    /// Take the text out of the message
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<&String> for Message {
    fn from(text: &String) -> Self {
        Self::new(text.clone())
    }
}

impl PartialEq<str> for Message {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Message {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}
