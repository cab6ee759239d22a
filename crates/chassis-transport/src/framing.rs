// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wire framing for payloads and acknowledgment tokens
//!
//! [`Framing::Datagram`] writes bytes as-is and treats one `read` as one unit,
//! which is what the chassis firmware speaks. [`Framing::LengthPrefixed`]
//! prepends a 4-byte big-endian length so units survive coalescing on a
//! stream socket.

use std::io::{Read, Write};

use crate::common::{Framing, TransportError, TransportResult};

const LENGTH_PREFIX_SIZE: usize = 4;

/// Reads and writes whole units on a byte stream
#[derive(Debug, Clone)]
pub struct FrameCodec {
    framing: Framing,
    max_message_size: usize,
    read_buf: Vec<u8>,
}

impl FrameCodec {
    pub fn new(framing: Framing, max_message_size: usize) -> Self {
        Self {
            framing,
            max_message_size,
            read_buf: Vec::new(),
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Reject payloads the peer could not read back in one unit
    pub fn check_size(&self, len: usize) -> TransportResult<()> {
        if len > self.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: len,
                max_size: self.max_message_size,
            });
        }
        Ok(())
    }

    /// Write one unit
    pub fn write_frame<W: Write>(&self, writer: &mut W, payload: &[u8]) -> TransportResult<()> {
        self.check_size(payload.len())?;

        match self.framing {
            Framing::Datagram => writer.write_all(payload)?,
            Framing::LengthPrefixed => {
                // One buffer so header and body leave in the same segment
                let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
                frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
                frame.extend_from_slice(payload);
                writer.write_all(&frame)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Block until one unit has been read
    ///
    /// A clean end of stream is reported as `ConnectionLost`.
    pub fn read_frame<R: Read>(&mut self, reader: &mut R) -> TransportResult<Vec<u8>> {
        match self.framing {
            Framing::Datagram => self.read_datagram(reader),
            Framing::LengthPrefixed => self.read_length_prefixed(reader),
        }
    }

    fn read_datagram<R: Read>(&mut self, reader: &mut R) -> TransportResult<Vec<u8>> {
        self.read_buf.resize(self.max_message_size, 0);
        let n = loop {
            match reader.read(&mut self.read_buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            return Err(TransportError::ConnectionLost("peer closed the connection".to_string()));
        }
        Ok(self.read_buf[..n].to_vec())
    }

    fn read_length_prefixed<R: Read>(&mut self, reader: &mut R) -> TransportResult<Vec<u8>> {
        let mut header = [0u8; LENGTH_PREFIX_SIZE];
        reader.read_exact(&mut header).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                TransportError::ConnectionLost("peer closed the connection".to_string())
            }
            _ => e.into(),
        })?;

        let len = u32::from_be_bytes(header) as usize;
        if len > self.max_message_size {
            // The stream cannot be resynchronized past an oversized frame
            return Err(TransportError::InvalidMessage(format!(
                "frame of {} bytes exceeds maximum of {}",
                len, self.max_message_size
            )));
        }

        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload)?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_datagram_write_is_raw() {
        let codec = FrameCodec::new(Framing::Datagram, 1024);
        let mut wire = Vec::new();
        codec.write_frame(&mut wire, b"OK").unwrap();
        assert_eq!(wire, b"OK");
    }

    #[test]
    fn test_length_prefixed_wire_format() {
        let codec = FrameCodec::new(Framing::LengthPrefixed, 1024);
        let mut wire = Vec::new();
        codec.write_frame(&mut wire, b"fire").unwrap();
        assert_eq!(wire, [0, 0, 0, 4, b'f', b'i', b'r', b'e']);
    }

    #[test]
    fn test_length_prefixed_splits_coalesced_stream() {
        let mut codec = FrameCodec::new(Framing::LengthPrefixed, 1024);
        let mut wire = Vec::new();
        for payload in [&b"one"[..], &b""[..], &b"three"[..]] {
            codec.write_frame(&mut wire, payload).unwrap();
        }

        let mut reader = Cursor::new(wire);
        assert_eq!(codec.read_frame(&mut reader).unwrap(), b"one");
        assert_eq!(codec.read_frame(&mut reader).unwrap(), b"");
        assert_eq!(codec.read_frame(&mut reader).unwrap(), b"three");
        assert!(codec.read_frame(&mut reader).unwrap_err().is_disconnect());
    }

    #[test]
    fn test_datagram_read_caps_at_buffer_size() {
        let mut codec = FrameCodec::new(Framing::Datagram, 4);
        let mut reader = Cursor::new(b"abcdef".to_vec());
        assert_eq!(codec.read_frame(&mut reader).unwrap(), b"abcd");
        assert_eq!(codec.read_frame(&mut reader).unwrap(), b"ef");
        assert!(codec.read_frame(&mut reader).unwrap_err().is_disconnect());
    }

    #[test]
    fn test_oversized_write_rejected() {
        let codec = FrameCodec::new(Framing::Datagram, 3);
        let mut wire = Vec::new();
        let err = codec.write_frame(&mut wire, b"toolong").unwrap_err();
        assert!(matches!(
            err,
            TransportError::MessageTooLarge { size: 7, max_size: 3 }
        ));
        assert!(wire.is_empty());
    }

    #[test]
    fn test_oversized_frame_header_rejected() {
        let mut codec = FrameCodec::new(Framing::LengthPrefixed, 8);
        let mut reader = Cursor::new(vec![0, 0, 1, 0]);
        assert!(matches!(
            codec.read_frame(&mut reader),
            Err(TransportError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_truncated_body_is_connection_lost() {
        let mut codec = FrameCodec::new(Framing::LengthPrefixed, 64);
        let mut reader = Cursor::new(vec![0, 0, 0, 5, b'a', b'b']);
        assert!(codec.read_frame(&mut reader).unwrap_err().is_disconnect());
    }
}
