//! Length-prefixed message framing
//!
//! Every message exchanged on an open channel is a little-endian `u16`
//! payload length followed by the payload bytes.

use super::constants::*;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use thiserror::Error;

/// Payload too long to be described by the length prefix
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Payload of {0} bytes does not fit a 16-bit length prefix")]
pub struct PayloadTooLarge(pub usize);

/// Buffer shorter than its length prefix declares
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Frame needs {needed} bytes but only {available} are available")]
pub struct Truncated {
    pub needed: usize,
    pub available: usize,
}

/// One message received from or sent to the peer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Payload length as carried in the prefix
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as text, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Serialize the frame to its wire form
    pub fn encode(&self) -> Result<Vec<u8>, PayloadTooLarge> {
        encode_frame(&self.payload)
    }

    /// Parse a frame from a received buffer.
    ///
    /// Bytes beyond the declared payload length are ignored. A prefix that
    /// declares more bytes than `data` holds is reported as truncated.
    pub fn decode(data: &[u8]) -> Result<Self, Truncated> {
        if data.len() < FRAME_HEADER_SIZE {
            return Err(Truncated {
                needed: FRAME_HEADER_SIZE,
                available: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        let length = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| Truncated {
                needed: FRAME_HEADER_SIZE,
                available: data.len(),
            })? as usize;

        let needed = FRAME_HEADER_SIZE + length;
        match data.get(FRAME_HEADER_SIZE..needed) {
            Some(payload) => Ok(Self::new(payload)),
            None => Err(Truncated {
                needed,
                available: data.len(),
            }),
        }
    }
}

/// Serialize `payload` with its length prefix
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, PayloadTooLarge> {
    if payload.len() > FRAME_MAX_PAYLOAD {
        return Err(PayloadTooLarge(payload.len()));
    }

    let mut wire = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    wire.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    wire.extend_from_slice(payload);
    Ok(wire)
}
