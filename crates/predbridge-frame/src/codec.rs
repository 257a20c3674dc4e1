use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "PB" (0x50 0x42).
pub const MAGIC: [u8; 2] = [0x50, 0x42];

/// Default maximum payload size: 1 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

const LINE_TERMINATOR: u8 = b'\n';

/// How message boundaries are marked on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Binary header carrying the payload length.
    LengthPrefixed,
    /// Payload followed by `\n`; a trailing `\r` is stripped on decode.
    Line,
}

impl Framing {
    /// Encode one payload with this framing.
    pub fn encode(self, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        match self {
            Self::LengthPrefixed => encode_frame(payload, dst),
            Self::Line => encode_line(payload, dst),
        }
    }

    /// Decode one payload with this framing, if the buffer holds a whole one.
    pub fn decode(self, src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
        match self {
            Self::LengthPrefixed => decode_frame(src, max_payload),
            Self::Line => decode_line(src, max_payload),
        }
    }
}

/// Encode a length-prefixed frame.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬──────────────────┐
/// │ Magic (2B)   │ Length    │ Payload          │
/// │ 0x50 0x42    │ (4B LE)   │ (Length bytes)   │
/// └──────────────┴───────────┴──────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(len);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a length-prefixed frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Encode a newline-terminated line.
pub fn encode_line(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.contains(&LINE_TERMINATOR) {
        return Err(FrameError::EmbeddedNewline);
    }
    dst.reserve(payload.len() + 1);
    dst.put_slice(payload);
    dst.put_u8(LINE_TERMINATOR);
    Ok(())
}

/// Decode one newline-terminated line from a buffer.
///
/// Returns `Ok(None)` until a terminator arrives. An unterminated run longer
/// than `max_payload` is rejected so a misbehaving host cannot grow the
/// buffer without bound.
pub fn decode_line(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    let Some(pos) = src.iter().position(|&b| b == LINE_TERMINATOR) else {
        if src.len() > max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: src.len(),
                max: max_payload,
            });
        }
        return Ok(None);
    };

    let mut line = src.split_to(pos + 1);
    line.truncate(pos);
    if line.last() == Some(&b'\r') {
        line.truncate(pos - 1);
    }
    if line.len() > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: line.len(),
            max: max_payload,
        });
    }
    Ok(Some(line.freeze()))
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Message boundary encoding.
    pub framing: Framing,
    /// Maximum payload size in bytes. Default: 1 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl FrameConfig {
    /// Default configuration for the given framing.
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::new(Framing::LengthPrefixed)
    }
}
