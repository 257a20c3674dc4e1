//! Whole-message framing for predbridge channels.
//!
//! Every exchange with the host is one self-contained text unit. Two framings
//! turn a byte stream into such units:
//! - [`Framing::LengthPrefixed`]: 2-byte magic ("PB") + 4-byte little-endian
//!   length + UTF-8 payload. Used by the local pipe channel.
//! - [`Framing::Line`]: UTF-8 text terminated by `\n`. Used by the remote
//!   socket channel.
//!
//! Readers keep partially received units across timeouts, so callers only
//! ever see complete messages.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, decode_line, encode_frame, encode_line, FrameConfig, Framing,
    DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
