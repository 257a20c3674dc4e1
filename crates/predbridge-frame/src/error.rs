/// Errors that can occur while framing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x5042 \"PB\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A line-framed payload contains the line terminator.
    #[error("line-framed payload contains an embedded newline")]
    EmbeddedNewline,

    /// The payload is not valid UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// No complete message arrived before the stream timeout elapsed.
    #[error("timed out waiting for the stream")]
    Timeout,

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether the stream is still usable after this error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
