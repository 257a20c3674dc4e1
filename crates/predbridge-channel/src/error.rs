use std::time::Duration;

use predbridge_frame::FrameError;
use predbridge_transport::TransportError;

/// Errors that can occur on a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The connection failed mid-session; the session cannot continue.
    #[error("channel broken: {0}")]
    Broken(String),

    /// No complete message arrived within the receive timeout.
    #[error("no message received within {0:?}")]
    Timeout(Duration),

    /// Establishing the connection failed after all retry attempts.
    #[error("connection failed after {attempts} attempt(s): {source}")]
    Connect {
        attempts: u32,
        source: TransportError,
    },

    /// Transport setup error (bind, accept, socket options).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A single message could not be framed or decoded; the stream is intact.
    #[error("message rejected: {0}")]
    Rejected(FrameError),

    /// Send or receive was attempted without a connection.
    #[error("channel is not connected")]
    NotConnected,

    /// The transport is not available on this platform.
    #[error("{0} transport is not supported on this platform")]
    Unsupported(&'static str),
}

impl ChannelError {
    /// Whether this error ends the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Timeout(_) | Self::Rejected(_))
    }

    /// Classify a frame error raised while receiving.
    pub(crate) fn from_receive(err: FrameError, timeout: Duration) -> Self {
        match err {
            FrameError::Timeout => Self::Timeout(timeout),
            FrameError::InvalidUtf8(_) => Self::Rejected(err),
            other => Self::Broken(other.to_string()),
        }
    }

    /// Classify a frame error raised while sending.
    pub(crate) fn from_send(err: FrameError) -> Self {
        match err {
            FrameError::PayloadTooLarge { .. } | FrameError::EmbeddedNewline => Self::Rejected(err),
            other => Self::Broken(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_rejections_are_recoverable() {
        let timeout = Duration::from_millis(100);
        assert!(!ChannelError::from_receive(FrameError::Timeout, timeout).is_fatal());
        assert!(!ChannelError::from_send(FrameError::EmbeddedNewline).is_fatal());
        assert!(ChannelError::from_receive(FrameError::ConnectionClosed, timeout).is_fatal());
        assert!(ChannelError::from_receive(FrameError::InvalidMagic, timeout).is_fatal());
        assert!(ChannelError::NotConnected.is_fatal());
    }

    #[test]
    fn receive_timeout_carries_configured_duration() {
        let err = ChannelError::from_receive(FrameError::Timeout, Duration::from_millis(250));
        assert!(matches!(err, ChannelError::Timeout(d) if d == Duration::from_millis(250)));
    }
}
