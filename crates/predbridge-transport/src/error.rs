/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind a listening endpoint.
    #[error("failed to bind to {endpoint}: {source}")]
    Bind {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to connect to a listening endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {endpoint}")]
    PathTooLong {
        endpoint: String,
        len: usize,
        max: usize,
    },

    /// The endpoint could not be resolved to a socket address.
    #[error("invalid endpoint address: {0}")]
    InvalidAddress(String),
}

impl TransportError {
    /// Underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Bind { source, .. } | Self::Connect { source, .. } => Some(source.kind()),
            Self::Accept(source) | Self::Io(source) => Some(source.kind()),
            Self::PathTooLong { .. } | Self::InvalidAddress(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
