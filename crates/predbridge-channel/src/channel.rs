use crate::config::{ChannelConfig, TransportKind};
use crate::error::Result;
#[cfg(unix)]
use crate::pipe::PipeChannel;
use crate::socket::SocketChannel;

/// Duplex, message-oriented connection to the assistive host.
///
/// Each `send` writes exactly one message and each `receive` returns exactly
/// one; implementations own the framing.
pub trait Channel: Send {
    /// Transport-specific setup that precedes `connect`, e.g. binding the
    /// listening endpoint in the server role. Idempotent.
    fn create_connection(&mut self) -> Result<()>;

    /// Establish the session connection. Clients retry with backoff; servers
    /// wait for the host to connect. A no-op when already connected.
    fn connect(&mut self) -> Result<()>;

    /// Drop the current connection, if any.
    fn disconnect(&mut self);

    /// Send one message.
    fn send(&mut self, message: &str) -> Result<()>;

    /// Receive one message, blocking up to the receive timeout.
    ///
    /// Fails with `ChannelError::Timeout` when nothing complete arrived and
    /// `ChannelError::Broken` when the connection is gone.
    fn receive(&mut self) -> Result<String>;

    fn is_connected(&self) -> bool;

    /// Short description for logs, e.g. `pipe:/run/host.sock`.
    fn describe(&self) -> String;
}

/// Build the channel selected by `config`. Nothing is opened until
/// `create_connection` / `connect` are called.
pub fn open_channel(config: ChannelConfig) -> Result<Box<dyn Channel>> {
    match config.transport {
        #[cfg(unix)]
        TransportKind::Pipe => Ok(Box::new(PipeChannel::new(config))),
        #[cfg(not(unix))]
        TransportKind::Pipe => Err(crate::error::ChannelError::Unsupported("pipe")),
        TransportKind::Socket => Ok(Box::new(SocketChannel::new(config))),
    }
}
