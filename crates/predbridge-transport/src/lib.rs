//! Byte-stream transports for predbridge.
//!
//! Two ways to reach an assistive-technology host:
//! - Unix domain sockets, used as the local "pipe" endpoint
//! - TCP sockets, used as the remote endpoint
//!
//! This is the lowest layer of predbridge. Framing and channels build on the
//! [`BridgeStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use stream::BridgeStream;
pub use tcp::TcpSocket;

#[cfg(unix)]
pub use uds::UnixDomainSocket;
