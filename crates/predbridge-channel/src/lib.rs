//! Duplex message channels between an assistive-technology host and
//! predbridge.
//!
//! A [`Channel`] moves whole text messages. Two implementations share the
//! capability set:
//! - [`PipeChannel`]: local, length-prefixed frames over a Unix domain socket
//! - [`SocketChannel`]: remote, newline-delimited text over TCP
//!
//! [`open_channel`] picks one from a [`ChannelConfig`]; [`ChannelListener`]
//! serves repeated or concurrent host connections.

pub mod channel;
pub mod config;
pub mod connector;
pub mod error;
mod link;
pub mod listener;
#[cfg(unix)]
pub mod pipe;
pub mod socket;

pub use channel::{open_channel, Channel};
pub use config::{
    ChannelConfig, RetryPolicy, Role, TransportKind, DEFAULT_RECEIVE_TIMEOUT, DEFAULT_SEND_TIMEOUT,
};
pub use connector::connect_with_retry;
pub use error::{ChannelError, Result};
pub use listener::ChannelListener;
#[cfg(unix)]
pub use pipe::PipeChannel;
pub use socket::SocketChannel;
