use std::time::Duration;

use predbridge_transport::{BridgeStream, TcpSocket};
use tracing::info;

use crate::channel::Channel;
use crate::config::{ChannelConfig, Role};
use crate::connector::connect_with_retry;
use crate::error::{ChannelError, Result};
use crate::link::Link;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Remote, newline-framed text channel over TCP.
pub struct SocketChannel {
    config: ChannelConfig,
    listener: Option<TcpSocket>,
    link: Option<Link>,
}

impl SocketChannel {
    /// Unconnected channel; see [`Channel::create_connection`] and [`Channel::connect`].
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            listener: None,
            link: None,
        }
    }

    /// Channel over an already-connected stream.
    pub fn from_stream(stream: BridgeStream, config: ChannelConfig) -> Result<Self> {
        let link = Link::open(stream, &config)?;
        Ok(Self {
            config,
            listener: None,
            link: Some(link),
        })
    }

    /// Address actually bound in the server role (resolves port `0`).
    pub fn local_endpoint(&self) -> Option<String> {
        self.listener
            .as_ref()
            .map(|listener| listener.local_addr().to_string())
    }

    fn link_mut(&mut self) -> Result<&mut Link> {
        self.link.as_mut().ok_or(ChannelError::NotConnected)
    }
}

impl Channel for SocketChannel {
    fn create_connection(&mut self) -> Result<()> {
        if self.config.role == Role::Server && self.listener.is_none() {
            self.listener = Some(TcpSocket::bind(&self.config.endpoint)?);
        }
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        if self.link.is_some() {
            return Ok(());
        }
        let stream = match self.config.role {
            Role::Server => {
                self.create_connection()?;
                let listener = self.listener.as_ref().ok_or(ChannelError::NotConnected)?;
                listener.accept()?
            }
            Role::Client => {
                let endpoint = self.config.endpoint.clone();
                connect_with_retry(&self.config.retry, &endpoint, || {
                    TcpSocket::connect(&endpoint, Some(CONNECT_TIMEOUT))
                })?
            }
        };
        let link = Link::open(stream, &self.config)?;
        info!(endpoint = %self.config.endpoint, peer = link.peer(), "socket channel connected");
        self.link = Some(link);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.link.take().is_some() {
            info!(endpoint = %self.config.endpoint, "socket channel disconnected");
        }
    }

    fn send(&mut self, message: &str) -> Result<()> {
        self.link_mut()?.send(message)
    }

    fn receive(&mut self) -> Result<String> {
        self.link_mut()?.receive()
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    fn describe(&self) -> String {
        format!("socket:{}", self.config.endpoint)
    }
}
