use predbridge_transport::{BridgeStream, UnixDomainSocket};
use tracing::info;

use crate::channel::Channel;
use crate::config::{ChannelConfig, Role};
use crate::connector::connect_with_retry;
use crate::error::{ChannelError, Result};
use crate::link::Link;

/// Local, message-framed channel over a Unix domain socket path.
///
/// Serves a single host at a time: a server-role pipe accepts the next host
/// only after the current one disconnected.
pub struct PipeChannel {
    config: ChannelConfig,
    listener: Option<UnixDomainSocket>,
    link: Option<Link>,
}

impl PipeChannel {
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

    fn link_mut(&mut self) -> Result<&mut Link> {
        self.link.as_mut().ok_or(ChannelError::NotConnected)
    }
}

impl Channel for PipeChannel {
    fn create_connection(&mut self) -> Result<()> {
        if self.config.role == Role::Server && self.listener.is_none() {
            self.listener = Some(UnixDomainSocket::bind(&self.config.endpoint)?);
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
                    UnixDomainSocket::connect(&endpoint)
                })?
            }
        };
        let link = Link::open(stream, &self.config)?;
        info!(endpoint = %self.config.endpoint, peer = link.peer(), "pipe channel connected");
        self.link = Some(link);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.link.take().is_some() {
            info!(endpoint = %self.config.endpoint, "pipe channel disconnected");
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
        format!("pipe:{}", self.config.endpoint)
    }
}
