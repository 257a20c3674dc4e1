use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::BridgeStream;

/// Remote socket endpoint backed by TCP.
pub struct TcpSocket {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Bind and listen on `endpoint` (`host:port`).
    ///
    /// Port `0` picks an ephemeral port; see [`TcpSocket::local_addr`].
    pub fn bind(endpoint: &str) -> Result<Self> {
        let addr = resolve(endpoint)?;
        let listener = TcpListener::bind(addr).map_err(|source| TransportError::Bind {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "socket endpoint listening");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming host connection (blocking).
    pub fn accept(&self) -> Result<BridgeStream> {
        let (stream, addr) = self.listener.accept().map_err(TransportError::Accept)?;
        Self::accepted(stream, addr)
    }

    /// Accept a pending connection without blocking.
    pub fn try_accept(&self) -> Result<Option<BridgeStream>> {
        self.listener
            .set_nonblocking(true)
            .map_err(TransportError::Accept)?;
        match self.listener.accept() {
            Ok((stream, addr)) => Self::accepted(stream, addr).map(Some),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    fn accepted(stream: TcpStream, addr: SocketAddr) -> Result<BridgeStream> {
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        debug!(%addr, "accepted socket connection");
        Ok(BridgeStream::from_tcp(stream))
    }

    /// Connect to a listening socket endpoint.
    ///
    /// `timeout` bounds the connection attempt; `None` blocks until the OS
    /// gives up.
    pub fn connect(endpoint: &str, timeout: Option<Duration>) -> Result<BridgeStream> {
        let addr = resolve(endpoint)?;
        let connect_err = |source: std::io::Error| TransportError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };
        let stream = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout).map_err(connect_err)?,
            None => TcpStream::connect(addr).map_err(connect_err)?,
        };
        stream.set_nodelay(true)?;
        debug!(%addr, "connected to socket endpoint");
        Ok(BridgeStream::from_tcp(stream))
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn resolve(endpoint: &str) -> Result<SocketAddr> {
    endpoint
        .to_socket_addrs()
        .map_err(|err| TransportError::InvalidAddress(format!("{endpoint}: {err}")))?
        .next()
        .ok_or_else(|| TransportError::InvalidAddress(endpoint.to_string()))
}
