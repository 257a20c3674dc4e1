#[cfg(unix)]
use predbridge_transport::UnixDomainSocket;
use predbridge_transport::{BridgeStream, TcpSocket};

use crate::channel::Channel;
use crate::config::{ChannelConfig, Role, TransportKind};
use crate::error::Result;
#[cfg(unix)]
use crate::pipe::PipeChannel;
use crate::socket::SocketChannel;

enum Endpoint {
    #[cfg(unix)]
    Pipe(UnixDomainSocket),
    Socket(TcpSocket),
}

/// Server-side endpoint handing out one connected [`Channel`] per host
/// connection.
pub struct ChannelListener {
    endpoint: Endpoint,
    config: ChannelConfig,
}

impl ChannelListener {
    /// Bind the endpoint named by `config`.
    pub fn bind(config: ChannelConfig) -> Result<Self> {
        let endpoint = match config.transport {
            #[cfg(unix)]
            TransportKind::Pipe => Endpoint::Pipe(UnixDomainSocket::bind(&config.endpoint)?),
            #[cfg(not(unix))]
            TransportKind::Pipe => return Err(crate::error::ChannelError::Unsupported("pipe")),
            TransportKind::Socket => Endpoint::Socket(TcpSocket::bind(&config.endpoint)?),
        };
        Ok(Self {
            endpoint,
            config: config.with_role(Role::Server),
        })
    }

    /// Block until a host connects.
    pub fn accept(&self) -> Result<Box<dyn Channel>> {
        let stream = match &self.endpoint {
            #[cfg(unix)]
            Endpoint::Pipe(listener) => listener.accept()?,
            Endpoint::Socket(listener) => listener.accept()?,
        };
        self.wrap(stream)
    }

    /// Accept a waiting host without blocking; `Ok(None)` when nobody is waiting.
    pub fn poll_accept(&self) -> Result<Option<Box<dyn Channel>>> {
        let stream = match &self.endpoint {
            #[cfg(unix)]
            Endpoint::Pipe(listener) => listener.try_accept()?,
            Endpoint::Socket(listener) => listener.try_accept()?,
        };
        stream.map(|stream| self.wrap(stream)).transpose()
    }

    fn wrap(&self, stream: BridgeStream) -> Result<Box<dyn Channel>> {
        match self.config.transport {
            #[cfg(unix)]
            TransportKind::Pipe => Ok(Box::new(PipeChannel::from_stream(
                stream,
                self.config.clone(),
            )?)),
            #[cfg(not(unix))]
            TransportKind::Pipe => Err(crate::error::ChannelError::Unsupported("pipe")),
            TransportKind::Socket => Ok(Box::new(SocketChannel::from_stream(
                stream,
                self.config.clone(),
            )?)),
        }
    }

    /// Endpoint actually bound (resolves TCP port `0`).
    pub fn local_endpoint(&self) -> String {
        match &self.endpoint {
            #[cfg(unix)]
            Endpoint::Pipe(listener) => listener.path().display().to_string(),
            Endpoint::Socket(listener) => listener.local_addr().to_string(),
        }
    }

    pub fn transport(&self) -> TransportKind {
        self.config.transport
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::channel::open_channel;

    fn wait_for_host(listener: &ChannelListener) -> Box<dyn Channel> {
        for _ in 0..200 {
            if let Some(channel) = listener.poll_accept().expect("poll should not fail") {
                return channel;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("no host connected");
    }

    #[test]
    fn socket_listener_serves_sequential_hosts() {
        let listener = ChannelListener::bind(ChannelConfig::socket("127.0.0.1:0")).unwrap();
        let endpoint = listener.local_endpoint();
        assert!(listener.poll_accept().unwrap().is_none());

        for round in 0..2 {
            let endpoint = endpoint.clone();
            let host = thread::spawn(move || {
                let mut channel = open_channel(ChannelConfig::socket(endpoint)).unwrap();
                channel.connect().unwrap();
                channel.send(&format!("hello {round}")).unwrap();
            });

            let mut channel = wait_for_host(&listener);
            assert!(channel.is_connected());
            assert_eq!(channel.receive().unwrap(), format!("hello {round}"));
            host.join().unwrap();
        }
    }

    #[test]
    #[cfg(unix)]
    fn pipe_listener_accepts_blocking() {
        let dir = std::env::temp_dir().join(format!("pbl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("host.sock").display().to_string();

        let listener = ChannelListener::bind(ChannelConfig::pipe(path.clone())).unwrap();
        assert_eq!(listener.local_endpoint(), path);
        assert_eq!(listener.transport(), TransportKind::Pipe);

        let host = thread::spawn(move || {
            let mut channel = open_channel(ChannelConfig::pipe(path)).unwrap();
            channel.connect().unwrap();
            channel.send("from host").unwrap();
        });

        let mut channel = listener.accept().unwrap();
        assert_eq!(channel.receive().unwrap(), "from host");
        host.join().unwrap();
        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
