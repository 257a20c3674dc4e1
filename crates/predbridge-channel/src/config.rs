use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use predbridge_frame::{FrameConfig, Framing, DEFAULT_MAX_PAYLOAD};

/// Default bound on a single blocking receive.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default bound on a single blocking send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Which transport a channel runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Local, message-framed, one host at a time.
    Pipe,
    /// Remote, newline-framed text.
    Socket,
}

impl TransportKind {
    /// Framing used on the wire for this transport.
    pub fn framing(self) -> Framing {
        match self {
            Self::Pipe => Framing::LengthPrefixed,
            Self::Socket => Framing::Line,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pipe => "pipe",
            Self::Socket => "socket",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pipe" => Ok(Self::Pipe),
            "socket" => Ok(Self::Socket),
            other => Err(format!("unknown transport '{other}' (expected pipe or socket)")),
        }
    }
}

/// Which side opens the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Connect to an endpoint the host is listening on.
    Client,
    /// Bind the endpoint and wait for the host to connect.
    Server,
}

/// Bounded retry with exponential backoff, used only while establishing a
/// connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connection attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Try once, never sleep.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }

    pub(crate) fn total_attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Everything needed to open a channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub transport: TransportKind,
    /// Socket path for pipes, `host:port` for sockets.
    pub endpoint: String,
    pub role: Role,
    /// Bound on a single blocking receive.
    pub receive_timeout: Duration,
    /// Bound on a single blocking send.
    pub send_timeout: Option<Duration>,
    /// Largest message accepted in either direction.
    pub max_message_size: usize,
    pub retry: RetryPolicy,
}

impl ChannelConfig {
    /// Client-side local pipe channel at `path`.
    pub fn pipe(path: impl Into<String>) -> Self {
        Self::new(TransportKind::Pipe, path.into())
    }

    /// Client-side remote socket channel at `endpoint`.
    pub fn socket(endpoint: impl Into<String>) -> Self {
        Self::new(TransportKind::Socket, endpoint.into())
    }

    fn new(transport: TransportKind, endpoint: String) -> Self {
        Self {
            transport,
            endpoint,
            role: Role::Client,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            send_timeout: Some(DEFAULT_SEND_TIMEOUT),
            max_message_size: DEFAULT_MAX_PAYLOAD,
            retry: RetryPolicy::default(),
        }
    }

    /// Switch the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Override the receive timeout.
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            framing: self.transport.framing(),
            max_payload_size: self.max_message_size,
            read_timeout: Some(self.receive_timeout),
            write_timeout: self.send_timeout,
        }
    }
}
