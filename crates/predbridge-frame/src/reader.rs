use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use predbridge_transport::BridgeStream;

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete text messages from any `Read` stream.
///
/// Handles partial reads internally: bytes received before a timeout stay
/// buffered and complete on a later call.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a reader with default configuration (length-prefixed framing).
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete message (blocking up to the stream's read timeout).
    ///
    /// Returns `Err(FrameError::Timeout)` when the stream times out and
    /// `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<String> {
        loop {
            if let Some(payload) = self
                .config
                .framing
                .decode(&mut self.buf, self.config.max_payload_size)?
            {
                return Ok(std::str::from_utf8(&payload)?.to_string());
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Err(FrameError::Timeout)
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Number of buffered bytes not yet returned as a message.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<BridgeStream> {
    /// Create a reader for a [`BridgeStream`] and apply the read timeout from config.
    pub fn for_stream(inner: BridgeStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: predbridge_transport::TransportError) -> FrameError {
    use predbridge_transport::TransportError;
    match err {
        TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
        TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
            FrameError::Io(source)
        }
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;

    use super::*;
    use crate::codec::{encode_frame, encode_line, Framing, MAGIC};

    fn line_config() -> FrameConfig {
        FrameConfig::new(Framing::Line)
    }

    #[test]
    fn reads_consecutive_frames() {
        let mut wire = BytesMut::new();
        encode_frame(b"one", &mut wire).unwrap();
        encode_frame(b"two", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        assert_eq!(reader.read_message().unwrap(), "one");
        assert_eq!(reader.read_message().unwrap(), "two");
        assert!(matches!(
            reader.read_message(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn reads_lines() {
        let mut wire = BytesMut::new();
        encode_line(b"{\"a\":1}", &mut wire).unwrap();
        encode_line(b"{\"b\":2}", &mut wire).unwrap();

        let mut reader = FrameReader::with_config(Cursor::new(wire.to_vec()), line_config());
        assert_eq!(reader.read_message().unwrap(), "{\"a\":1}");
        assert_eq!(reader.read_message().unwrap(), "{\"b\":2}");
    }

    #[test]
    fn byte_by_byte_delivery_still_yields_whole_message() {
        let mut wire = BytesMut::new();
        encode_frame("héllo".as_bytes(), &mut wire).unwrap();

        let mut reader = FrameReader::new(ByteByByte {
            bytes: wire.to_vec(),
            pos: 0,
        });
        assert_eq!(reader.read_message().unwrap(), "héllo");
    }

    #[test]
    fn closed_mid_frame_is_connection_closed() {
        let mut partial = BytesMut::new();
        partial.put_slice(&MAGIC);
        partial.put_u32_le(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        assert!(matches!(
            reader.read_message(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn invalid_utf8_payload_is_rejected() {
        let mut wire = BytesMut::new();
        encode_frame(&[0xC3, 0x28], &mut wire).unwrap();
        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        assert!(matches!(
            reader.read_message(),
            Err(FrameError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn timeout_keeps_partial_message_buffered() {
        let mut wire = BytesMut::new();
        encode_line(b"split-message", &mut wire).unwrap();
        let (head, tail) = wire.split_at(5);

        let mut reader = FrameReader::with_config(
            Scripted {
                steps: vec![
                    Step::Data(head.to_vec()),
                    Step::WouldBlock,
                    Step::Data(tail.to_vec()),
                ],
            },
            line_config(),
        );

        assert!(matches!(reader.read_message(), Err(FrameError::Timeout)));
        assert_eq!(reader.buffered(), 5);
        assert_eq!(reader.read_message().unwrap(), "split-message");
    }

    #[test]
    fn interrupted_read_retries() {
        let mut wire = BytesMut::new();
        encode_frame(b"ok", &mut wire).unwrap();

        let mut reader = FrameReader::new(Scripted {
            steps: vec![Step::Interrupted, Step::Data(wire.to_vec())],
        });
        assert_eq!(reader.read_message().unwrap(), "ok");
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_local_pair() {
        let (left, right) = BridgeStream::local_pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send("ping").unwrap();
        assert_eq!(reader.read_message().unwrap(), "ping");
    }

    #[test]
    #[cfg(unix)]
    fn stream_read_timeout_maps_to_timeout() {
        let (_left, right) = BridgeStream::local_pair().unwrap();
        let config = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::for_stream(right, config).unwrap();
        assert!(reader.read_message().unwrap_err().is_timeout());
    }

    struct ByteByByte {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByte {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    enum Step {
        Data(Vec<u8>),
        WouldBlock,
        Interrupted,
    }

    struct Scripted {
        steps: Vec<Step>,
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.steps.is_empty() {
                return Ok(0);
            }
            match self.steps.remove(0) {
                Step::Data(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Step::WouldBlock => Err(std::io::Error::from(ErrorKind::WouldBlock)),
                Step::Interrupted => Err(std::io::Error::from(ErrorKind::Interrupted)),
            }
        }
    }
}
