use std::time::Duration;

use predbridge_frame::{FrameReader, FrameWriter};
use predbridge_transport::BridgeStream;
use tracing::debug;

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};

/// One established connection: a framed reader and writer over cloned
/// handles of the same stream.
pub(crate) struct Link {
    reader: FrameReader<BridgeStream>,
    writer: FrameWriter<BridgeStream>,
    peer: String,
    receive_timeout: Duration,
}

impl Link {
    pub(crate) fn open(stream: BridgeStream, config: &ChannelConfig) -> Result<Self> {
        let peer = stream.peer_description();
        let reader_stream = stream.try_clone()?;
        let frame_config = config.frame_config();

        let reader = FrameReader::for_stream(reader_stream, frame_config.clone())
            .map_err(|err| ChannelError::Broken(err.to_string()))?;
        let writer = FrameWriter::for_stream(stream, frame_config)
            .map_err(|err| ChannelError::Broken(err.to_string()))?;

        debug!(%peer, transport = %config.transport, "link established");
        Ok(Self {
            reader,
            writer,
            peer,
            receive_timeout: config.receive_timeout,
        })
    }

    pub(crate) fn send(&mut self, message: &str) -> Result<()> {
        self.writer.send(message).map_err(ChannelError::from_send)
    }

    pub(crate) fn receive(&mut self) -> Result<String> {
        self.reader
            .read_message()
            .map_err(|err| ChannelError::from_receive(err, self.receive_timeout))
    }

    pub(crate) fn peer(&self) -> &str {
        &self.peer
    }

    pub(crate) fn close(&self) {
        self.writer.get_ref().shutdown();
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.close();
    }
}
