use super::{ChannelHeaders, RawMessage};
use crate::chunk::{read_header, ChunkFormat};
use crate::errors::{Error, FramingError};
use log::{debug, warn};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Turns a chunk stream into complete messages
///
/// Chunks of different channels may interleave, each channel has at most one message in flight.
#[derive(Debug)]
pub struct MessageReassembler {
    chunk_size: NonZeroUsize,
    headers: ChannelHeaders,
    in_flight: HashMap<u8, RawMessage>,
}

impl MessageReassembler {
    /// Create a reassembler for the given fixed chunk size
    pub fn new(chunk_size: NonZeroUsize) -> Self {
        Self {
            chunk_size,
            headers: ChannelHeaders::new(),
            in_flight: HashMap::new(),
        }
    }

    /// The number of messages that have started but not completed
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Read chunks until some channel completes a message
    ///
    /// Returns `None` once the stream ends on a chunk boundary. Messages still in flight at that
    /// point are discarded.
    pub async fn read_next_message<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<RawMessage>, Error> {
        loop {
            let Some(header) = read_header(reader).await? else {
                if !self.in_flight.is_empty() {
                    warn!(
                        "Stream ended with {} incomplete messages, discarding them",
                        self.in_flight.len()
                    );
                    self.in_flight.clear();
                }
                return Ok(None);
            };

            let channel = header.channel_id();
            let mut message = match self.in_flight.remove(&channel) {
                Some(message) => {
                    if header.format() != ChunkFormat::Continuation {
                        return Err(FramingError::InterruptedMessage { channel }.into());
                    }
                    message
                }
                None => {
                    let resolved = self.headers.resolve(&header)?;
                    self.headers.record(channel, resolved);
                    RawMessage::new(header, resolved)
                }
            };

            let take = message.remaining.min(self.chunk_size.get());
            let start = message.payload.len();
            message.payload.resize(start + take, 0);
            reader
                .read_exact(&mut message.payload[start..])
                .await
                .map_err(Error::from_chunk_read)?;
            message.remaining -= take;

            if message.is_complete() {
                debug!(
                    "Received message on channel {channel}, type 0x{:02x}, {} bytes",
                    message.message.type_id,
                    message.payload.len()
                );
                return Ok(Some(message));
            }
            self.in_flight.insert(channel, message);
        }
    }
}
