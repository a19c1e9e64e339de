//! Complete messages and the per channel header state they are resolved against
use crate::chunk::ChunkHeader;
use crate::errors::FramingError;
use bytes::BytesMut;
use std::collections::HashMap;

mod reassembler;
mod writer;

pub use reassembler::MessageReassembler;
pub use writer::MessageWriter;

/// Upper bound on the buffer reserved up front for a message, longer ones grow as chunks arrive
const MAX_PREALLOC: usize = 64 * 1024;

/// The message fields a channel carries after applying a chunk header
///
/// `timestamp` is the timestamp field as last sent on the channel, absolute for a full header and
/// a delta otherwise.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageHeader {
    /// Timestamp or timestamp delta
    pub timestamp: u32,
    /// Payload length in bytes
    pub length: u32,
    /// Message type id
    pub type_id: u8,
    /// Message stream id
    pub stream_id: u32,
}

/// The last message header seen on every channel
#[derive(Clone, Debug, Default)]
pub struct ChannelHeaders {
    headers: HashMap<u8, MessageHeader>,
}

impl ChannelHeaders {
    /// Create an empty set of channels
    pub fn new() -> Self {
        Self::default()
    }

    /// The last header recorded for a channel
    pub fn get(&self, channel: u8) -> Option<&MessageHeader> {
        self.headers.get(&channel)
    }

    /// Apply a chunk header on top of its channel's previous header
    pub fn resolve(&self, header: &ChunkHeader) -> Result<MessageHeader, FramingError> {
        let channel = header.channel_id();
        if let ChunkHeader::Full {
            timestamp,
            length,
            type_id,
            stream_id,
            ..
        } = *header
        {
            return Ok(MessageHeader {
                timestamp,
                length,
                type_id,
                stream_id,
            });
        }

        let previous = self
            .get(channel)
            .ok_or(FramingError::MissingPriorHeader { channel })?;

        Ok(match *header {
            ChunkHeader::SameStream {
                timestamp,
                length,
                type_id,
                ..
            } => MessageHeader {
                timestamp,
                length,
                type_id,
                ..*previous
            },
            ChunkHeader::TimestampOnly { timestamp, .. } => MessageHeader {
                timestamp,
                ..*previous
            },
            _ => *previous,
        })
    }

    /// Remember the header now in effect on a channel
    pub fn record(&mut self, channel: u8, header: MessageHeader) {
        self.headers.insert(channel, header);
    }
}

/// A message as it travels through a session
#[derive(Clone, Debug, PartialEq)]
pub struct RawMessage {
    /// The header of the first chunk, written back unchanged unless it has to be promoted
    pub header: ChunkHeader,
    /// The resolved message fields
    pub message: MessageHeader,
    /// Payload bytes received so far
    pub payload: BytesMut,
    /// Payload bytes still expected
    pub remaining: usize,
}

impl RawMessage {
    /// Start a message with an empty payload
    pub fn new(header: ChunkHeader, message: MessageHeader) -> Self {
        let length = message.length as usize;
        Self {
            header,
            message,
            payload: BytesMut::with_capacity(length.min(MAX_PREALLOC)),
            remaining: length,
        }
    }

    /// The channel the message travels on
    pub fn channel_id(&self) -> u8 {
        self.header.channel_id()
    }

    /// Whether every payload byte has arrived
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}
