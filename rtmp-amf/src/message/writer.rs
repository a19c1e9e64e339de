use super::{ChannelHeaders, MessageHeader, RawMessage};
use crate::chunk::{ChunkBasicHeader, ChunkFormat, ChunkHeader, MAX_U24};
use crate::errors::{Error, FramingError};
use bytes::{BufMut, BytesMut};
use log::warn;
use std::num::NonZeroUsize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Splits messages back into chunks
///
/// Keeps track of the header state the peer will apply to each channel, so that a compressed
/// header which would now inherit the wrong fields is promoted to a fuller one.
#[derive(Debug)]
pub struct MessageWriter {
    chunk_size: NonZeroUsize,
    sent: ChannelHeaders,
}

impl MessageWriter {
    /// Create a writer for the given fixed chunk size
    pub fn new(chunk_size: NonZeroUsize) -> Self {
        Self {
            chunk_size,
            sent: ChannelHeaders::new(),
        }
    }

    /// Pick the header to send so that the peer resolves it to `wanted`
    fn header_for(&self, original: ChunkHeader, wanted: MessageHeader) -> ChunkHeader {
        let channel = original.channel_id();
        let header = match original {
            ChunkHeader::Full { basic, .. } => ChunkHeader::Full {
                basic,
                timestamp: wanted.timestamp,
                length: wanted.length,
                type_id: wanted.type_id,
                stream_id: wanted.stream_id,
            },
            ChunkHeader::SameStream { basic, .. } => ChunkHeader::SameStream {
                basic,
                timestamp: wanted.timestamp,
                length: wanted.length,
                type_id: wanted.type_id,
            },
            other => other,
        };

        if self.sent.resolve(&header).ok() == Some(wanted) {
            return header;
        }

        let promoted = match self.sent.get(channel) {
            Some(previous) if previous.stream_id == wanted.stream_id => ChunkHeader::SameStream {
                basic: ChunkBasicHeader::new(ChunkFormat::SameStream, channel),
                timestamp: wanted.timestamp,
                length: wanted.length,
                type_id: wanted.type_id,
            },
            _ => ChunkHeader::Full {
                basic: ChunkBasicHeader::new(ChunkFormat::Full, channel),
                timestamp: wanted.timestamp,
                length: wanted.length,
                type_id: wanted.type_id,
                stream_id: wanted.stream_id,
            },
        };
        warn!(
            "Promoting {:?} header on channel {channel} to {:?}",
            header.format(),
            promoted.format()
        );
        promoted
    }

    /// Encode a message into its chunks, the header length is taken from the payload
    pub fn frame(&mut self, message: &RawMessage) -> Result<BytesMut, FramingError> {
        let payload = &message.payload;
        let length = u32::try_from(payload.len())
            .ok()
            .filter(|length| *length <= MAX_U24)
            .ok_or(FramingError::MessageTooLarge(payload.len()))?;

        let channel = message.channel_id();
        let wanted = MessageHeader {
            length,
            ..message.message
        };
        let header = self.header_for(message.header, wanted);
        self.sent.record(channel, wanted);

        let continuation = ChunkBasicHeader::new(ChunkFormat::Continuation, channel).first_byte();
        let mut buf = BytesMut::with_capacity(
            header.encoded_len() + payload.len() + payload.len() / self.chunk_size.get(),
        );
        header.write_to(&mut buf);
        for (index, chunk) in payload.chunks(self.chunk_size.get()).enumerate() {
            if index > 0 {
                buf.put_u8(continuation);
            }
            buf.extend_from_slice(chunk);
        }

        Ok(buf)
    }

    /// Frame a message and write it out
    pub async fn write_message<W: AsyncWrite + Unpin>(
        &mut self,
        writer: &mut W,
        message: &RawMessage,
    ) -> Result<(), Error> {
        let buf = self.frame(message)?;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::CHUNK_SIZE;
    use crate::message::MessageReassembler;
    use pretty_assertions::assert_eq;

    fn message(header: ChunkHeader, message: MessageHeader, payload: &[u8]) -> RawMessage {
        RawMessage {
            header,
            message,
            payload: BytesMut::from(payload),
            remaining: 0,
        }
    }

    fn command_header(length: u32) -> MessageHeader {
        MessageHeader {
            timestamp: 0,
            length,
            type_id: 0x14,
            stream_id: 1,
        }
    }

    #[tokio::test]
    async fn test_reframe_matches_input() {
        let body: Vec<u8> = (0..300).map(|i| i as u8).collect();
        let mut bytes = vec![
            0x05, 0x00, 0x00, 0x00, 0x00, 0x01, 0x2C, 0x14, 0x00, 0x00, 0x00, 0x01,
        ];
        bytes.extend_from_slice(&body[..128]);
        bytes.push(0xC5);
        bytes.extend_from_slice(&body[128..256]);
        bytes.push(0xC5);
        bytes.extend_from_slice(&body[256..]);

        let mut reader = bytes.as_slice();
        let received = MessageReassembler::new(CHUNK_SIZE)
            .read_next_message(&mut reader)
            .await
            .unwrap()
            .unwrap();

        let mut out = Vec::new();
        MessageWriter::new(CHUNK_SIZE)
            .write_message(&mut out, &received)
            .await
            .unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_length_rewritten_from_payload() {
        let header = ChunkHeader::Full {
            basic: ChunkBasicHeader::new(ChunkFormat::Full, 3),
            timestamp: 0,
            length: 1,
            type_id: 0x14,
            stream_id: 1,
        };
        let framed = MessageWriter::new(CHUNK_SIZE)
            .frame(&message(header, command_header(1), &[1, 2, 3]))
            .unwrap();
        assert_eq!(
            &framed[..],
            &[0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x14, 0x00, 0x00, 0x00, 0x01, 1, 2, 3]
        );
    }

    #[test]
    fn test_continuation_promoted_when_length_changes() {
        let mut writer = MessageWriter::new(CHUNK_SIZE);
        let full = ChunkHeader::Full {
            basic: ChunkBasicHeader::new(ChunkFormat::Full, 5),
            timestamp: 0,
            length: 2,
            type_id: 0x14,
            stream_id: 1,
        };
        writer
            .frame(&message(full, command_header(2), &[1, 2]))
            .unwrap();

        let continuation = ChunkHeader::Continuation {
            basic: ChunkBasicHeader::new(ChunkFormat::Continuation, 5),
        };

        // Same length, the peer inherits correctly
        let framed = writer
            .frame(&message(continuation, command_header(2), &[3, 4]))
            .unwrap();
        assert_eq!(&framed[..], &[0xC5, 3, 4]);

        // Longer payload, the inherited length would be wrong
        let framed = writer
            .frame(&message(continuation, command_header(2), &[5, 6, 7]))
            .unwrap();
        assert_eq!(
            &framed[..],
            &[0x45, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x14, 5, 6, 7]
        );
    }

    #[test]
    fn test_promoted_to_full_without_prior_header() {
        let continuation = ChunkHeader::Continuation {
            basic: ChunkBasicHeader::new(ChunkFormat::Continuation, 7),
        };
        let framed = MessageWriter::new(CHUNK_SIZE)
            .frame(&message(continuation, command_header(1), &[9]))
            .unwrap();
        assert_eq!(
            &framed[..],
            &[0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x14, 0x00, 0x00, 0x00, 0x01, 9]
        );
    }

    #[test]
    fn test_empty_payload_writes_header_only() {
        let header = ChunkHeader::Full {
            basic: ChunkBasicHeader::new(ChunkFormat::Full, 3),
            timestamp: 0,
            length: 0,
            type_id: 0x14,
            stream_id: 1,
        };
        let framed = MessageWriter::new(CHUNK_SIZE)
            .frame(&message(header, command_header(0), &[]))
            .unwrap();
        assert_eq!(framed.len(), 12);
    }

    #[test]
    fn test_single_byte_chunks() {
        let header = ChunkHeader::Full {
            basic: ChunkBasicHeader::new(ChunkFormat::Full, 3),
            timestamp: 0,
            length: 3,
            type_id: 0x14,
            stream_id: 1,
        };
        let framed = MessageWriter::new(NonZeroUsize::MIN)
            .frame(&message(header, command_header(3), &[1, 2, 3]))
            .unwrap();
        assert_eq!(&framed[12..], &[1, 0xC3, 2, 0xC3, 3]);
    }
}
