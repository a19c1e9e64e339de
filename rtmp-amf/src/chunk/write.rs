use super::ChunkHeader;
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

impl ChunkHeader {
    /// Append the header to a buffer, re-emitting the original first byte
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.basic().first_byte());
        match *self {
            ChunkHeader::Full {
                timestamp,
                length,
                type_id,
                stream_id,
                ..
            } => {
                buf.put_uint(u64::from(timestamp), 3);
                buf.put_uint(u64::from(length), 3);
                buf.put_u8(type_id);
                buf.put_u32(stream_id);
            }
            ChunkHeader::SameStream {
                timestamp,
                length,
                type_id,
                ..
            } => {
                buf.put_uint(u64::from(timestamp), 3);
                buf.put_uint(u64::from(length), 3);
                buf.put_u8(type_id);
            }
            ChunkHeader::TimestampOnly { timestamp, .. } => {
                buf.put_uint(u64::from(timestamp), 3);
            }
            ChunkHeader::Continuation { .. } => {}
        }
    }
}

/// Write a single chunk header
pub async fn write_header<W: AsyncWrite + Unpin>(
    writer: &mut W,
    header: &ChunkHeader,
) -> std::io::Result<()> {
    let mut buf = BytesMut::with_capacity(header.encoded_len());
    header.write_to(&mut buf);
    writer.write_all(&buf).await
}
