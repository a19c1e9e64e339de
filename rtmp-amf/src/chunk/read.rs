use super::{ChunkBasicHeader, ChunkFormat, ChunkHeader};
use crate::errors::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

fn u24(bytes: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

/// Read the next chunk header
///
/// Returns `None` when the stream ends cleanly before the first byte of a header. Running out
/// of input inside a header is a [`FramingError::Truncated`](crate::FramingError::Truncated).
pub async fn read_header<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<ChunkHeader>, Error> {
    let first_byte = match reader.read_u8().await {
        Ok(byte) => byte,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(Error::Transport(e)),
    };
    let basic = ChunkBasicHeader::parse(first_byte)?;

    let header = match basic.format() {
        ChunkFormat::Full => {
            let mut buf = [0u8; 11];
            reader
                .read_exact(&mut buf)
                .await
                .map_err(Error::from_chunk_read)?;
            ChunkHeader::Full {
                basic,
                timestamp: u24([buf[0], buf[1], buf[2]]),
                length: u24([buf[3], buf[4], buf[5]]),
                type_id: buf[6],
                stream_id: u32::from_be_bytes([buf[7], buf[8], buf[9], buf[10]]),
            }
        }
        ChunkFormat::SameStream => {
            let mut buf = [0u8; 7];
            reader
                .read_exact(&mut buf)
                .await
                .map_err(Error::from_chunk_read)?;
            ChunkHeader::SameStream {
                basic,
                timestamp: u24([buf[0], buf[1], buf[2]]),
                length: u24([buf[3], buf[4], buf[5]]),
                type_id: buf[6],
            }
        }
        ChunkFormat::TimestampOnly => {
            let mut buf = [0u8; 3];
            reader
                .read_exact(&mut buf)
                .await
                .map_err(Error::from_chunk_read)?;
            ChunkHeader::TimestampOnly {
                basic,
                timestamp: u24(buf),
            }
        }
        ChunkFormat::Continuation => ChunkHeader::Continuation { basic },
    };

    Ok(Some(header))
}
