//! Chunk headers
//!
//! Every chunk starts with a one byte basic header holding a two bit format and a six bit
//! channel id. The format decides how many message header fields follow:
//!
//! | format | bytes | fields                                        |
//! |--------|-------|-----------------------------------------------|
//! | 0      | 11    | timestamp, length, type id, stream id         |
//! | 1      | 7     | timestamp delta, length, type id              |
//! | 2      | 3     | timestamp delta                               |
//! | 3      | 0     | none, everything is inherited from the channel |

use crate::errors::FramingError;
use std::num::NonZeroUsize;

/// Reading of chunk headers
pub mod read;
/// Writing of chunk headers
pub mod write;

pub use read::read_header;
pub use write::write_header;

/// The default chunk size, used in both directions
pub const CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(128) {
    Some(size) => size,
    None => panic!("chunk size must be non-zero"),
};

/// The largest value of a three byte field
pub const MAX_U24: u32 = 0xFF_FFFF;

const CHANNEL_MASK: u8 = 0x3F;

/// The four chunk header formats
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ChunkFormat {
    /// Type 0, a full header
    Full = 0,
    /// Type 1, same stream as the previous message on the channel
    SameStream = 1,
    /// Type 2, only the timestamp changes
    TimestampOnly = 2,
    /// Type 3, a continuation or an exact repeat
    Continuation = 3,
}

impl TryFrom<u8> for ChunkFormat {
    type Error = FramingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Full),
            1 => Ok(Self::SameStream),
            2 => Ok(Self::TimestampOnly),
            3 => Ok(Self::Continuation),
            _ => Err(FramingError::UnknownFormat(value)),
        }
    }
}

/// The first byte of a chunk, kept as read so it can be written back unchanged
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChunkBasicHeader {
    first_byte: u8,
    format: ChunkFormat,
}

impl ChunkBasicHeader {
    /// Parse a first byte
    pub fn parse(first_byte: u8) -> Result<Self, FramingError> {
        Ok(Self {
            first_byte,
            format: ChunkFormat::try_from(first_byte >> 6)?,
        })
    }

    /// Build the first byte for the given format and channel
    pub fn new(format: ChunkFormat, channel_id: u8) -> Self {
        Self {
            first_byte: (format as u8) << 6 | (channel_id & CHANNEL_MASK),
            format,
        }
    }

    /// The byte as it appears on the wire
    pub fn first_byte(&self) -> u8 {
        self.first_byte
    }

    /// The header format
    pub fn format(&self) -> ChunkFormat {
        self.format
    }

    /// The channel (chunk stream) id
    pub fn channel_id(&self) -> u8 {
        self.first_byte & CHANNEL_MASK
    }
}

/// A chunk header, with only the fields its format carries
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChunkHeader {
    /// Type 0
    Full {
        /// The basic header
        basic: ChunkBasicHeader,
        /// Absolute timestamp
        timestamp: u32,
        /// Message length
        length: u32,
        /// Message type id
        type_id: u8,
        /// Message stream id
        stream_id: u32,
    },
    /// Type 1
    SameStream {
        /// The basic header
        basic: ChunkBasicHeader,
        /// Timestamp delta
        timestamp: u32,
        /// Message length
        length: u32,
        /// Message type id
        type_id: u8,
    },
    /// Type 2
    TimestampOnly {
        /// The basic header
        basic: ChunkBasicHeader,
        /// Timestamp delta
        timestamp: u32,
    },
    /// Type 3
    Continuation {
        /// The basic header
        basic: ChunkBasicHeader,
    },
}

impl ChunkHeader {
    /// The basic header
    pub fn basic(&self) -> ChunkBasicHeader {
        match *self {
            ChunkHeader::Full { basic, .. }
            | ChunkHeader::SameStream { basic, .. }
            | ChunkHeader::TimestampOnly { basic, .. }
            | ChunkHeader::Continuation { basic } => basic,
        }
    }

    /// The header format
    pub fn format(&self) -> ChunkFormat {
        self.basic().format()
    }

    /// The channel id
    pub fn channel_id(&self) -> u8 {
        self.basic().channel_id()
    }

    /// The number of bytes this header takes on the wire, including the basic header
    pub fn encoded_len(&self) -> usize {
        match self {
            ChunkHeader::Full { .. } => 12,
            ChunkHeader::SameStream { .. } => 8,
            ChunkHeader::TimestampOnly { .. } => 4,
            ChunkHeader::Continuation { .. } => 1,
        }
    }
}
