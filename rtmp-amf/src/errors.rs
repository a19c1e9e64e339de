use crate::reference_tables::TableKind;
use crate::types::AMFVersion;
use nom::error::{ErrorKind, FromExternalError, ParseError};
use thiserror::Error;

/// A boxed error returned by interceptors
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Enum for representing decoding errors
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum DecodeError {
    /// A type marker that is not supported in this format
    #[error("Unsupported {version} type marker 0x{marker:02x}")]
    UnsupportedType {
        /// The format the marker was read in
        version: AMFVersion,
        /// The marker byte
        marker: u8,
    },

    /// An empty property name was not followed by the object end marker
    #[error("Expected object end marker after empty property name, found 0x{0:02x}")]
    InvalidObjectEnd(u8),

    /// A reference to a table entry that has not been decoded yet
    #[error("Reference to {table} table index {index} which does not exist")]
    ReferenceOutOfRange {
        /// The table that was referenced
        table: TableKind,
        /// The referenced index
        index: usize,
    },

    /// An AMF3 array with an associative part
    #[error("Associative AMF3 arrays are not supported")]
    AssociativeArray,

    /// An externalizable class with no registered codec
    #[error("Unknown externalizable class {0}")]
    UnknownExternal(String),

    /// An externalizable class whose body did not have the expected shape
    #[error("Invalid body for externalizable class {class}: {reason}")]
    InvalidExternal {
        /// The class being decoded
        class: String,
        /// What was wrong with it
        reason: String,
    },

    /// Values nested deeper than the decoder allows
    #[error("Values nested more than {0} levels deep")]
    NestingTooDeep(usize),

    /// String data that is not valid utf-8
    #[error("Invalid utf-8 string")]
    InvalidUtf8,

    /// Input ended before the value was complete
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// A nom internal error
    #[error("Nom internal error: {0:?}")]
    Nom(ErrorKind),
}

impl<'a> ParseError<&'a [u8]> for DecodeError {
    fn from_error_kind(_input: &'a [u8], kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Eof => DecodeError::UnexpectedEof,
            kind => DecodeError::Nom(kind),
        }
    }

    fn append(_: &[u8], _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a, E> FromExternalError<&'a [u8], E> for DecodeError {
    fn from_external_error(_input: &'a [u8], kind: ErrorKind, _e: E) -> Self {
        DecodeError::Nom(kind)
    }
}

impl From<nom::Err<DecodeError>> for DecodeError {
    fn from(e: nom::Err<DecodeError>) -> Self {
        match e {
            nom::Err::Incomplete(_) => DecodeError::UnexpectedEof,
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
        }
    }
}

/// Enum for representing encoding errors
#[derive(Error, Debug)]
pub enum EncodeError {
    /// Writing to the output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A length that does not fit in the field used to store it
    #[error("Length {0} is too large to encode")]
    TooLarge(usize),

    /// An externalizable object is missing a property its codec requires
    #[error("{class} is missing required property {property}")]
    MissingProperty {
        /// The class being encoded
        class: String,
        /// The missing property
        property: &'static str,
    },

    /// An externalizable object has a property its codec cannot write
    #[error("{class} cannot encode property {property}")]
    InvalidProperty {
        /// The class being encoded
        class: String,
        /// The offending property
        property: String,
    },
}

/// Errors in the chunk framing layer
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum FramingError {
    /// The format bits of a basic header were not 0..=3
    #[error("Unknown chunk header format {0}")]
    UnknownFormat(u8),

    /// A compressed header arrived on a channel with no prior header to inherit from
    #[error("Channel {channel} sent a compressed header with no prior header")]
    MissingPriorHeader {
        /// The channel id
        channel: u8,
    },

    /// A channel started a new message while one was still being reassembled
    #[error("Channel {channel} started a new message before the previous one completed")]
    InterruptedMessage {
        /// The channel id
        channel: u8,
    },

    /// The stream ended inside a chunk
    #[error("Stream ended inside a chunk")]
    Truncated,

    /// A message too long for the 3 byte length field
    #[error("Message of {0} bytes does not fit in a chunk header")]
    MessageTooLarge(usize),
}

/// Errors that end a connection
#[derive(Error, Debug)]
pub enum Error {
    /// The chunk stream was malformed
    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    /// A message body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A message body could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The interceptor failed
    #[error("Interceptor failed: {0}")]
    Transform(#[source] BoxError),

    /// The underlying transport failed
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The peers did not agree on the handshake
    #[error("Handshake failed: {0}")]
    Handshake(String),
}

impl Error {
    /// Map an io error from a read inside a chunk, where end of stream means a truncated chunk
    pub(crate) fn from_chunk_read(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Framing(FramingError::Truncated)
        } else {
            Error::Transport(e)
        }
    }
}
