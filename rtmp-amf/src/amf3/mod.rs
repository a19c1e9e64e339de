/// Registry of codecs for externalizable classes
pub mod external;
/// Abstraction over the AMF3 length and reference types
mod length;
/// Reading of AMF3 data
pub mod read;
/// AMF3 type markers
mod type_marker;
/// The 29 bit variable length integer
pub mod varint;
/// Writing of AMF3 data
pub mod write;

pub use external::{ExternalCodec, Externals};
pub use read::AMF3Decoder;
pub use write::AMF3Encoder;

use crate::errors::{DecodeError, EncodeError};
use crate::reference_tables::ReferenceTables;
use crate::types::Amf3Node;

/// Decode a single value, returning it along with the unconsumed input
pub fn decode<'a>(
    bytes: &'a [u8],
    tables: &mut ReferenceTables,
    externals: &Externals,
) -> Result<(Amf3Node, &'a [u8]), DecodeError> {
    let (rest, node) = AMF3Decoder::new(tables, externals).parse_single_element(bytes)?;
    Ok((node, rest))
}

/// Decode values until the input is exhausted
pub fn decode_all(
    bytes: &[u8],
    tables: &mut ReferenceTables,
    externals: &Externals,
) -> Result<Vec<Amf3Node>, DecodeError> {
    let (_, nodes) = AMF3Decoder::new(tables, externals).parse_all(bytes)?;
    Ok(nodes)
}

/// Encode a single value
pub fn encode(
    node: &Amf3Node,
    tables: &mut ReferenceTables,
    externals: &Externals,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    AMF3Encoder::new(tables, externals).write_value(&mut out, node)?;
    Ok(out)
}

/// Encode a sequence of values back to back
pub fn encode_all(
    nodes: &[Amf3Node],
    tables: &mut ReferenceTables,
    externals: &Externals,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    AMF3Encoder::new(tables, externals).write_all(&mut out, nodes)?;
    Ok(out)
}
