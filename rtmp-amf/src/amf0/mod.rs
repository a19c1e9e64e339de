/// Support for reading AMF0 data
pub mod read;
/// AMF0 type markers
mod type_marker;
/// Support for writing AMF0 data
pub mod write;

pub use read::AMF0Decoder;
pub use write::AMF0Encoder;

use crate::amf3::Externals;
use crate::errors::{DecodeError, EncodeError};
use crate::reference_tables::ReferenceTables;
use crate::types::Amf0Node;

/// Decode a single value, returning it along with the unconsumed input
pub fn decode<'a>(
    bytes: &'a [u8],
    tables: &mut ReferenceTables,
    externals: &Externals,
) -> Result<(Amf0Node, &'a [u8]), DecodeError> {
    let (rest, node) = AMF0Decoder::new(tables, externals).parse_single_element(bytes)?;
    Ok((node, rest))
}

/// Decode values until the input is exhausted, an empty input gives an empty list
pub fn decode_all(
    bytes: &[u8],
    tables: &mut ReferenceTables,
    externals: &Externals,
) -> Result<Vec<Amf0Node>, DecodeError> {
    let (_, nodes) = AMF0Decoder::new(tables, externals).parse_all(bytes)?;
    Ok(nodes)
}

/// Encode a single value
pub fn encode(
    node: &Amf0Node,
    tables: &mut ReferenceTables,
    externals: &Externals,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    AMF0Encoder::new(tables, externals).write_value(&mut out, node)?;
    Ok(out)
}

/// Encode a sequence of values back to back
pub fn encode_all(
    nodes: &[Amf0Node],
    tables: &mut ReferenceTables,
    externals: &Externals,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    AMF0Encoder::new(tables, externals).write_all(&mut out, nodes)?;
    Ok(out)
}
