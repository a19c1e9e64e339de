//! Support for decoding AMF0 data
use crate::amf0::type_marker::TypeMarker;
use crate::amf3::read::AMF3Decoder;
use crate::amf3::Externals;
use crate::errors::DecodeError;
use crate::nom_utils::{fail, take_str, AMFResult, MAX_NESTING};
use crate::reference_tables::{ReferenceTables, TableKind};
use crate::types::{AMFVersion, Amf0Node, Properties};
use nom::combinator::map;
use nom::number::complete::{be_f64, be_i16, be_u16, be_u32, be_u8};
use nom::Err;

pub(crate) fn parse_string(i: &[u8]) -> AMFResult<'_, &str> {
    let (i, length) = be_u16(i)?;
    take_str(i, length as usize)
}

fn parse_long_string(i: &[u8]) -> AMFResult<'_, &str> {
    let (i, length) = be_u32(i)?;
    take_str(i, length as usize)
}

fn parse_element_number(i: &[u8]) -> AMFResult<'_, Amf0Node> {
    map(be_f64, Amf0Node::Number)(i)
}

fn parse_element_bool(i: &[u8]) -> AMFResult<'_, Amf0Node> {
    map(be_u8, |num: u8| Amf0Node::Boolean(num > 0))(i)
}

fn parse_element_date(i: &[u8]) -> AMFResult<'_, Amf0Node> {
    let (i, millis) = be_f64(i)?;
    let (i, timezone) = be_i16(i)?;
    Ok((i, Amf0Node::Date { millis, timezone }))
}

/// Handles decoding AMF0
///
/// Reference tables are shared with the AMF3 decoder used after a switch marker.
pub struct AMF0Decoder<'t> {
    tables: &'t mut ReferenceTables,
    externals: &'t Externals,
    depth: usize,
}

impl<'t> AMF0Decoder<'t> {
    /// Create a decoder over the given tables and external codecs
    pub fn new(tables: &'t mut ReferenceTables, externals: &'t Externals) -> Self {
        Self {
            tables,
            externals,
            depth: 0,
        }
    }

    /// Parse name/value pairs up to and including the object end marker
    fn parse_properties<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Properties<Amf0Node>> {
        let mut properties = Properties::new();

        let mut i = i;
        loop {
            let (j, name) = parse_string(i)?;
            if name.is_empty() {
                let (j, marker) = be_u8(j)?;
                if marker != TypeMarker::ObjectEnd as u8 {
                    return fail(DecodeError::InvalidObjectEnd(marker));
                }
                return Ok((j, properties));
            }

            let (j, value) = self.parse_single_element(j)?;
            properties.insert(name.to_string(), value);
            i = j;
        }
    }

    fn parse_element_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf0Node> {
        let (i, properties) = self.parse_properties(i)?;
        Ok((i, Amf0Node::Object(properties)))
    }

    fn parse_element_ecma_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf0Node> {
        // The declared length is only a hint, the end marker terminates the array
        let (i, _length) = be_u32(i)?;
        let (i, properties) = self.parse_properties(i)?;

        for value in properties.values() {
            self.tables.amf0_objects.push(value.clone());
        }
        Ok((i, Amf0Node::EcmaArray(properties)))
    }

    fn parse_element_strict_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf0Node> {
        let (i, length) = be_u32(i)?;
        let length = length as usize;

        // There must be at least `length` bytes to read this, this prevents OOM errors with v.large arrays
        if i.len() < length {
            return fail(DecodeError::UnexpectedEof);
        }

        let mut i = i;
        let mut items = Vec::with_capacity(length);
        for _ in 0..length {
            let (j, item) = self.parse_single_element(i)?;
            items.push(item);
            i = j;
        }

        Ok((i, Amf0Node::StrictArray(items)))
    }

    fn parse_element_typed_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf0Node> {
        let (i, class_name) = parse_string(i)?;
        let (i, properties) = self.parse_properties(i)?;

        let node = Amf0Node::TypedObject {
            class_name: class_name.to_string(),
            properties,
        };
        self.tables.amf0_objects.push(node.clone());
        Ok((i, node))
    }

    fn parse_element_reference<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf0Node> {
        let (i, index) = be_u16(i)?;
        let index = index as usize;

        let node = self.tables.amf0_objects.get(index).cloned().ok_or(Err::Error(
            DecodeError::ReferenceOutOfRange {
                table: TableKind::Amf0Objects,
                index,
            },
        ))?;
        Ok((i, node))
    }

    fn parse_element_amf3<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf0Node> {
        let (i, nodes) =
            AMF3Decoder::nested(&mut *self.tables, self.externals, self.depth).parse_all(i)?;
        Ok((i, Amf0Node::Amf3(nodes)))
    }

    /// Parse a single AMF0 value, including its type marker
    pub fn parse_single_element<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf0Node> {
        if self.depth >= MAX_NESTING {
            return fail(DecodeError::NestingTooDeep(MAX_NESTING));
        }

        self.depth += 1;
        let result = self.parse_element(i);
        self.depth -= 1;
        result
    }

    fn parse_element<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf0Node> {
        let (i, marker) = be_u8(i)?;
        let unsupported = DecodeError::UnsupportedType {
            version: AMFVersion::AMF0,
            marker,
        };
        let type_marker =
            TypeMarker::try_from(marker).map_err(|_| Err::Error(unsupported.clone()))?;

        match type_marker {
            TypeMarker::Number => parse_element_number(i),
            TypeMarker::Boolean => parse_element_bool(i),
            TypeMarker::String => map(parse_string, |s: &str| Amf0Node::String(s.to_string()))(i),
            TypeMarker::Object => self.parse_element_object(i),
            TypeMarker::Null => Ok((i, Amf0Node::Null)),
            TypeMarker::Undefined => Ok((i, Amf0Node::Undefined)),
            TypeMarker::Reference => self.parse_element_reference(i),
            TypeMarker::EcmaArray => self.parse_element_ecma_array(i),
            TypeMarker::StrictArray => self.parse_element_strict_array(i),
            TypeMarker::Date => parse_element_date(i),
            TypeMarker::LongString => {
                map(parse_long_string, |s: &str| Amf0Node::String(s.to_string()))(i)
            }
            TypeMarker::TypedObject => self.parse_element_typed_object(i),
            TypeMarker::AMF3 => self.parse_element_amf3(i),
            TypeMarker::ObjectEnd => fail(unsupported),
        }
    }

    /// Parse values until the input is exhausted
    pub fn parse_all<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Vec<Amf0Node>> {
        let mut i = i;
        let mut nodes = Vec::new();
        while !i.is_empty() {
            let (j, node) = self.parse_single_element(i)?;
            nodes.push(node);
            i = j;
        }
        Ok((i, nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_tables::TableScope;
    use crate::types::{Amf3Node, Amf3Object};
    use pretty_assertions::assert_eq;

    fn decode(bytes: &[u8]) -> Result<Vec<Amf0Node>, DecodeError> {
        let mut tables = ReferenceTables::new(TableScope::PerMessage);
        let externals = Externals::new();
        let (_, nodes) = AMF0Decoder::new(&mut tables, &externals).parse_all(bytes)?;
        Ok(nodes)
    }

    #[test]
    fn test_empty() {
        assert_eq!(decode(&[]), Ok(vec![]));
    }

    #[test]
    fn test_command() {
        let mut bytes = vec![0x02, 0x00, 0x07];
        bytes.extend_from_slice(b"_result");
        bytes.push(0x00);
        bytes.extend_from_slice(&1.0f64.to_be_bytes());
        bytes.extend_from_slice(&[0x05, 0x01, 0x01]);

        assert_eq!(
            decode(&bytes),
            Ok(vec![
                Amf0Node::from("_result"),
                Amf0Node::Number(1.0),
                Amf0Node::Null,
                Amf0Node::Boolean(true)
            ])
        );
    }

    #[test]
    fn test_object() {
        let bytes = [0x03, 0x00, 0x01, b'a', 0x05, 0x00, 0x00, 0x09];
        let mut expected = Properties::new();
        expected.insert("a".to_string(), Amf0Node::Null);
        assert_eq!(decode(&bytes), Ok(vec![Amf0Node::Object(expected)]));
    }

    #[test]
    fn test_object_end_must_follow_empty_name() {
        let bytes = [0x03, 0x00, 0x01, b'a', 0x05, 0x00, 0x00, 0x05];
        assert_eq!(decode(&bytes), Err(DecodeError::InvalidObjectEnd(0x05)));
    }

    #[test]
    fn test_unterminated_object() {
        let bytes = [0x03, 0x00, 0x01, b'a', 0x05];
        assert_eq!(decode(&bytes), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn test_typed_object_reference() {
        let bytes = [
            0x10, 0x00, 0x01, b'T', 0x00, 0x01, b'x', 0x06, 0x00, 0x00, 0x09, // T { x: undefined }
            0x07, 0x00, 0x00, // reference 0
        ];
        let mut properties = Properties::new();
        properties.insert("x".to_string(), Amf0Node::Undefined);
        let typed = Amf0Node::TypedObject {
            class_name: "T".to_string(),
            properties,
        };
        assert_eq!(decode(&bytes), Ok(vec![typed.clone(), typed]));
    }

    #[test]
    fn test_ecma_array_values_registered() {
        let bytes = [
            0x08, 0x00, 0x00, 0x00, 0x09, // declared length is ignored
            0x00, 0x01, b'a', 0x01, 0x00, // a: false
            0x00, 0x01, b'b', 0x01, 0x01, // b: true
            0x00, 0x00, 0x09, // end
            0x07, 0x00, 0x01, // reference 1
        ];
        let nodes = decode(&bytes).expect("decode");
        assert_eq!(nodes[1], Amf0Node::Boolean(true));
        assert_eq!(nodes[0].get("a"), Some(&Amf0Node::Boolean(false)));
    }

    #[test]
    fn test_reference_out_of_range() {
        assert_eq!(
            decode(&[0x07, 0x00, 0x00]),
            Err(DecodeError::ReferenceOutOfRange {
                table: TableKind::Amf0Objects,
                index: 0
            })
        );
    }

    #[test]
    fn test_long_string() {
        let bytes = [0x0C, 0x00, 0x00, 0x00, 0x02, b'h', b'i'];
        assert_eq!(decode(&bytes), Ok(vec![Amf0Node::from("hi")]));
    }

    #[test]
    fn test_unsupported_marker() {
        assert_eq!(
            decode(&[0x0D]),
            Err(DecodeError::UnsupportedType {
                version: AMFVersion::AMF0,
                marker: 0x0D
            })
        );
        assert_eq!(
            decode(&[0x09]),
            Err(DecodeError::UnsupportedType {
                version: AMFVersion::AMF0,
                marker: 0x09
            })
        );
    }

    #[test]
    fn test_amf3_switch_consumes_rest() {
        let bytes = [
            0x05, // null
            0x11, 0x0A, 0x0B, 0x01, 0x03, b'a', 0x04, 0x01, 0x01, // {a: 1}
            0x06, 0x00, // "a" by reference
        ];
        assert_eq!(
            decode(&bytes),
            Ok(vec![
                Amf0Node::Null,
                Amf0Node::Amf3(vec![
                    Amf3Node::from(Amf3Object::anonymous().with("a", 1)),
                    Amf3Node::from("a")
                ])
            ])
        );
    }

    #[test]
    fn test_nesting_limit() {
        let mut bytes = Vec::new();
        for _ in 0..200_000 {
            bytes.extend_from_slice(&[0x03, 0x00, 0x01, b'a']);
        }
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::NestingTooDeep(MAX_NESTING))
        );
    }

    #[test]
    fn test_nesting_counts_across_amf3_switch() {
        // Strict arrays of one element down to the switch, then AMF3 arrays
        let mut bytes = Vec::new();
        for _ in 0..MAX_NESTING / 2 {
            bytes.extend_from_slice(&[0x0A, 0x00, 0x00, 0x00, 0x01]);
        }
        bytes.push(0x11);
        for _ in 0..MAX_NESTING / 2 {
            bytes.extend_from_slice(&[0x09, 0x03, 0x01]);
        }
        bytes.push(0x01);
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::NestingTooDeep(MAX_NESTING))
        );
    }
}
