use crate::amf3::external::Externals;
use crate::amf3::length::Length;
use crate::amf3::type_marker::TypeMarker;
use crate::amf3::varint::{read_i29, read_u29};
use crate::errors::DecodeError;
use crate::nom_utils::{fail, take_str, AMFResult, MAX_NESTING};
use crate::reference_tables::{ReferenceTables, TableKind};
use crate::types::{AMFVersion, Amf3Node, Amf3Object, Attribute, ClassDefinition, Properties};
use enumset::EnumSet;
use log::trace;
use nom::bytes::complete::take;
use nom::multi::count;
use nom::number::complete::{be_f64, be_i32, be_u32, be_u8};
use nom::Err;

const REFERENCE_FLAG: u32 = 0x01;

/// Fail early when a count could not possibly be satisfied by the remaining input
fn check_count(i: &[u8], items: usize, min_size: usize) -> Result<(), Err<DecodeError>> {
    if i.len() < items.saturating_mul(min_size) {
        return fail(DecodeError::UnexpectedEof);
    }
    Ok(())
}

/// Handles decoding AMF3
///
/// The decoder borrows the reference tables for the duration of a decode, so that values seen
/// earlier in the message (or the connection, depending on the table scope) can be referenced.
pub struct AMF3Decoder<'t> {
    tables: &'t mut ReferenceTables,
    externals: &'t Externals,
    depth: usize,
}

impl<'t> AMF3Decoder<'t> {
    /// Create a decoder over the given tables and external codecs
    pub fn new(tables: &'t mut ReferenceTables, externals: &'t Externals) -> Self {
        Self::nested(tables, externals, 0)
    }

    /// Create a decoder for values that are already `depth` levels deep
    pub(crate) fn nested(
        tables: &'t mut ReferenceTables,
        externals: &'t Externals,
        depth: usize,
    ) -> Self {
        Self {
            tables,
            externals,
            depth,
        }
    }

    /// Parse a string body, either inline or by reference to the string table
    pub fn parse_string<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, String> {
        let (i, len) = Length::read(i)?;

        match len {
            Length::Size(0) => Ok((i, String::new())),
            Length::Size(len) => {
                let (i, s) = take_str(i, len as usize)?;
                self.tables.strings.push(s.to_string());
                Ok((i, s.to_string()))
            }
            Length::Reference(index) => {
                let s = self.tables.strings.get(index).cloned().ok_or(Err::Error(
                    DecodeError::ReferenceOutOfRange {
                        table: TableKind::Strings,
                        index,
                    },
                ))?;
                Ok((i, s))
            }
        }
    }

    fn parse_class_def<'a>(&mut self, header: u32, i: &'a [u8]) -> AMFResult<'a, ClassDefinition> {
        if header & REFERENCE_FLAG == 0 {
            let index = (header >> 1) as usize;
            let class_def = self.tables.classes.get(index).cloned().ok_or(Err::Error(
                DecodeError::ReferenceOutOfRange {
                    table: TableKind::Classes,
                    index,
                },
            ))?;
            return Ok((i, class_def));
        }
        let traits = header >> 1;

        let mut attributes = EnumSet::empty();
        if traits & 0b01 == 1 {
            attributes |= Attribute::External;
        }
        if (traits >> 1) & 0b01 == 1 {
            attributes |= Attribute::Dynamic;
        }
        let property_count = (traits >> 2) as usize;

        let (mut i, name) = self.parse_string(i)?;
        check_count(i, property_count, 1)?;

        let mut static_properties = Vec::with_capacity(property_count);
        for _ in 0..property_count {
            let (j, property) = self.parse_string(i)?;
            static_properties.push(property);
            i = j;
        }

        let class_def = ClassDefinition {
            name,
            attributes,
            static_properties,
        };
        self.tables.classes.push(class_def.clone());

        Ok((i, class_def))
    }

    fn parse_object_members<'a>(
        &mut self,
        i: &'a [u8],
        class_def: &ClassDefinition,
    ) -> AMFResult<'a, Amf3Object> {
        let mut i = i;
        let mut properties = Properties::new();

        for name in &class_def.static_properties {
            let (j, value) = self.parse_single_element(i)?;
            properties.insert(name.clone(), value);
            i = j;
        }

        if class_def.is_dynamic() {
            loop {
                let (j, name) = self.parse_string(i)?;
                if name.is_empty() {
                    i = j;
                    break;
                }
                let (j, value) = self.parse_single_element(j)?;
                properties.insert(name, value);
                i = j;
            }
        }

        let class_name = if class_def.name.is_empty() {
            None
        } else {
            Some(class_def.name.clone())
        };

        Ok((
            i,
            Amf3Object {
                class_name,
                properties,
                traits: Some(class_def.clone()),
                byte_ids: Vec::new(),
            },
        ))
    }

    fn parse_element_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        let (i, header) = read_u29(i)?;

        if header & REFERENCE_FLAG == 0 {
            return Ok((i, self.object_reference((header >> 1) as usize)?));
        }

        let (i, class_def) = self.parse_class_def(header >> 1, i)?;

        let (i, object) = if class_def.is_external() {
            let externals = self.externals;
            let codec = externals.get(&class_def.name).ok_or_else(|| {
                Err::Error(DecodeError::UnknownExternal(class_def.name.clone()))
            })?;
            trace!("Decoding external class {}", class_def.name);
            codec.decode(i, &class_def.name, self)?
        } else {
            self.parse_object_members(i, &class_def)?
        };

        let node = Amf3Node::Object(object);
        self.tables.amf3_objects.push(node.clone());
        Ok((i, node))
    }

    fn object_reference(&self, index: usize) -> Result<Amf3Node, Err<DecodeError>> {
        self.tables
            .amf3_objects
            .get(index)
            .cloned()
            .ok_or(Err::Error(DecodeError::ReferenceOutOfRange {
                table: TableKind::Amf3Objects,
                index,
            }))
    }

    /// Parse the header of a reference-eligible value, either resolving the reference or
    /// running `parser` on the inline body and adding the result to the object table
    fn parse_reference_or_val<'a>(
        &mut self,
        i: &'a [u8],
        parser: impl FnOnce(&mut Self, &'a [u8], usize) -> AMFResult<'a, Amf3Node>,
    ) -> AMFResult<'a, Amf3Node> {
        let (i, length) = Length::read(i)?;

        match length {
            Length::Reference(index) => Ok((i, self.object_reference(index)?)),
            Length::Size(size) => {
                let (i, node) = parser(self, i, size as usize)?;
                self.tables.amf3_objects.push(node.clone());
                Ok((i, node))
            }
        }
    }

    fn parse_element_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        self.parse_reference_or_val(i, |this, i, size| {
            let (mut i, key) = this.parse_string(i)?;
            if !key.is_empty() {
                return fail(DecodeError::AssociativeArray);
            }
            check_count(i, size, 1)?;

            let mut items = Vec::with_capacity(size);
            for _ in 0..size {
                let (j, item) = this.parse_single_element(i)?;
                items.push(item);
                i = j;
            }
            Ok((i, Amf3Node::Array(items)))
        })
    }

    fn parse_element_byte_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        self.parse_reference_or_val(i, |_, i, size| {
            let (i, bytes) = take(size)(i)?;
            Ok((i, Amf3Node::ByteArray(bytes.to_vec())))
        })
    }

    fn parse_element_date<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        self.parse_reference_or_val(i, |_, i, _| {
            let (i, millis) = be_f64(i)?;
            Ok((i, Amf3Node::Date(millis)))
        })
    }

    fn parse_element_xml<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        self.parse_reference_or_val(i, |_, i, size| {
            let (i, s) = take_str(i, size)?;
            Ok((i, Amf3Node::XmlDocument(s.to_string())))
        })
    }

    fn parse_element_vector_int<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        self.parse_reference_or_val(i, |_, i, size| {
            let (i, fixed_length) = be_u8(i)?;
            check_count(i, size, 4)?;
            let (i, items) = count(be_i32, size)(i)?;
            Ok((
                i,
                Amf3Node::VectorInt {
                    items,
                    fixed_length: fixed_length == 1,
                },
            ))
        })
    }

    fn parse_element_vector_uint<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        self.parse_reference_or_val(i, |_, i, size| {
            let (i, fixed_length) = be_u8(i)?;
            check_count(i, size, 4)?;
            let (i, items) = count(be_u32, size)(i)?;
            Ok((
                i,
                Amf3Node::VectorUint {
                    items,
                    fixed_length: fixed_length == 1,
                },
            ))
        })
    }

    fn parse_element_vector_double<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        self.parse_reference_or_val(i, |_, i, size| {
            let (i, fixed_length) = be_u8(i)?;
            check_count(i, size, 8)?;
            let (i, items) = count(be_f64, size)(i)?;
            Ok((
                i,
                Amf3Node::VectorDouble {
                    items,
                    fixed_length: fixed_length == 1,
                },
            ))
        })
    }

    fn parse_element_vector_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        self.parse_reference_or_val(i, |this, i, size| {
            let (i, fixed_length) = be_u8(i)?;
            let (mut i, type_name) = this.parse_string(i)?;
            check_count(i, size, 1)?;

            let mut items = Vec::with_capacity(size);
            for _ in 0..size {
                let (j, item) = this.parse_single_element(i)?;
                items.push(item);
                i = j;
            }

            Ok((
                i,
                Amf3Node::VectorObject {
                    type_name,
                    items,
                    fixed_length: fixed_length == 1,
                },
            ))
        })
    }

    /// Parse a single AMF3 value, including its type marker
    pub fn parse_single_element<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        if self.depth >= MAX_NESTING {
            return fail(DecodeError::NestingTooDeep(MAX_NESTING));
        }

        self.depth += 1;
        let result = self.parse_element(i);
        self.depth -= 1;
        result
    }

    fn parse_element<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Amf3Node> {
        let (i, marker) = be_u8(i)?;
        let unsupported = DecodeError::UnsupportedType {
            version: AMFVersion::AMF3,
            marker,
        };
        let type_marker =
            TypeMarker::try_from(marker).map_err(|_| Err::Error(unsupported.clone()))?;

        match type_marker {
            TypeMarker::Undefined => Ok((i, Amf3Node::Undefined)),
            TypeMarker::Null => Ok((i, Amf3Node::Null)),
            TypeMarker::False => Ok((i, Amf3Node::False)),
            TypeMarker::True => Ok((i, Amf3Node::True)),
            TypeMarker::Integer => {
                let (i, n) = read_i29(i)?;
                Ok((i, Amf3Node::Integer(n)))
            }
            TypeMarker::Double => {
                let (i, n) = be_f64(i)?;
                Ok((i, Amf3Node::Double(n)))
            }
            TypeMarker::String => {
                let (i, s) = self.parse_string(i)?;
                Ok((i, Amf3Node::String(s)))
            }
            TypeMarker::XmlDocument => self.parse_element_xml(i),
            TypeMarker::Date => self.parse_element_date(i),
            TypeMarker::Array => self.parse_element_array(i),
            TypeMarker::Object => self.parse_element_object(i),
            TypeMarker::ByteArray => self.parse_element_byte_array(i),
            TypeMarker::VectorInt => self.parse_element_vector_int(i),
            TypeMarker::VectorUint => self.parse_element_vector_uint(i),
            TypeMarker::VectorDouble => self.parse_element_vector_double(i),
            TypeMarker::VectorObject => self.parse_element_vector_object(i),
            // Dictionary bodies are not decoded
            TypeMarker::Dictionary => fail(unsupported),
        }
    }

    /// Parse values until the input is exhausted
    pub fn parse_all<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Vec<Amf3Node>> {
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
    use pretty_assertions::assert_eq;

    fn decode(bytes: &[u8]) -> Result<Vec<Amf3Node>, DecodeError> {
        let mut tables = ReferenceTables::new(TableScope::PerMessage);
        let externals = Externals::new();
        let (_, nodes) = AMF3Decoder::new(&mut tables, &externals).parse_all(bytes)?;
        Ok(nodes)
    }

    #[test]
    fn test_string_back_reference() {
        // "ab", then a reference to string 0
        let bytes = [0x06, 0x05, b'a', b'b', 0x06, 0x00];
        assert_eq!(
            decode(&bytes),
            Ok(vec![Amf3Node::from("ab"), Amf3Node::from("ab")])
        );
    }

    #[test]
    fn test_empty_string_not_interned() {
        // "", "x", reference 0 must be "x"
        let bytes = [0x06, 0x01, 0x06, 0x03, b'x', 0x06, 0x00];
        assert_eq!(
            decode(&bytes),
            Ok(vec![
                Amf3Node::from(""),
                Amf3Node::from("x"),
                Amf3Node::from("x")
            ])
        );
    }

    #[test]
    fn test_string_reference_out_of_range() {
        assert_eq!(
            decode(&[0x06, 0x02]),
            Err(DecodeError::ReferenceOutOfRange {
                table: TableKind::Strings,
                index: 1
            })
        );
    }

    #[test]
    fn test_associative_array_rejected() {
        // Array of 0 dense items with associative key "k"
        let bytes = [0x09, 0x01, 0x03, b'k', 0x04, 0x01, 0x01];
        assert_eq!(decode(&bytes), Err(DecodeError::AssociativeArray));
    }

    #[test]
    fn test_dense_array_and_reference() {
        // [1, 2] then a reference to object 0
        let bytes = [0x09, 0x05, 0x01, 0x04, 0x01, 0x04, 0x02, 0x09, 0x00];
        let array = Amf3Node::Array(vec![Amf3Node::Integer(1), Amf3Node::Integer(2)]);
        assert_eq!(decode(&bytes), Ok(vec![array.clone(), array]));
    }

    #[test]
    fn test_anonymous_object() {
        // Inline traits, dynamic, 0 sealed, name "", then a=1, end
        let bytes = [0x0A, 0x0B, 0x01, 0x03, b'a', 0x04, 0x01, 0x01];
        assert_eq!(
            decode(&bytes),
            Ok(vec![Amf3Node::from(Amf3Object::anonymous().with("a", 1))])
        );
    }

    #[test]
    fn test_typed_object_trait_reference() {
        // Two objects of class "C" with sealed property "x", the second by trait reference
        let bytes = [
            0x0A, 0x13, 0x03, b'C', 0x03, b'x', 0x04, 0x01, // first
            0x0A, 0x01, 0x04, 0x02, // second, trait reference 0
        ];
        assert_eq!(
            decode(&bytes),
            Ok(vec![
                Amf3Node::from(Amf3Object::typed("C").with("x", 1)),
                Amf3Node::from(Amf3Object::typed("C").with("x", 2)),
            ])
        );
    }

    #[test]
    fn test_unknown_external() {
        // External trait for class "E"
        let bytes = [0x0A, 0x07, 0x03, b'E'];
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::UnknownExternal("E".to_string()))
        );
    }

    #[test]
    fn test_unsupported_marker() {
        assert_eq!(
            decode(&[0x0B, 0x01]),
            Err(DecodeError::UnsupportedType {
                version: AMFVersion::AMF3,
                marker: 0x0B
            })
        );
    }

    #[test]
    fn test_vector_int() {
        let bytes = [0x0D, 0x03, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(
            decode(&bytes),
            Ok(vec![Amf3Node::VectorInt {
                items: vec![-1],
                fixed_length: false
            }])
        );
    }

    #[test]
    fn test_dictionary_unsupported() {
        let bytes = [0x11, 0x03, 0x00, 0x04, 0x01, 0x03];
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::UnsupportedType {
                version: AMFVersion::AMF3,
                marker: 0x11
            })
        );
    }

    #[test]
    fn test_typed_dynamic_object_keeps_traits() {
        // Class "C", dynamic, sealed [x], then dynamic y
        let bytes = [
            0x0A, 0x1B, 0x03, b'C', 0x03, b'x', 0x04, 0x01, 0x03, b'y', 0x04, 0x02, 0x01,
        ];
        let nodes = decode(&bytes).unwrap();
        assert_eq!(
            nodes,
            vec![Amf3Node::from(Amf3Object::typed("C").with("x", 1).with("y", 2))]
        );

        let traits = nodes[0].as_object().and_then(|object| object.traits.clone());
        let mut expected = ClassDefinition::sealed("C", vec!["x".to_string()]);
        expected.attributes |= Attribute::Dynamic;
        assert_eq!(traits, Some(expected));
    }

    #[test]
    fn test_nesting_limit() {
        let mut bytes = Vec::new();
        for _ in 0..200_000 {
            bytes.extend_from_slice(&[0x09, 0x03, 0x01]);
        }
        bytes.push(0x01);
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::NestingTooDeep(MAX_NESTING))
        );

        let mut bytes = Vec::new();
        for _ in 0..MAX_NESTING - 1 {
            bytes.extend_from_slice(&[0x09, 0x03, 0x01]);
        }
        bytes.push(0x01);
        assert!(decode(&bytes).is_ok());
    }

    #[test]
    fn test_oversized_count_fails_without_allocating() {
        let bytes = [0x09, 0xBF, 0xFF, 0xFF, 0xFF, 0x01];
        assert_eq!(decode(&bytes), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(
            decode(&[0x05, 0x00, 0x00]),
            Err(DecodeError::UnexpectedEof)
        );
    }
}
