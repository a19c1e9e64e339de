//! Handles encoding AMF3
use crate::amf3::external::Externals;
use crate::amf3::length::Length;
use crate::amf3::type_marker::TypeMarker;
use crate::amf3::varint::{fits_i29, write_i29, write_u29};
use crate::errors::EncodeError;
use crate::reference_tables::ReferenceTables;
use crate::types::{Amf3Node, Amf3Object, ClassDefinition};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

type Result<T> = std::result::Result<T, EncodeError>;

/// Handles encoding AMF3
///
/// Repeated non-empty strings are written as references and traits are reused by reference.
/// Complex values are always written inline but are still added to the object table, so the
/// indices stay aligned with what the peer's decoder assigns.
pub struct AMF3Encoder<'t> {
    tables: &'t mut ReferenceTables,
    externals: &'t Externals,
}

impl<'t> AMF3Encoder<'t> {
    /// Create an encoder over the given tables and external codecs
    pub fn new(tables: &'t mut ReferenceTables, externals: &'t Externals) -> Self {
        Self { tables, externals }
    }

    fn write_type_marker<W: Write>(&self, writer: &mut W, marker: TypeMarker) -> Result<()> {
        writer.write_u8(marker as u8)?;
        Ok(())
    }

    /// Write a string body, as a reference if the same string was written before
    pub fn write_string<W: Write>(&mut self, writer: &mut W, s: &str) -> Result<()> {
        if s.is_empty() {
            return Length::Size(0).write(writer);
        }

        if let Some(index) = self.tables.strings.position_str(s) {
            return Length::Reference(index).write(writer);
        }

        Length::size(s.len())?.write(writer)?;
        self.tables.strings.push(s.to_string());
        writer.write_all(s.as_bytes())?;
        Ok(())
    }

    fn write_integer_element<W: Write>(&self, writer: &mut W, i: i32) -> Result<()> {
        if fits_i29(i) {
            self.write_type_marker(writer, TypeMarker::Integer)?;
            write_i29(writer, i)?;
        } else {
            self.write_double_element(writer, f64::from(i))?;
        }
        Ok(())
    }

    fn write_double_element<W: Write>(&self, writer: &mut W, n: f64) -> Result<()> {
        self.write_type_marker(writer, TypeMarker::Double)?;
        writer.write_f64::<BigEndian>(n)?;
        Ok(())
    }

    fn write_traits<W: Write>(&mut self, writer: &mut W, class_def: &ClassDefinition) -> Result<()> {
        if let Some(index) = self.tables.classes.position(class_def) {
            // Object inline, traits by reference
            let header = (index as u32) << 2 | 0b01;
            write_u29(writer, header)?;
            return Ok(());
        }

        let count = class_def.static_properties.len();
        if count > 0x01FF_FFFF {
            return Err(EncodeError::TooLarge(count));
        }
        self.tables.classes.push(class_def.clone());

        let header = (count as u32) << 4 | class_def.encoding() << 2 | 0b11;
        write_u29(writer, header)?;
        self.write_string(writer, &class_def.name)?;
        for name in &class_def.static_properties {
            self.write_string(writer, name)?;
        }
        Ok(())
    }

    fn write_object_element<W: Write>(&mut self, writer: &mut W, object: &Amf3Object) -> Result<()> {
        self.write_type_marker(writer, TypeMarker::Object)?;

        let externals = self.externals;
        let external = object
            .class_name
            .as_deref()
            .and_then(|name| externals.get(name).map(|codec| (name, codec)));

        if let Some((name, codec)) = external {
            self.write_traits(writer, &ClassDefinition::external(name))?;
            let body = codec.encode(object, name, self)?;
            writer.write_all(&body)?;
        } else {
            let class_def = traits_for(object);
            self.write_traits(writer, &class_def)?;
            for name in &class_def.static_properties {
                if let Some(value) = object.properties.get(name) {
                    self.write_value(writer, value)?;
                }
            }
            if class_def.is_dynamic() {
                for (name, value) in &object.properties {
                    if class_def.static_properties.contains(name) {
                        continue;
                    }
                    self.write_string(writer, name)?;
                    self.write_value(writer, value)?;
                }
                self.write_string(writer, "")?;
            }
        }

        self.tables
            .amf3_objects
            .push(Amf3Node::Object(object.clone()));
        Ok(())
    }

    fn write_array_element<W: Write>(&mut self, writer: &mut W, items: &[Amf3Node]) -> Result<()> {
        self.write_type_marker(writer, TypeMarker::Array)?;
        Length::size(items.len())?.write(writer)?;
        // No associative part
        self.write_string(writer, "")?;
        for item in items {
            self.write_value(writer, item)?;
        }
        Ok(())
    }

    fn write_vector_header<W: Write>(
        &self,
        writer: &mut W,
        marker: TypeMarker,
        len: usize,
        fixed_length: bool,
    ) -> Result<()> {
        self.write_type_marker(writer, marker)?;
        Length::size(len)?.write(writer)?;
        writer.write_u8(u8::from(fixed_length))?;
        Ok(())
    }

    /// Write a single AMF3 value including its type marker
    pub fn write_value<W: Write>(&mut self, writer: &mut W, node: &Amf3Node) -> Result<()> {
        match node {
            Amf3Node::Undefined => self.write_type_marker(writer, TypeMarker::Undefined)?,
            Amf3Node::Null => self.write_type_marker(writer, TypeMarker::Null)?,
            Amf3Node::False => self.write_type_marker(writer, TypeMarker::False)?,
            Amf3Node::True => self.write_type_marker(writer, TypeMarker::True)?,
            Amf3Node::Integer(i) => self.write_integer_element(writer, *i)?,
            Amf3Node::Double(n) => self.write_double_element(writer, *n)?,
            Amf3Node::String(s) => {
                self.write_type_marker(writer, TypeMarker::String)?;
                self.write_string(writer, s)?;
            }
            Amf3Node::XmlDocument(s) => {
                self.write_type_marker(writer, TypeMarker::XmlDocument)?;
                Length::size(s.len())?.write(writer)?;
                writer.write_all(s.as_bytes())?;
            }
            Amf3Node::Date(millis) => {
                self.write_type_marker(writer, TypeMarker::Date)?;
                Length::Size(0).write(writer)?;
                writer.write_f64::<BigEndian>(*millis)?;
            }
            Amf3Node::Array(items) => self.write_array_element(writer, items)?,
            Amf3Node::Object(object) => {
                // Registers itself, the body may contain nested objects that come first
                return self.write_object_element(writer, object);
            }
            Amf3Node::ByteArray(bytes) => {
                self.write_type_marker(writer, TypeMarker::ByteArray)?;
                Length::size(bytes.len())?.write(writer)?;
                writer.write_all(bytes)?;
            }
            Amf3Node::VectorInt {
                items,
                fixed_length,
            } => {
                self.write_vector_header(writer, TypeMarker::VectorInt, items.len(), *fixed_length)?;
                for item in items {
                    writer.write_i32::<BigEndian>(*item)?;
                }
            }
            Amf3Node::VectorUint {
                items,
                fixed_length,
            } => {
                self.write_vector_header(writer, TypeMarker::VectorUint, items.len(), *fixed_length)?;
                for item in items {
                    writer.write_u32::<BigEndian>(*item)?;
                }
            }
            Amf3Node::VectorDouble {
                items,
                fixed_length,
            } => {
                self.write_vector_header(
                    writer,
                    TypeMarker::VectorDouble,
                    items.len(),
                    *fixed_length,
                )?;
                for item in items {
                    writer.write_f64::<BigEndian>(*item)?;
                }
            }
            Amf3Node::VectorObject {
                type_name,
                items,
                fixed_length,
            } => {
                self.write_vector_header(
                    writer,
                    TypeMarker::VectorObject,
                    items.len(),
                    *fixed_length,
                )?;
                self.write_string(writer, type_name)?;
                for item in items {
                    self.write_value(writer, item)?;
                }
            }
        }

        if is_complex(node) {
            self.tables.amf3_objects.push(node.clone());
        }
        Ok(())
    }

    /// Write a sequence of values back to back
    pub fn write_all<W: Write>(&mut self, writer: &mut W, nodes: &[Amf3Node]) -> Result<()> {
        for node in nodes {
            self.write_value(writer, node)?;
        }
        Ok(())
    }
}

/// The traits an object is written with
///
/// Decoded objects keep their own traits while those still fit. Otherwise named objects are
/// written as sealed and anonymous ones as dynamic.
fn traits_for(object: &Amf3Object) -> ClassDefinition {
    match (&object.traits, &object.class_name) {
        (Some(traits), _) if traits.describes(object) => traits.clone(),
        (_, Some(name)) => {
            ClassDefinition::sealed(name.clone(), object.properties.keys().cloned().collect())
        }
        (_, None) => ClassDefinition::anonymous(),
    }
}

/// Whether values of this kind take a slot in the object table
fn is_complex(node: &Amf3Node) -> bool {
    !matches!(
        node,
        Amf3Node::Undefined
            | Amf3Node::Null
            | Amf3Node::False
            | Amf3Node::True
            | Amf3Node::Integer(_)
            | Amf3Node::Double(_)
            | Amf3Node::String(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf3::read::AMF3Decoder;
    use crate::reference_tables::TableScope;
    use pretty_assertions::assert_eq;

    fn encode(nodes: &[Amf3Node]) -> Vec<u8> {
        let mut tables = ReferenceTables::new(TableScope::PerMessage);
        let externals = Externals::new();
        let mut out = Vec::new();
        AMF3Encoder::new(&mut tables, &externals)
            .write_all(&mut out, nodes)
            .expect("encode");
        out
    }

    fn decode(bytes: &[u8]) -> Vec<Amf3Node> {
        let mut tables = ReferenceTables::new(TableScope::PerMessage);
        let externals = Externals::new();
        AMF3Decoder::new(&mut tables, &externals)
            .parse_all(bytes)
            .expect("decode")
            .1
    }

    #[test]
    fn test_repeated_string_written_as_reference() {
        let bytes = encode(&[Amf3Node::from("ab"), Amf3Node::from("ab")]);
        assert_eq!(bytes, vec![0x06, 0x05, b'a', b'b', 0x06, 0x00]);
    }

    #[test]
    fn test_empty_string_never_referenced() {
        let bytes = encode(&[Amf3Node::from(""), Amf3Node::from("")]);
        assert_eq!(bytes, vec![0x06, 0x01, 0x06, 0x01]);
    }

    #[test]
    fn test_traits_reused() {
        let nodes = vec![
            Amf3Node::from(Amf3Object::typed("C").with("x", 1)),
            Amf3Node::from(Amf3Object::typed("C").with("x", 2)),
        ];
        let bytes = encode(&nodes);
        assert_eq!(
            bytes,
            vec![0x0A, 0x13, 0x03, b'C', 0x03, b'x', 0x04, 0x01, 0x0A, 0x01, 0x04, 0x02]
        );
        assert_eq!(decode(&bytes), nodes);
    }

    #[test]
    fn test_anonymous_object() {
        let bytes = encode(&[Amf3Node::from(Amf3Object::anonymous().with("a", 1))]);
        assert_eq!(bytes, vec![0x0A, 0x0B, 0x01, 0x03, b'a', 0x04, 0x01, 0x01]);
    }

    #[test]
    fn test_decoded_traits_written_back() {
        // Class "C", dynamic, sealed [x], then dynamic y
        let bytes = [
            0x0A, 0x1B, 0x03, b'C', 0x03, b'x', 0x04, 0x01, 0x03, b'y', 0x04, 0x02, 0x01,
        ];
        assert_eq!(encode(&decode(&bytes)), bytes);
    }

    #[test]
    fn test_sealed_values_follow_trait_order() {
        // Anonymous traits with one sealed property
        let bytes = [0x0A, 0x1B, 0x01, 0x03, b'x', 0x04, 0x01, 0x01];
        let mut nodes = decode(&bytes);
        assert_eq!(encode(&nodes), bytes);

        // Moving the sealed value in the map does not change where it is written
        if let Some(object) = nodes[0].as_object_mut() {
            object.properties.insert("z".to_string(), Amf3Node::Null);
            object.properties.move_index(0, 1);
        }
        assert_eq!(
            encode(&nodes),
            vec![0x0A, 0x1B, 0x01, 0x03, b'x', 0x04, 0x01, 0x03, b'z', 0x01, 0x01]
        );
    }

    #[test]
    fn test_stale_traits_fall_back() {
        // Class "C" with sealed x, then a property the traits cannot hold is added
        let bytes = [0x0A, 0x13, 0x03, b'C', 0x03, b'x', 0x04, 0x01];
        let mut nodes = decode(&bytes);
        nodes[0].set("y", 2);
        assert_eq!(
            encode(&nodes),
            vec![0x0A, 0x23, 0x03, b'C', 0x03, b'x', 0x03, b'y', 0x04, 0x01, 0x04, 0x02]
        );
    }

    #[test]
    fn test_integer_out_of_range_becomes_double() {
        let bytes = encode(&[Amf3Node::Integer(0x1000_0000)]);
        assert_eq!(decode(&bytes), vec![Amf3Node::Double(268435456.0)]);
    }

    #[test]
    fn test_round_trip_all_variants() {
        let nodes = vec![
            Amf3Node::Undefined,
            Amf3Node::Null,
            Amf3Node::False,
            Amf3Node::True,
            Amf3Node::Integer(-5),
            Amf3Node::Double(1.5),
            Amf3Node::from("text"),
            Amf3Node::XmlDocument("<a/>".to_string()),
            Amf3Node::Date(1_600_000_000_000.0),
            Amf3Node::Array(vec![Amf3Node::from("text"), Amf3Node::Integer(3)]),
            Amf3Node::from(
                Amf3Object::anonymous()
                    .with("nested", Amf3Object::typed("a.B").with("text", "text"))
                    .with("list", vec![Amf3Node::Null]),
            ),
            Amf3Node::ByteArray(vec![1, 2, 3]),
            Amf3Node::VectorInt {
                items: vec![1, -1],
                fixed_length: true,
            },
            Amf3Node::VectorUint {
                items: vec![u32::MAX],
                fixed_length: false,
            },
            Amf3Node::VectorDouble {
                items: vec![0.25],
                fixed_length: false,
            },
            Amf3Node::VectorObject {
                type_name: "a.B".to_string(),
                items: vec![Amf3Node::from(Amf3Object::typed("a.B"))],
                fixed_length: false,
            },
        ];

        assert_eq!(decode(&encode(&nodes)), nodes);
    }

    #[test]
    fn test_tables_line_up() {
        let nodes = vec![
            Amf3Node::from(Amf3Object::anonymous().with("a", vec![Amf3Node::Integer(1)])),
            Amf3Node::Date(0.0),
        ];
        let externals = Externals::new();

        let mut encode_tables = ReferenceTables::new(TableScope::PerMessage);
        let mut bytes = Vec::new();
        AMF3Encoder::new(&mut encode_tables, &externals)
            .write_all(&mut bytes, &nodes)
            .expect("encode");

        let mut decode_tables = ReferenceTables::new(TableScope::PerMessage);
        AMF3Decoder::new(&mut decode_tables, &externals)
            .parse_all(&bytes)
            .expect("decode");

        assert_eq!(encode_tables.amf3_objects.len(), 3);
        assert_eq!(decode_tables.amf3_objects.len(), 3);
        for index in 0..3 {
            assert_eq!(
                encode_tables.amf3_objects.get(index),
                decode_tables.amf3_objects.get(index)
            );
        }
        assert_eq!(encode_tables.strings.len(), decode_tables.strings.len());
    }
}
