//! Support for encoding AMF0
use crate::amf0::type_marker::TypeMarker;
use crate::amf3::write::AMF3Encoder;
use crate::amf3::Externals;
use crate::errors::EncodeError;
use crate::nom_utils::write_string;
use crate::reference_tables::ReferenceTables;
use crate::types::{Amf0Node, Properties};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

type Result<T> = std::result::Result<T, EncodeError>;

fn write_type_marker<W: Write>(writer: &mut W, marker: TypeMarker) -> Result<()> {
    writer.write_u8(marker as u8)?;
    Ok(())
}

fn write_string_element<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    if s.len() > usize::from(u16::MAX) {
        let length = u32::try_from(s.len()).map_err(|_| EncodeError::TooLarge(s.len()))?;
        write_type_marker(writer, TypeMarker::LongString)?;
        writer.write_u32::<BigEndian>(length)?;
        writer.write_all(s.as_bytes())?;
    } else {
        write_type_marker(writer, TypeMarker::String)?;
        write_string(writer, s)?;
    }
    Ok(())
}

/// Handles encoding AMF0
///
/// Registers values in the same tables and order as [`AMF0Decoder`](crate::amf0::AMF0Decoder).
pub struct AMF0Encoder<'t> {
    tables: &'t mut ReferenceTables,
    externals: &'t Externals,
}

impl<'t> AMF0Encoder<'t> {
    /// Create an encoder over the given tables and external codecs
    pub fn new(tables: &'t mut ReferenceTables, externals: &'t Externals) -> Self {
        Self { tables, externals }
    }

    fn write_properties<W: Write>(
        &mut self,
        writer: &mut W,
        properties: &Properties<Amf0Node>,
    ) -> Result<()> {
        for (name, value) in properties {
            write_string(writer, name)?;
            self.write_value(writer, value)?;
        }
        writer.write_u16::<BigEndian>(0)?;
        write_type_marker(writer, TypeMarker::ObjectEnd)?;
        Ok(())
    }

    /// Write a single AMF0 value including its type marker
    pub fn write_value<W: Write>(&mut self, writer: &mut W, node: &Amf0Node) -> Result<()> {
        match node {
            Amf0Node::Number(n) => {
                write_type_marker(writer, TypeMarker::Number)?;
                writer.write_f64::<BigEndian>(*n)?;
            }
            Amf0Node::Boolean(b) => {
                write_type_marker(writer, TypeMarker::Boolean)?;
                writer.write_u8(u8::from(*b))?;
            }
            Amf0Node::String(s) => write_string_element(writer, s)?,
            Amf0Node::Object(properties) => {
                write_type_marker(writer, TypeMarker::Object)?;
                self.write_properties(writer, properties)?;
            }
            Amf0Node::Null => write_type_marker(writer, TypeMarker::Null)?,
            Amf0Node::Undefined => write_type_marker(writer, TypeMarker::Undefined)?,
            Amf0Node::EcmaArray(properties) => {
                let length = u32::try_from(properties.len())
                    .map_err(|_| EncodeError::TooLarge(properties.len()))?;
                write_type_marker(writer, TypeMarker::EcmaArray)?;
                writer.write_u32::<BigEndian>(length)?;
                self.write_properties(writer, properties)?;
                for value in properties.values() {
                    self.tables.amf0_objects.push(value.clone());
                }
            }
            Amf0Node::StrictArray(items) => {
                let length =
                    u32::try_from(items.len()).map_err(|_| EncodeError::TooLarge(items.len()))?;
                write_type_marker(writer, TypeMarker::StrictArray)?;
                writer.write_u32::<BigEndian>(length)?;
                for item in items {
                    self.write_value(writer, item)?;
                }
            }
            Amf0Node::Date { millis, timezone } => {
                write_type_marker(writer, TypeMarker::Date)?;
                writer.write_f64::<BigEndian>(*millis)?;
                writer.write_i16::<BigEndian>(*timezone)?;
            }
            Amf0Node::TypedObject {
                class_name,
                properties,
            } => {
                write_type_marker(writer, TypeMarker::TypedObject)?;
                write_string(writer, class_name)?;
                self.write_properties(writer, properties)?;
                self.tables.amf0_objects.push(node.clone());
            }
            Amf0Node::Reference(index) => {
                write_type_marker(writer, TypeMarker::Reference)?;
                writer.write_u16::<BigEndian>(*index)?;
            }
            Amf0Node::Amf3(nodes) => {
                write_type_marker(writer, TypeMarker::AMF3)?;
                AMF3Encoder::new(&mut *self.tables, self.externals).write_all(writer, nodes)?;
            }
        }
        Ok(())
    }

    /// Write a sequence of values back to back
    pub fn write_all<W: Write>(&mut self, writer: &mut W, nodes: &[Amf0Node]) -> Result<()> {
        for node in nodes {
            self.write_value(writer, node)?;
        }
        Ok(())
    }
}
