//! Flex async and acknowledge message headers
use super::{
    format_uuid, parse_flags, parse_uuid, skip_unknown_fields, CLIENT_ID_BYTES_FLAG,
    CORRELATION_ID_BYTES_FLAG, CORRELATION_ID_FLAG, MESSAGE_ID_BYTES_FLAG, NEXT_FLAG,
};
use crate::amf3::read::AMF3Decoder;
use crate::amf3::write::AMF3Encoder;
use crate::amf3::ExternalCodec;
use crate::errors::EncodeError;
use crate::nom_utils::AMFResult;
use crate::types::{Amf3Node, Amf3Object};
use byteorder::WriteBytesExt;

/// Fields of the first flag group, in bit order
const ABSTRACT_FIELDS: [&str; 7] = [
    "body",
    "clientId",
    "destination",
    "headers",
    "messageId",
    "timeStamp",
    "timeToLive",
];

const CLIENT_ID: &str = "clientId";
const MESSAGE_ID: &str = "messageId";
const CORRELATION_ID: &str = "correlationId";

/// Codec for the `DSA` and `DSK` message headers
///
/// Both carry the abstract message fields followed by the correlation id. The acknowledge form
/// has one more flag sequence whose fields are all unknown and discarded.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    acknowledge: bool,
}

impl MessageCodec {
    /// The codec for `DSA`
    pub fn async_message() -> Self {
        Self { acknowledge: false }
    }

    /// The codec for `DSK`
    pub fn acknowledge() -> Self {
        Self { acknowledge: true }
    }
}

/// Read a value that may hold id bytes into `name`
///
/// Byte arrays are turned into their string form and the property is marked so it is written
/// back as bytes.
fn parse_id<'a>(
    i: &'a [u8],
    decoder: &mut AMF3Decoder<'_>,
    object: &mut Amf3Object,
    name: &str,
) -> AMFResult<'a, ()> {
    let (i, value) = decoder.parse_single_element(i)?;
    let value = match value {
        Amf3Node::ByteArray(bytes) => {
            object.byte_ids.push(name.to_string());
            Amf3Node::String(format_uuid(&bytes))
        }
        other => other,
    };
    object.properties.insert(name.to_string(), value);
    Ok((i, ()))
}

fn parse_abstract_message<'a>(
    i: &'a [u8],
    decoder: &mut AMF3Decoder<'_>,
    object: &mut Amf3Object,
) -> AMFResult<'a, ()> {
    let (mut k, flags) = parse_flags(i)?;

    for (pos, flag) in flags.iter().enumerate() {
        let mut reserved = 0;

        if pos == 0 {
            for (bit, name) in ABSTRACT_FIELDS.iter().enumerate() {
                if flag & (1 << bit) != 0 {
                    let (j, value) = decoder.parse_single_element(k)?;
                    object.properties.insert(name.to_string(), value);
                    k = j;
                }
            }
            reserved = 7;
        } else if pos == 1 {
            if flag & CLIENT_ID_BYTES_FLAG != 0 {
                let (j, _) = parse_id(k, decoder, object, CLIENT_ID)?;
                k = j;
            }
            if flag & MESSAGE_ID_BYTES_FLAG != 0 {
                let (j, _) = parse_id(k, decoder, object, MESSAGE_ID)?;
                k = j;
            }
            reserved = 2;
        }

        let (j, _) = skip_unknown_fields(k, decoder, *flag, reserved)?;
        k = j;
    }

    Ok((k, ()))
}

fn parse_async_message<'a>(
    i: &'a [u8],
    decoder: &mut AMF3Decoder<'_>,
    object: &mut Amf3Object,
) -> AMFResult<'a, ()> {
    let (mut k, flags) = parse_flags(i)?;

    for (pos, flag) in flags.iter().enumerate() {
        let mut reserved = 0;
        if pos == 0 {
            if flag & CORRELATION_ID_FLAG != 0 {
                let (j, value) = decoder.parse_single_element(k)?;
                object.properties.insert(CORRELATION_ID.to_string(), value);
                k = j;
            }
            if flag & CORRELATION_ID_BYTES_FLAG != 0 {
                let (j, _) = parse_id(k, decoder, object, CORRELATION_ID)?;
                k = j;
            }
            reserved = 2;
        }

        let (j, _) = skip_unknown_fields(k, decoder, *flag, reserved)?;
        k = j;
    }

    Ok((k, ()))
}

fn parse_acknowledge_message<'a>(i: &'a [u8], decoder: &mut AMF3Decoder<'_>) -> AMFResult<'a, ()> {
    let (mut k, flags) = parse_flags(i)?;

    for flag in flags {
        let (j, _) = skip_unknown_fields(k, decoder, flag, 0)?;
        k = j;
    }

    Ok((k, ()))
}

/// The id bytes for a property that was read in the bytes form and still holds an id
fn id_bytes(object: &Amf3Object, name: &str, value: &Amf3Node) -> Option<Vec<u8>> {
    if !object.byte_ids.iter().any(|id| id == name) {
        return None;
    }
    value.as_str().and_then(parse_uuid)
}

impl ExternalCodec for MessageCodec {
    fn decode<'a>(
        &self,
        i: &'a [u8],
        class_name: &str,
        decoder: &mut AMF3Decoder<'_>,
    ) -> AMFResult<'a, Amf3Object> {
        let mut object = Amf3Object::typed(class_name);

        let (i, _) = parse_abstract_message(i, decoder, &mut object)?;
        let (mut i, _) = parse_async_message(i, decoder, &mut object)?;
        if self.acknowledge {
            let (j, _) = parse_acknowledge_message(i, decoder)?;
            i = j;
        }

        Ok((i, object))
    }

    fn encode(
        &self,
        object: &Amf3Object,
        class_name: &str,
        encoder: &mut AMF3Encoder<'_>,
    ) -> Result<Vec<u8>, EncodeError> {
        if let Some(name) = object
            .properties
            .keys()
            .find(|name| !ABSTRACT_FIELDS.contains(&name.as_str()) && *name != CORRELATION_ID)
        {
            return Err(EncodeError::InvalidProperty {
                class: class_name.to_string(),
                property: name.clone(),
            });
        }

        let mut out = Vec::new();

        let mut fields = 0u8;
        let mut field_values = Vec::new();
        let mut id_flags = 0u8;
        let mut id_values = Vec::new();
        for (bit, name) in ABSTRACT_FIELDS.iter().enumerate() {
            let Some(value) = object.get(name) else {
                continue;
            };
            let bytes_flag = match *name {
                CLIENT_ID => CLIENT_ID_BYTES_FLAG,
                MESSAGE_ID => MESSAGE_ID_BYTES_FLAG,
                _ => 0,
            };
            match id_bytes(object, name, value) {
                Some(bytes) if bytes_flag != 0 => {
                    id_flags |= bytes_flag;
                    id_values.push(Amf3Node::ByteArray(bytes));
                }
                _ => {
                    fields |= 1 << bit;
                    field_values.push(value);
                }
            }
        }

        if id_flags != 0 {
            out.write_u8(fields | NEXT_FLAG)?;
            out.write_u8(id_flags)?;
        } else {
            out.write_u8(fields)?;
        }
        for value in field_values {
            encoder.write_value(&mut out, value)?;
        }
        for value in &id_values {
            encoder.write_value(&mut out, value)?;
        }

        match object.get(CORRELATION_ID) {
            Some(value) => match id_bytes(object, CORRELATION_ID, value) {
                Some(bytes) => {
                    out.write_u8(CORRELATION_ID_BYTES_FLAG)?;
                    encoder.write_value(&mut out, &Amf3Node::ByteArray(bytes))?;
                }
                None => {
                    out.write_u8(CORRELATION_ID_FLAG)?;
                    encoder.write_value(&mut out, value)?;
                }
            },
            None => out.write_u8(0)?,
        }

        if self.acknowledge {
            out.write_u8(0)?;
        }

        Ok(out)
    }
}
