use crate::amf3::read::AMF3Decoder;
use crate::amf3::write::AMF3Encoder;
use crate::amf3::ExternalCodec;
use crate::errors::{DecodeError, EncodeError};
use crate::nom_utils::{fail, take_str, AMFResult};
use crate::types::{Amf3Node, Amf3Object, Properties};
use byteorder::{BigEndian, WriteBytesExt};
use nom::number::complete::be_u32;
use serde_json::{Map, Number, Value};

/// Codec for classes whose body is a 4 byte length followed by a utf-8 json object
///
/// Json numbers become integers, truncating any fraction.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec;

fn from_json(value: Value) -> Amf3Node {
    match value {
        Value::Null => Amf3Node::Null,
        Value::Bool(b) => Amf3Node::from(b),
        Value::Number(n) => Amf3Node::Integer(n.as_f64().unwrap_or_default() as i32),
        Value::String(s) => Amf3Node::String(s),
        Value::Array(items) => Amf3Node::Array(items.into_iter().map(from_json).collect()),
        Value::Object(map) => Amf3Node::Object(Amf3Object {
            properties: from_json_map(map),
            ..Amf3Object::default()
        }),
    }
}

fn from_json_map(map: Map<String, Value>) -> Properties<Amf3Node> {
    map.into_iter()
        .map(|(key, value)| (key, from_json(value)))
        .collect()
}

fn to_json(node: &Amf3Node) -> Option<Value> {
    Some(match node {
        Amf3Node::Null | Amf3Node::Undefined => Value::Null,
        Amf3Node::True => Value::Bool(true),
        Amf3Node::False => Value::Bool(false),
        Amf3Node::Integer(i) => Value::from(*i),
        Amf3Node::Double(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
        Amf3Node::String(s) => Value::String(s.clone()),
        Amf3Node::Array(items) => Value::Array(items.iter().map(to_json).collect::<Option<_>>()?),
        Amf3Node::Object(object) => Value::Object(to_json_map(&object.properties)?),
        _ => return None,
    })
}

fn to_json_map(properties: &Properties<Amf3Node>) -> Option<Map<String, Value>> {
    properties
        .iter()
        .map(|(key, value)| Some((key.clone(), to_json(value)?)))
        .collect()
}

impl ExternalCodec for JsonCodec {
    fn decode<'a>(
        &self,
        i: &'a [u8],
        class_name: &str,
        _decoder: &mut AMF3Decoder<'_>,
    ) -> AMFResult<'a, Amf3Object> {
        let (i, len) = be_u32(i)?;
        let (i, text) = take_str(i, len as usize)?;

        let invalid = |reason: String| DecodeError::InvalidExternal {
            class: class_name.to_string(),
            reason,
        };
        let properties = match serde_json::from_str(text) {
            Ok(Value::Object(map)) => from_json_map(map),
            Ok(_) => return fail(invalid("expected a json object".to_string())),
            Err(e) => return fail(invalid(e.to_string())),
        };

        Ok((
            i,
            Amf3Object {
                properties,
                ..Amf3Object::typed(class_name)
            },
        ))
    }

    fn encode(
        &self,
        object: &Amf3Object,
        class_name: &str,
        _encoder: &mut AMF3Encoder<'_>,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut map = Map::new();
        for (key, value) in &object.properties {
            let value = to_json(value).ok_or_else(|| EncodeError::InvalidProperty {
                class: class_name.to_string(),
                property: key.clone(),
            })?;
            map.insert(key.clone(), value);
        }

        let text = serde_json::to_vec(&Value::Object(map)).map_err(std::io::Error::from)?;
        let len = u32::try_from(text.len()).map_err(|_| EncodeError::TooLarge(text.len()))?;

        let mut out = Vec::with_capacity(text.len() + 4);
        out.write_u32::<BigEndian>(len)?;
        out.extend_from_slice(&text);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::amf3::{decode_all, encode_all, Externals};
    use crate::reference_tables::{ReferenceTables, TableScope};
    use crate::types::{Amf3Node, Amf3Object};
    use pretty_assertions::assert_eq;

    const NAME: &str = "com.riotgames.platform.broadcast.BroadcastNotification";

    fn body(json: &str) -> Vec<u8> {
        let mut bytes = vec![0x0A, 0x07];
        bytes.push((NAME.len() << 1 | 1) as u8);
        bytes.extend_from_slice(NAME.as_bytes());
        bytes.extend_from_slice(&(json.len() as u32).to_be_bytes());
        bytes.extend_from_slice(json.as_bytes());
        bytes
    }

    #[test]
    fn test_decode() {
        let externals = Externals::with_flex();
        let mut tables = ReferenceTables::new(TableScope::PerMessage);
        let nodes = decode_all(
            &body(r#"{"a":1.9,"b":[true,null],"c":{"d":"e"}}"#),
            &mut tables,
            &externals,
        );

        let expected = Amf3Object::typed(NAME)
            .with("a", 1)
            .with("b", vec![Amf3Node::True, Amf3Node::Null])
            .with("c", Amf3Object::anonymous().with("d", "e"));
        assert_eq!(nodes, Ok(vec![Amf3Node::from(expected)]));
    }

    #[test]
    fn test_encode_keeps_order() {
        let externals = Externals::with_flex();
        let mut tables = ReferenceTables::new(TableScope::PerMessage);
        let message = Amf3Object::typed(NAME).with("z", 1).with("a", "x");

        let bytes = encode_all(&[Amf3Node::from(message)], &mut tables, &externals);
        assert_eq!(bytes.ok(), Some(body(r#"{"z":1,"a":"x"}"#)));
    }

    #[test]
    fn test_decode_not_json() {
        let externals = Externals::with_flex();
        let mut tables = ReferenceTables::new(TableScope::PerMessage);
        assert!(decode_all(&body("[1]"), &mut tables, &externals).is_err());
        assert!(decode_all(&body("{"), &mut tables, &externals).is_err());
    }
}
