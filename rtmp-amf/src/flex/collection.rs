use crate::amf3::read::AMF3Decoder;
use crate::amf3::write::AMF3Encoder;
use crate::amf3::ExternalCodec;
use crate::errors::{DecodeError, EncodeError};
use crate::nom_utils::{fail, AMFResult};
use crate::types::{Amf3Node, Amf3Object};

const ARRAY: &str = "array";

/// Codec for collection classes whose body is a single array, exposed as the `array` property
#[derive(Debug, Clone, Copy)]
pub struct CollectionCodec;

impl ExternalCodec for CollectionCodec {
    fn decode<'a>(
        &self,
        i: &'a [u8],
        class_name: &str,
        decoder: &mut AMF3Decoder<'_>,
    ) -> AMFResult<'a, Amf3Object> {
        let (i, array) = decoder.parse_single_element(i)?;
        if !matches!(array, Amf3Node::Array(_)) {
            return fail(DecodeError::InvalidExternal {
                class: class_name.to_string(),
                reason: "expected an array".to_string(),
            });
        }

        Ok((i, Amf3Object::typed(class_name).with(ARRAY, array)))
    }

    fn encode(
        &self,
        object: &Amf3Object,
        class_name: &str,
        encoder: &mut AMF3Encoder<'_>,
    ) -> Result<Vec<u8>, EncodeError> {
        if let Some(name) = object.properties.keys().find(|name| *name != ARRAY) {
            return Err(EncodeError::InvalidProperty {
                class: class_name.to_string(),
                property: name.clone(),
            });
        }
        let array = object.get(ARRAY).ok_or_else(|| EncodeError::MissingProperty {
            class: class_name.to_string(),
            property: ARRAY,
        })?;

        let mut out = Vec::new();
        encoder.write_value(&mut out, array)?;
        Ok(out)
    }
}
