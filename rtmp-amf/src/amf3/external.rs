use crate::amf3::read::AMF3Decoder;
use crate::amf3::write::AMF3Encoder;
use crate::errors::EncodeError;
use crate::nom_utils::AMFResult;
use crate::types::Amf3Object;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reads and writes the body of an externalizable class
///
/// The traits header has already been handled when these are called, the codec only deals with
/// what the class writes itself. Access to the decoder and encoder is given so nested values go
/// through the same reference tables.
pub trait ExternalCodec: Send + Sync {
    /// Decode the body of an object of the given class
    fn decode<'a>(
        &self,
        i: &'a [u8],
        class_name: &str,
        decoder: &mut AMF3Decoder<'_>,
    ) -> AMFResult<'a, Amf3Object>;

    /// Encode the body of the given object
    fn encode(
        &self,
        object: &Amf3Object,
        class_name: &str,
        encoder: &mut AMF3Encoder<'_>,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// The codecs available for externalizable classes, keyed by class name
#[derive(Clone, Default)]
pub struct Externals {
    codecs: HashMap<String, Arc<dyn ExternalCodec>>,
}

impl Externals {
    /// An empty registry, any externalizable class will fail to decode
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the flex messaging classes registered
    pub fn with_flex() -> Self {
        let mut externals = Self::new();
        crate::flex::register_codecs(&mut externals);
        externals
    }

    /// Register a codec for a class name, replacing any previous one
    pub fn register(&mut self, class_name: impl Into<String>, codec: Arc<dyn ExternalCodec>) {
        self.codecs.insert(class_name.into(), codec);
    }

    /// Look up the codec for a class name
    pub fn get(&self, class_name: &str) -> Option<&Arc<dyn ExternalCodec>> {
        self.codecs.get(class_name)
    }

    /// Whether a codec is registered for the class name
    pub fn contains(&self, class_name: &str) -> bool {
        self.codecs.contains_key(class_name)
    }
}

impl fmt::Debug for Externals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.codecs.keys().collect();
        names.sort();
        f.debug_struct("Externals").field("codecs", &names).finish()
    }
}
