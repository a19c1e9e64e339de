use super::{ClassDefinition, Properties};

/// A decoded AMF3 value
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Amf3Node {
    /// Undefined
    Undefined,

    /// Null
    Null,

    /// Boolean false
    False,

    /// Boolean true
    True,

    /// A 29 bit signed integer
    Integer(i32),

    /// A double precision number
    Double(f64),

    /// A string
    String(String),

    /// An XML document, kept as its source text
    XmlDocument(String),

    /// A date as milliseconds since the epoch, always UTC
    Date(f64),

    /// A dense array
    Array(Vec<Amf3Node>),

    /// An object, either anonymous or typed
    Object(Amf3Object),

    /// Raw bytes
    ByteArray(Vec<u8>),

    /// Vector.<int>
    VectorInt {
        /// The elements
        items: Vec<i32>,
        /// Whether the vector is fixed length
        fixed_length: bool,
    },

    /// Vector.<uint>
    VectorUint {
        /// The elements
        items: Vec<u32>,
        /// Whether the vector is fixed length
        fixed_length: bool,
    },

    /// Vector.<Number>
    VectorDouble {
        /// The elements
        items: Vec<f64>,
        /// Whether the vector is fixed length
        fixed_length: bool,
    },

    /// Vector of objects of a named type
    VectorObject {
        /// The element type name, `*` for untyped vectors
        type_name: String,
        /// The elements
        items: Vec<Amf3Node>,
        /// Whether the vector is fixed length
        fixed_length: bool,
    },
}

/// An AMF3 object
///
/// Objects decoded through an external codec keep their class name so they can be written back
/// through the same codec.
///
/// Decoded objects also remember how they were laid out on the wire, which lets an unchanged
/// object be written back with the same bytes. The layout is not part of equality.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Amf3Object {
    /// The class name, `None` for anonymous objects
    pub class_name: Option<String>,

    /// The properties in wire order
    pub properties: Properties<Amf3Node>,

    /// The traits the object was decoded with
    ///
    /// Ignored when encoding if they no longer describe the properties, for example after a
    /// property was added to a sealed class.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub traits: Option<ClassDefinition>,

    /// Properties an external codec read from their 16 byte id form
    #[cfg_attr(feature = "serde", serde(skip))]
    pub byte_ids: Vec<String>,
}

impl PartialEq for Amf3Object {
    fn eq(&self, other: &Self) -> bool {
        self.class_name == other.class_name && self.properties == other.properties
    }
}

impl Amf3Object {
    /// Create an empty anonymous object
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Create an empty object of the given class
    pub fn typed(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    /// Add a property, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Amf3Node>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a property by name
    pub fn get(&self, key: &str) -> Option<&Amf3Node> {
        self.properties.get(key)
    }
}

impl Amf3Node {
    /// The object of an object node
    pub fn as_object(&self) -> Option<&Amf3Object> {
        match self {
            Amf3Node::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Mutable version of [`as_object`](Self::as_object)
    pub fn as_object_mut(&mut self) -> Option<&mut Amf3Object> {
        match self {
            Amf3Node::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Look up a property of an object node, `None` for missing keys and other node kinds
    pub fn get(&self, key: &str) -> Option<&Amf3Node> {
        self.as_object()?.properties.get(key)
    }

    /// Mutable version of [`get`](Self::get)
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Amf3Node> {
        self.as_object_mut()?.properties.get_mut(key)
    }

    /// Set a property on an object node, returning the previous value
    ///
    /// Setting a property on any other node kind does nothing.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Amf3Node>) -> Option<Amf3Node> {
        self.as_object_mut()?
            .properties
            .insert(key.into(), value.into())
    }

    /// Look up an element of an array node
    pub fn index(&self, index: usize) -> Option<&Amf3Node> {
        match self {
            Amf3Node::Array(items) | Amf3Node::VectorObject { items, .. } => items.get(index),
            _ => None,
        }
    }

    /// The value of a boolean node
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Amf3Node::True => Some(true),
            Amf3Node::False => Some(false),
            _ => None,
        }
    }

    /// The value of an integer node
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Amf3Node::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The numeric value of an integer or double node
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Amf3Node::Integer(i) => Some(f64::from(*i)),
            Amf3Node::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// The value of a string node
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf3Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is a null node
    pub fn is_null(&self) -> bool {
        matches!(self, Amf3Node::Null)
    }
}

impl From<bool> for Amf3Node {
    fn from(b: bool) -> Self {
        if b {
            Amf3Node::True
        } else {
            Amf3Node::False
        }
    }
}

impl From<i32> for Amf3Node {
    fn from(i: i32) -> Self {
        Amf3Node::Integer(i)
    }
}

impl From<f64> for Amf3Node {
    fn from(d: f64) -> Self {
        Amf3Node::Double(d)
    }
}

impl From<String> for Amf3Node {
    fn from(s: String) -> Self {
        Amf3Node::String(s)
    }
}

impl From<&str> for Amf3Node {
    fn from(s: &str) -> Self {
        Amf3Node::String(s.to_string())
    }
}

impl From<Vec<Amf3Node>> for Amf3Node {
    fn from(items: Vec<Amf3Node>) -> Self {
        Amf3Node::Array(items)
    }
}

impl From<Amf3Object> for Amf3Node {
    fn from(object: Amf3Object) -> Self {
        Amf3Node::Object(object)
    }
}
