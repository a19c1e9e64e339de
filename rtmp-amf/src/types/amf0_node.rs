use super::{Amf3Node, Properties};

/// A decoded AMF0 value
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Node {
    /// A double precision number
    Number(f64),

    /// A boolean
    Boolean(bool),

    /// A string, both the short and long wire forms decode to this
    String(String),

    /// An anonymous object
    Object(Properties<Amf0Node>),

    /// Null
    Null,

    /// Undefined
    Undefined,

    /// An associative array, written with a count hint before its properties
    EcmaArray(Properties<Amf0Node>),

    /// A dense array
    StrictArray(Vec<Amf0Node>),

    /// A date as milliseconds since the epoch and a timezone offset
    Date {
        /// Milliseconds since the epoch
        millis: f64,
        /// Timezone offset, usually zero
        timezone: i16,
    },

    /// An object with a class name
    TypedObject {
        /// The name of the class
        class_name: String,
        /// The properties in wire order
        properties: Properties<Amf0Node>,
    },

    /// A reference to an earlier complex value, kept as the index so it can be written back as is
    Reference(u16),

    /// The AMF3 values that followed the switch marker, up to the end of the message
    Amf3(Vec<Amf3Node>),
}

impl Amf0Node {
    /// The properties of an object-like node
    pub fn properties(&self) -> Option<&Properties<Amf0Node>> {
        match self {
            Amf0Node::Object(properties)
            | Amf0Node::EcmaArray(properties)
            | Amf0Node::TypedObject { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// The mutable properties of an object-like node
    pub fn properties_mut(&mut self) -> Option<&mut Properties<Amf0Node>> {
        match self {
            Amf0Node::Object(properties)
            | Amf0Node::EcmaArray(properties)
            | Amf0Node::TypedObject { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Look up a property by name, `None` for missing keys and nodes that are not object-like
    pub fn get(&self, key: &str) -> Option<&Amf0Node> {
        self.properties()?.get(key)
    }

    /// Mutable version of [`get`](Self::get)
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Amf0Node> {
        self.properties_mut()?.get_mut(key)
    }

    /// Set a property, returning the previous value
    ///
    /// New keys are appended to the end of the property order.
    /// Setting a property on a node that is not object-like does nothing.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Amf0Node>) -> Option<Amf0Node> {
        self.properties_mut()?.insert(key.into(), value.into())
    }

    /// Look up an element of a strict array
    pub fn index(&self, index: usize) -> Option<&Amf0Node> {
        match self {
            Amf0Node::StrictArray(items) => items.get(index),
            _ => None,
        }
    }

    /// Mutable version of [`index`](Self::index)
    pub fn index_mut(&mut self, index: usize) -> Option<&mut Amf0Node> {
        match self {
            Amf0Node::StrictArray(items) => items.get_mut(index),
            _ => None,
        }
    }

    /// The value of a number node
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Amf0Node::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The value of a boolean node
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Amf0Node::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The value of a string node
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf0Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// The embedded AMF3 values of a switch node
    pub fn as_amf3(&self) -> Option<&[Amf3Node]> {
        match self {
            Amf0Node::Amf3(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Mutable version of [`as_amf3`](Self::as_amf3)
    pub fn as_amf3_mut(&mut self) -> Option<&mut Vec<Amf3Node>> {
        match self {
            Amf0Node::Amf3(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Whether this is a null node
    pub fn is_null(&self) -> bool {
        matches!(self, Amf0Node::Null)
    }
}

impl From<f64> for Amf0Node {
    fn from(n: f64) -> Self {
        Amf0Node::Number(n)
    }
}

impl From<bool> for Amf0Node {
    fn from(b: bool) -> Self {
        Amf0Node::Boolean(b)
    }
}

impl From<String> for Amf0Node {
    fn from(s: String) -> Self {
        Amf0Node::String(s)
    }
}

impl From<&str> for Amf0Node {
    fn from(s: &str) -> Self {
        Amf0Node::String(s.to_string())
    }
}

impl From<Vec<Amf0Node>> for Amf0Node {
    fn from(items: Vec<Amf0Node>) -> Self {
        Amf0Node::StrictArray(items)
    }
}

impl From<Properties<Amf0Node>> for Amf0Node {
    fn from(properties: Properties<Amf0Node>) -> Self {
        Amf0Node::Object(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_keeps_order() {
        let mut node = Amf0Node::Object(Properties::new());
        node.set("b", 1.0);
        node.set("a", "x");
        assert_eq!(node.set("b", 2.0), Some(Amf0Node::Number(1.0)));

        let keys: Vec<&str> = node
            .properties()
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(node.get("b").and_then(Amf0Node::as_f64), Some(2.0));
    }

    #[test]
    fn test_non_object_access() {
        let mut node = Amf0Node::Number(3.0);
        assert_eq!(node.get("a"), None);
        assert_eq!(node.set("a", true), None);
        assert_eq!(node, Amf0Node::Number(3.0));
        assert_eq!(node.index(0), None);
    }

    #[test]
    fn test_index() {
        let node = Amf0Node::from(vec![Amf0Node::Null, Amf0Node::from("a")]);
        assert_eq!(node.index(1).and_then(Amf0Node::as_str), Some("a"));
        assert_eq!(node.index(2), None);
    }
}
