use super::{Amf3Object, Attribute};
use enumset::EnumSet;

/// A class definition (trait) used in AMF3
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ClassDefinition {
    /// The name of the class, empty for anonymous objects
    pub name: String,

    /// The attributes on this trait
    pub attributes: EnumSet<Attribute>,

    /// The names of the sealed properties, in wire order
    pub static_properties: Vec<String>,
}

impl ClassDefinition {
    /// The trait used for anonymous objects: no name, dynamic, no sealed properties
    pub fn anonymous() -> Self {
        Self {
            name: String::new(),
            attributes: Attribute::Dynamic.into(),
            static_properties: Vec::new(),
        }
    }

    /// A named trait whose properties are all sealed
    pub fn sealed(name: impl Into<String>, static_properties: Vec<String>) -> Self {
        Self {
            name: name.into(),
            attributes: EnumSet::empty(),
            static_properties,
        }
    }

    /// A named trait whose body is handled by an external codec
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attribute::External.into(),
            static_properties: Vec::new(),
        }
    }

    /// Whether the body of this trait is handled by an external codec
    pub fn is_external(&self) -> bool {
        self.attributes.contains(Attribute::External)
    }

    /// Whether objects of this trait have a dynamic section
    pub fn is_dynamic(&self) -> bool {
        self.attributes.contains(Attribute::Dynamic)
    }

    /// Whether an object can be written with these traits
    ///
    /// The names must match, every sealed property must be present and any other property needs
    /// a dynamic section to go in.
    pub fn describes(&self, object: &Amf3Object) -> bool {
        if self.is_external() || object.class_name.as_deref().unwrap_or_default() != self.name {
            return false;
        }
        if !self
            .static_properties
            .iter()
            .all(|name| object.properties.contains_key(name))
        {
            return false;
        }
        self.is_dynamic() || object.properties.len() == self.static_properties.len()
    }

    /// The two bit encoding stored in the traits header
    pub(crate) fn encoding(&self) -> u32 {
        let mut encoding = 0;
        if self.is_external() {
            encoding |= 0b01;
        }
        if self.is_dynamic() {
            encoding |= 0b10;
        }
        encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        assert_eq!(ClassDefinition::anonymous().encoding(), 0b10);
        assert_eq!(ClassDefinition::external("DSK").encoding(), 0b01);
        assert_eq!(ClassDefinition::sealed("a.B", vec!["x".into()]).encoding(), 0);
    }

    #[test]
    fn test_describes() {
        let sealed = ClassDefinition::sealed("a.B", vec!["x".into()]);
        assert!(sealed.describes(&Amf3Object::typed("a.B").with("x", 1)));
        assert!(!sealed.describes(&Amf3Object::typed("a.B")));
        assert!(!sealed.describes(&Amf3Object::typed("a.B").with("x", 1).with("y", 2)));
        assert!(!sealed.describes(&Amf3Object::typed("a.C").with("x", 1)));

        let mut dynamic = sealed.clone();
        dynamic.attributes |= Attribute::Dynamic;
        assert!(dynamic.describes(&Amf3Object::typed("a.B").with("x", 1).with("y", 2)));

        assert!(ClassDefinition::anonymous().describes(&Amf3Object::anonymous().with("y", 2)));
        assert!(!ClassDefinition::external("a.B").describes(&Amf3Object::typed("a.B")));
    }
}
