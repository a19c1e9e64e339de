mod amf0_node;
mod amf3_node;
mod amf_version;
mod attribute;
mod class_definition;

pub use amf0_node::Amf0Node;
pub use amf3_node::{Amf3Node, Amf3Object};
pub use amf_version::AMFVersion;
pub use attribute::Attribute;
pub use class_definition::ClassDefinition;

/// Ordered name to value mapping used by every object-like node
pub type Properties<V> = indexmap::IndexMap<String, V>;
