use crate::types::{Amf0Node, Amf3Node, ClassDefinition};
use core::fmt;

/// An ordered list of previously seen values, addressed by the order they were added in
#[derive(Clone, Debug)]
pub struct ReferenceTable<T> {
    entries: Vec<T>,
}

impl<T> Default for ReferenceTable<T> {
    fn default() -> Self {
        ReferenceTable {
            entries: Vec::new(),
        }
    }
}

impl<T> ReferenceTable<T> {
    /// Add a value, returning its index
    #[inline]
    pub fn push(&mut self, val: T) -> usize {
        self.entries.push(val);
        self.entries.len() - 1
    }

    /// Retrieve the value at the given index
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    /// The number of values in the table
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every value
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: PartialEq> ReferenceTable<T> {
    /// Retrieve the index of the first entry equal to the given value
    #[inline]
    pub fn position(&self, val: &T) -> Option<usize> {
        self.entries.iter().position(|i| i == val)
    }
}

impl ReferenceTable<String> {
    /// Retrieve the index of the given string without allocating
    #[inline]
    pub fn position_str(&self, val: &str) -> Option<usize> {
        self.entries.iter().position(|i| i == val)
    }
}

/// Identifies one of the reference tables, used in errors
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TableKind {
    /// AMF3 strings
    Strings,
    /// AMF3 traits
    Classes,
    /// AMF3 complex values
    Amf3Objects,
    /// AMF0 complex values
    Amf0Objects,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Strings => f.write_str("string"),
            TableKind::Classes => f.write_str("class"),
            TableKind::Amf3Objects => f.write_str("AMF3 object"),
            TableKind::Amf0Objects => f.write_str("AMF0 object"),
        }
    }
}

/// How long the tables live
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum TableScope {
    /// Tables are cleared before every message
    #[default]
    PerMessage,

    /// Tables accumulate for the whole connection
    PerConnection,
}

/// The reference tables used by one side (decode or encode) of a connection
///
/// Decoding and encoding each need their own set, the indices written by an encoder must line up
/// with the indices the peer's decoder will assign.
#[derive(Clone, Debug, Default)]
pub struct ReferenceTables {
    scope: TableScope,

    /// AMF3 strings, empty strings are never added
    pub strings: ReferenceTable<String>,

    /// AMF3 traits
    pub classes: ReferenceTable<ClassDefinition>,

    /// AMF3 objects, arrays, dates, byte arrays, vectors, dictionaries and xml documents
    pub amf3_objects: ReferenceTable<Amf3Node>,

    /// AMF0 typed objects and the values of ecma arrays
    pub amf0_objects: ReferenceTable<Amf0Node>,
}

impl ReferenceTables {
    /// Create an empty set of tables with the given lifetime
    pub fn new(scope: TableScope) -> Self {
        Self {
            scope,
            ..Default::default()
        }
    }

    /// The lifetime of these tables
    pub fn scope(&self) -> TableScope {
        self.scope
    }

    /// Clear every table
    pub fn reset(&mut self) {
        self.strings.clear();
        self.classes.clear();
        self.amf3_objects.clear();
        self.amf0_objects.clear();
    }

    /// Called before each message, clears the tables if they are scoped per message
    pub fn begin_message(&mut self) {
        if self.scope == TableScope::PerMessage {
            self.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_get() {
        let mut table = ReferenceTable::default();
        assert_eq!(table.push("a".to_string()), 0);
        assert_eq!(table.push("b".to_string()), 1);
        assert_eq!(table.get(1).map(String::as_str), Some("b"));
        assert_eq!(table.get(2), None);
        assert_eq!(table.position_str("b"), Some(1));
        assert_eq!(table.position(&"c".to_string()), None);
    }

    #[test]
    fn test_begin_message_per_message() {
        let mut tables = ReferenceTables::new(TableScope::PerMessage);
        tables.strings.push("a".to_string());
        tables.amf0_objects.push(Amf0Node::Null);
        tables.begin_message();
        assert!(tables.strings.is_empty());
        assert!(tables.amf0_objects.is_empty());
    }

    #[test]
    fn test_begin_message_per_connection() {
        let mut tables = ReferenceTables::new(TableScope::PerConnection);
        tables.strings.push("a".to_string());
        tables.classes.push(ClassDefinition::anonymous());
        tables.begin_message();
        assert_eq!(tables.strings.len(), 1);
        assert_eq!(tables.classes.len(), 1);

        tables.reset();
        assert!(tables.classes.is_empty());
    }
}
