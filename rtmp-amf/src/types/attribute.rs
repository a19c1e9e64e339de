use enumset::EnumSetType;

/// Encodes the possible attributes that can be given to a trait
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(EnumSetType, Debug, Hash)]
pub enum Attribute {
    /// Objects of this trait may carry name/value pairs after their sealed properties
    Dynamic,

    /// Objects of this trait are written by a class specific codec
    External,
}
