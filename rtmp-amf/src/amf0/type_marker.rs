/// Type markers used in AMF0
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
#[repr(u8)]
pub(crate) enum TypeMarker {
    /// Number
    Number = 0,

    /// Boolean
    Boolean = 1,

    /// String
    String = 2,

    /// Object start
    Object = 3,

    /// Null
    Null = 5,

    /// Undefined
    Undefined = 6,

    /// Reference to an earlier complex value
    Reference = 7,

    /// Start of an ecma array
    EcmaArray = 8,

    /// Object end
    ObjectEnd = 9,

    /// Strict array start
    StrictArray = 10,

    /// Date with timezone
    Date = 11,

    /// Long string (length > 65535)
    LongString = 12,

    /// Typed object start
    TypedObject = 16,

    /// Switch to AMF3 for the rest of the message
    AMF3 = 17,
}

impl TryFrom<u8> for TypeMarker {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Number),
            1 => Ok(Self::Boolean),
            2 => Ok(Self::String),
            3 => Ok(Self::Object),
            5 => Ok(Self::Null),
            6 => Ok(Self::Undefined),
            7 => Ok(Self::Reference),
            8 => Ok(Self::EcmaArray),
            9 => Ok(Self::ObjectEnd),
            10 => Ok(Self::StrictArray),
            11 => Ok(Self::Date),
            12 => Ok(Self::LongString),
            16 => Ok(Self::TypedObject),
            17 => Ok(Self::AMF3),
            _ => Err(()),
        }
    }
}
