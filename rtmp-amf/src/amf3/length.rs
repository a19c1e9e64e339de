use crate::amf3::varint::{read_u29, write_u29};
use crate::errors::EncodeError;
use crate::nom_utils::AMFResult;
use std::io::Write;

const REFERENCE_FLAG: u32 = 0x01;

/// The largest inline length, one bit of the U29 is taken by the reference flag
pub(crate) const MAX_LENGTH: usize = 0x0FFF_FFFF;

/// The header of every reference-eligible value: either an inline length or a table index
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Length {
    Size(u32),
    Reference(usize),
}

impl Length {
    pub(crate) fn read(i: &[u8]) -> AMFResult<'_, Length> {
        let (i, val) = read_u29(i)?;
        Ok((
            i,
            match val & REFERENCE_FLAG == 0 {
                true => Length::Reference(val as usize >> 1),
                false => Length::Size(val >> 1),
            },
        ))
    }

    pub(crate) fn size(len: usize) -> Result<Self, EncodeError> {
        if len > MAX_LENGTH {
            return Err(EncodeError::TooLarge(len));
        }
        Ok(Length::Size(len as u32))
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        match self {
            // With the last bit set
            Length::Size(x) => write_u29(writer, (x << 1) | REFERENCE_FLAG)?,
            Length::Reference(x) => {
                if *x > MAX_LENGTH {
                    return Err(EncodeError::TooLarge(*x));
                }
                write_u29(writer, (*x as u32) << 1)?
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read() {
        assert_eq!(Length::read(&[0x07]), Ok((&[][..], Length::Size(3))));
        assert_eq!(Length::read(&[0x04]), Ok((&[][..], Length::Reference(2))));
    }

    #[test]
    fn test_write() {
        let mut out = Vec::new();
        Length::Size(3).write(&mut out).unwrap();
        Length::Reference(2).write(&mut out).unwrap();
        assert_eq!(out, vec![0x07, 0x04]);
    }

    #[test]
    fn test_too_large() {
        assert!(Length::size(MAX_LENGTH + 1).is_err());
    }
}
