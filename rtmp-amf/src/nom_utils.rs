use crate::errors::{DecodeError, EncodeError};
use byteorder::{BigEndian, WriteBytesExt};
use nom::bytes::complete::take;
use nom::Err;
use nom::IResult;
use std::io::Write;

/// The result of every parser in this crate
pub type AMFResult<'a, T> = IResult<&'a [u8], T, DecodeError>;

/// How deeply values may nest inside each other before decoding gives up
pub const MAX_NESTING: usize = 128;

/// Take `length` bytes and interpret them as utf-8
pub(crate) fn take_str(i: &[u8], length: usize) -> AMFResult<'_, &str> {
    let (i, bytes) = take(length)(i)?;
    let s = std::str::from_utf8(bytes).map_err(|_| Err::Error(DecodeError::InvalidUtf8))?;
    Ok((i, s))
}

/// Write a string with a u16 length prefix
pub(crate) fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<(), EncodeError> {
    let length = u16::try_from(s.len()).map_err(|_| EncodeError::TooLarge(s.len()))?;
    writer.write_u16::<BigEndian>(length)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

/// Fail with the given decode error
pub(crate) fn fail<T>(e: DecodeError) -> Result<T, Err<DecodeError>> {
    Err(Err::Error(e))
}
