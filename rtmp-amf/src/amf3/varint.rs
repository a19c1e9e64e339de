//! The U29 variable length integer
//!
//! Values are written in one to four bytes. The first three bytes carry seven bits each with the
//! high bit set when another byte follows, a fourth byte carries a full eight bits.

use crate::nom_utils::AMFResult;
use byteorder::WriteBytesExt;
use nom::number::complete::be_u8;
use std::io::{Result, Write};

/// The largest value that fits in a U29
pub const MAX_U29: u32 = 0x1FFF_FFFF;

/// The largest value that fits in a signed I29
pub const MAX_I29: i32 = 0x0FFF_FFFF;

/// The smallest value that fits in a signed I29
pub const MIN_I29: i32 = -0x1000_0000;

/// Read an unsigned 29 bit integer
pub fn read_u29(i: &[u8]) -> AMFResult<'_, u32> {
    // Read the first byte of the number
    let (mut i, num) = be_u8(i)?;
    let mut value = u32::from(num & 0b0111_1111);
    // Check if we have another byte
    if num & 0b1000_0000 == 0 {
        return Ok((i, value));
    }

    for _ in 0..2 {
        let (j, num) = be_u8(i)?;
        i = j;
        value = (value << 7) | u32::from(num & 0b0111_1111);
        if num & 0b1000_0000 == 0 {
            return Ok((i, value));
        }
    }

    // The fourth byte uses all 8 bits
    let (i, num) = be_u8(i)?;
    value = (value << 8) | u32::from(num);

    Ok((i, value))
}

/// Read a signed 29 bit integer, bit 28 is the sign bit
pub fn read_i29(i: &[u8]) -> AMFResult<'_, i32> {
    let (i, value) = read_u29(i)?;
    let value = if value & 0x1000_0000 != 0 {
        value as i32 - 0x2000_0000
    } else {
        value as i32
    };
    Ok((i, value))
}

/// Write an unsigned 29 bit integer, bits above 29 are discarded
pub fn write_u29<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    let n = value & MAX_U29;

    if n >= 0x20_0000 {
        writer.write_u8(((n >> 22) & 0x7F) as u8 | 0x80)?;
        writer.write_u8(((n >> 15) & 0x7F) as u8 | 0x80)?;
        writer.write_u8(((n >> 8) & 0x7F) as u8 | 0x80)?;
        writer.write_u8((n & 0xFF) as u8)?;
    } else if n >= 0x4000 {
        writer.write_u8(((n >> 14) & 0x7F) as u8 | 0x80)?;
        writer.write_u8(((n >> 7) & 0x7F) as u8 | 0x80)?;
        writer.write_u8((n & 0x7F) as u8)?;
    } else if n >= 0x80 {
        writer.write_u8(((n >> 7) & 0x7F) as u8 | 0x80)?;
        writer.write_u8((n & 0x7F) as u8)?;
    } else {
        writer.write_u8(n as u8)?;
    }

    Ok(())
}

/// Write a signed 29 bit integer, negative values always take four bytes
pub fn write_i29<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    write_u29(writer, value as u32 & MAX_U29)
}

/// Whether the value can be written as an I29
pub fn fits_i29(value: i32) -> bool {
    (MIN_I29..=MAX_I29).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encoded(value: i32) -> Vec<u8> {
        let mut out = Vec::new();
        write_i29(&mut out, value).expect("write to vec");
        out
    }

    #[test]
    fn test_read_1byte_number() {
        assert_eq!(0b00101011, read_i29(&[0b00101011]).unwrap().1)
    }

    #[test]
    fn test_read_4byte_number() {
        let i = &[0b10000000, 0b11000000, 0b10000000, 0b10000000];
        assert_eq!(2097280, read_i29(i).unwrap().1);
    }

    #[test]
    fn test_read_neg_number() {
        assert_eq!(-268435455, read_i29(&[192, 128, 128, 1]).unwrap().1);
    }

    #[test]
    fn test_read_neg_number_unsigned() {
        assert_eq!(0x1000_0001, read_u29(&[192, 128, 128, 1]).unwrap().1);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(0x7F), vec![0x7F]);
        assert_eq!(encoded(0x80), vec![0x81, 0x00]);
        assert_eq!(encoded(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encoded(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(encoded(0x1F_FFFF), vec![0xFF, 0xFF, 0x7F]);
        assert_eq!(encoded(0x20_0000), vec![0x80, 0xC0, 0x80, 0x00]);
        assert_eq!(encoded(MAX_I29), vec![0xBF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(encoded(-1), vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(encoded(MIN_I29), vec![0xC0, 0x80, 0x80, 0x00]);
    }

    #[test]
    fn test_boundaries_read_back() {
        for value in [
            0,
            0x7F,
            0x80,
            0x3FFF,
            0x4000,
            0x1F_FFFF,
            0x20_0000,
            MAX_I29,
            -1,
            MIN_I29,
        ] {
            let bytes = encoded(value);
            assert_eq!(read_i29(&bytes), Ok((&[][..], value)));
        }
    }

    #[test]
    fn test_truncated() {
        assert!(read_u29(&[0x81]).is_err());
        assert!(read_u29(&[]).is_err());
    }

    #[test]
    fn test_fits() {
        assert!(fits_i29(MAX_I29));
        assert!(fits_i29(MIN_I29));
        assert!(!fits_i29(MAX_I29 + 1));
        assert!(!fits_i29(MIN_I29 - 1));
    }
}
