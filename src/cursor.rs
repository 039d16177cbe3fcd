use byteorder::{BigEndian, ByteOrder, LittleEndian};
use thiserror::Error;

/// Errors raised by the decode primitives. All of these are recoverable:
/// dissectors catch them, attach a diagnostic to the output tree and render
/// whatever was decoded before the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("read of {wanted} bytes at offset {offset} exceeds buffer of {available} bytes")]
    OutOfBounds {
        offset: usize,
        wanted: usize,
        available: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// A bounds-checked cursor over one captured message.
///
/// Every read either advances the cursor by exactly the field width or fails
/// with `OutOfBounds` and leaves the cursor where it was. The view is
/// immutable; the cursor never reads past `data.len()`.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::OutOfBounds {
                offset: self.offset,
                wanted: n,
                available: self.data.len(),
            });
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    /// Read an unsigned integer of 1..=8 bytes.
    pub fn read_uint(&mut self, width: usize, endian: Endianness) -> Result<u64, DecodeError> {
        debug_assert!((1..=8).contains(&width));
        let bytes = self.take(width)?;
        Ok(match endian {
            Endianness::Little => LittleEndian::read_uint(bytes, width),
            Endianness::Big => BigEndian::read_uint(bytes, width),
        })
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self, endian: Endianness) -> Result<u16, DecodeError> {
        Ok(self.read_uint(2, endian)? as u16)
    }

    pub fn read_u24(&mut self, endian: Endianness) -> Result<u32, DecodeError> {
        Ok(self.read_uint(3, endian)? as u32)
    }

    pub fn read_u32(&mut self, endian: Endianness) -> Result<u32, DecodeError> {
        Ok(self.read_uint(4, endian)? as u32)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.take(n)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    /// Consume and return everything left in the buffer.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let slice = &self.data[self.offset..];
        self.offset = self.data.len();
        slice
    }

    /// Read a length field of `length_field_width` bytes, then that many
    /// bytes of string data.
    ///
    /// ISOBUS-VT strings are single-byte Latin-1 unless the data starts with
    /// the byte-order mark FE FF, in which case the remainder is UTF-16BE.
    pub fn read_length_prefixed_string(
        &mut self,
        length_field_width: usize,
        endian: Endianness,
    ) -> Result<String, DecodeError> {
        let length = self.read_uint(length_field_width, endian)? as usize;
        let bytes = self.take(length)?;
        Ok(decode_string(bytes))
    }
}

/// BOM-sniffing string decode shared by length-prefixed and fixed-width
/// string fields.
pub fn decode_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        // Latin-1: every byte maps directly to the code point of equal value.
        bytes.iter().map(|&b| b as char).collect()
    }
}
