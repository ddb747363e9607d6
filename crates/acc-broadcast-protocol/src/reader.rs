//! Little-endian cursor over an inbound frame.

use crate::error::CodecError;

/// Sequential reader over a borrowed frame. Each read either consumes exactly
/// the field width or fails without consuming anything.
#[derive(Debug)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let truncated = CodecError::Truncated {
            needed: len,
            offset: self.offset,
            len: self.data.len(),
        };
        let end = self.offset.checked_add(len).ok_or(truncated.clone())?;
        let slice = self.data.get(self.offset..end).ok_or(truncated)?;
        self.offset = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(u8::from_le_bytes(self.read_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Reads an `f32`; non-finite values are surfaced as `0.0`.
    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        let value = f32::from_le_bytes(self.read_array()?);
        Ok(if value.is_finite() { value } else { 0.0 })
    }

    /// Reads an `i16`-length-prefixed string. Bytes that are not UTF-8 are
    /// replaced with U+FFFD.
    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let length = self.read_i16()?;
        let length = usize::try_from(length).map_err(|_| CodecError::NegativeStringLength(length))?;
        let raw = self.read_exact(length)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}
