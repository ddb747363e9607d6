//! Little-endian frame builder.

use crate::error::CodecError;

/// Growable little-endian frame buffer.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buffer: Vec<u8>,
}

impl PacketWriter {
    /// Start a frame with its message type byte.
    pub fn with_type(message_type: u8) -> Self {
        let mut buffer = Vec::with_capacity(64);
        buffer.push(message_type);
        Self { buffer }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an `i16`-length-prefixed string.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::StringTooLong`] when the UTF-8 payload exceeds
    /// `i16::MAX` bytes; nothing is written in that case.
    pub fn write_string(&mut self, value: &str) -> Result<(), CodecError> {
        let bytes = value.as_bytes();
        let length = i16::try_from(bytes.len()).map_err(|_| CodecError::StringTooLong(bytes.len()))?;
        self.write_i16(length);
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes a `u8` element count.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooManyElements`] when `count` exceeds `u8::MAX`.
    pub fn write_count_u8(&mut self, field: &'static str, count: usize) -> Result<(), CodecError> {
        let count = u8::try_from(count).map_err(|_| CodecError::TooManyElements {
            field,
            count,
            max: usize::from(u8::MAX),
        })?;
        self.write_u8(count);
        Ok(())
    }

    /// Writes a `u16` element count.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooManyElements`] when `count` exceeds `u16::MAX`.
    pub fn write_count_u16(&mut self, field: &'static str, count: usize) -> Result<(), CodecError> {
        let count = u16::try_from(count).map_err(|_| CodecError::TooManyElements {
            field,
            count,
            max: usize::from(u16::MAX),
        })?;
        self.write_u16(count);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}
