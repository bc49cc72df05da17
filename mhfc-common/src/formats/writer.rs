//! Sequential big-endian writer

use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

use super::FormatError;

/// Append-only writer for MHFC documents
///
/// Fixed-width fields are written big-endian, strings as UTF-8 followed by a
/// single NUL terminator.
pub struct BinaryWriter<W: Write> {
    writer: W,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write raw bytes as-is
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Write a NUL-terminated UTF-8 string
    ///
    /// The string itself must not contain a NUL byte, the runtime would cut it short.
    pub fn write_string(&mut self, s: &str) -> Result<(), FormatError> {
        if s.as_bytes().contains(&0) {
            return Err(FormatError::EmbeddedNul(s.to_string()));
        }
        self.write_bytes(s.as_bytes())?;
        self.write_u8(0)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), FormatError> {
        self.writer.write_u8(value)?;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), FormatError> {
        self.writer.write_u16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), FormatError> {
        self.writer.write_u32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), FormatError> {
        self.writer.write_f32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_u8s(&mut self, values: &[u8]) -> Result<(), FormatError> {
        self.write_bytes(values)
    }

    pub fn write_u16s(&mut self, values: &[u16]) -> Result<(), FormatError> {
        for &v in values {
            self.write_u16(v)?;
        }
        Ok(())
    }

    pub fn write_u32s(&mut self, values: &[u32]) -> Result<(), FormatError> {
        for &v in values {
            self.write_u32(v)?;
        }
        Ok(())
    }

    pub fn write_f32s(&mut self, values: &[f32]) -> Result<(), FormatError> {
        for &v in values {
            self.write_f32(v)?;
        }
        Ok(())
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
