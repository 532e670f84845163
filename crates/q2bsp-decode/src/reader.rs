//! Little-endian cursor over record bytes.

use glam::{Vec3, Vec4};

use crate::error::{DecodeError, DecodeResult};

/// A forward-only little-endian reader over a byte slice.
///
/// Each record type reads its fields in declaration order, so the field
/// offsets follow directly from the sequence of `read_*` calls.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    offset: usize,
    context: &'static str,
}

impl<'a> RecordReader<'a> {
    /// Create a reader over `data`. `context` names the record in errors.
    #[must_use]
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            offset: 0,
            context,
        }
    }

    /// Current byte offset from the start of the data.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Read exactly `N` bytes.
    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let end = self.offset + N;
        let bytes = self
            .data
            .get(self.offset..end)
            .ok_or(DecodeError::UnexpectedEof {
                context: self.context,
            })?;
        self.offset = end;

        let mut out = [0; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        self.read_array().map(i16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read three consecutive `f32`s.
    pub fn read_vec3(&mut self) -> DecodeResult<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Read four consecutive `f32`s.
    pub fn read_vec4(&mut self) -> DecodeResult<Vec4> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    /// Read three consecutive `i16`s, as used by node and leaf bounds.
    pub fn read_i16x3(&mut self) -> DecodeResult<[i16; 3]> {
        Ok([self.read_i16()?, self.read_i16()?, self.read_i16()?])
    }

    /// Read a fixed-width, NUL-padded name.
    ///
    /// Bytes after the first NUL are ignored. Non-UTF-8 bytes are replaced.
    pub fn read_name<const N: usize>(&mut self) -> DecodeResult<String> {
        let raw = self.read_array::<N>()?;
        let len = raw.iter().position(|&b| b == 0).unwrap_or(N);
        Ok(String::from_utf8_lossy(&raw[..len]).into_owned())
    }
}
