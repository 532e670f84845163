//! Error types for decoding operations.

use std::fmt;

use crate::header::LumpKind;

/// Errors that can occur while decoding a BSP file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input buffer is too small for the expected data.
    BufferTooSmall {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The file does not start with the `IBSP` identifier.
    BadMagic { found: [u8; 4] },
    /// The file uses a BSP version other than 38.
    UnsupportedVersion { found: i32 },
    /// A lump's byte range lies outside the file.
    LumpOutOfBounds {
        lump: LumpKind,
        offset: usize,
        length: usize,
        file_len: usize,
    },
    /// A lump's length is not a whole number of records.
    LumpSizeMismatch {
        lump: LumpKind,
        length: usize,
        record_size: usize,
    },
    /// A record read ran past the end of its bytes.
    UnexpectedEof { context: &'static str },
    /// A record references an element that does not exist.
    IndexOutOfBounds {
        context: &'static str,
        index: i64,
        len: usize,
    },
    /// A face resolved to fewer than three vertices.
    DegenerateGeometry { face: usize, vertices: usize },
    /// A face's light block is larger than any atlas could hold.
    LightmapTooLarge { width: u32, height: u32 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall {
                context,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "buffer too small for {context}: expected {expected} bytes, got {actual}"
                )
            }
            Self::BadMagic { found } => {
                write!(f, "bad magic: expected \"IBSP\", got {found:02x?}")
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported BSP version {found}, expected 38")
            }
            Self::LumpOutOfBounds {
                lump,
                offset,
                length,
                file_len,
            } => {
                write!(
                    f,
                    "{lump} lump at {offset}+{length} exceeds file length {file_len}"
                )
            }
            Self::LumpSizeMismatch {
                lump,
                length,
                record_size,
            } => {
                write!(
                    f,
                    "{lump} lump length {length} is not a multiple of {record_size}"
                )
            }
            Self::UnexpectedEof { context } => {
                write!(f, "unexpected end of data in {context}")
            }
            Self::IndexOutOfBounds {
                context,
                index,
                len,
            } => {
                write!(f, "{context} index {index} out of bounds for length {len}")
            }
            Self::DegenerateGeometry { face, vertices } => {
                write!(f, "face {face} has only {vertices} vertices")
            }
            Self::LightmapTooLarge { width, height } => {
                write!(f, "light block of {width}x{height} samples is too large")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Look up `items[index]`, reporting a bounds error with `context` on failure.
pub(crate) fn lookup<'a, T, I>(items: &'a [T], index: I, context: &'static str) -> DecodeResult<&'a T>
where
    I: TryInto<i64>,
{
    let wide = index.try_into().unwrap_or(i64::MAX);
    usize::try_from(wide)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or(DecodeError::IndexOutOfBounds {
            context,
            index: wide,
            len: items.len(),
        })
}
