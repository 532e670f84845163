//! Error types for the q2bsp crate.

use std::fmt;

use glam::UVec2;

/// Result type for level loading operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a lightmap block could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustedReason {
    /// The block is at least as large as the atlas along one axis.
    BlockTooLarge,
    /// No space is left below the current row.
    AtlasFull,
}

impl fmt::Display for ExhaustedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustedReason::BlockTooLarge => f.write_str("block does not fit in the atlas"),
            ExhaustedReason::AtlasFull => f.write_str("atlas is full"),
        }
    }
}

/// Errors that can occur while loading a level.
#[derive(Debug)]
pub enum Error {
    /// Reading the input stream failed.
    Io {
        /// The error message.
        message: String,
    },
    /// The BSP data is malformed.
    Decode(q2bsp_decode::DecodeError),
    /// A lightmap block could not be placed in the atlas.
    AllocationExhausted {
        /// Requested block size in light samples.
        requested: UVec2,
        /// Atlas edge length in texels.
        atlas_size: u32,
        reason: ExhaustedReason,
    },
    /// A configuration value is out of range.
    InvalidConfig {
        /// Description of what was invalid.
        detail: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { message } => write!(f, "failed to read level: {message}"),
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::AllocationExhausted {
                requested,
                atlas_size,
                reason,
            } => write!(
                f,
                "cannot allocate {}x{} lightmap block in {atlas_size}x{atlas_size} atlas: {reason}",
                requested.x, requested.y
            ),
            Error::InvalidConfig { detail } => write!(f, "invalid config: {detail}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<q2bsp_decode::DecodeError> for Error {
    fn from(e: q2bsp_decode::DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io {
            message: e.to_string(),
        }
    }
}
