//! File header and lump directory.

use std::fmt;

use crate::error::{DecodeError, DecodeResult};
use crate::reader::RecordReader;

/// File identifier at offset 0.
pub const MAGIC: [u8; 4] = *b"IBSP";

/// The only supported format version.
pub const VERSION: i32 = 38;

/// Number of entries in the lump directory.
pub const LUMP_COUNT: usize = 19;

/// Size of the header in bytes: magic, version and the lump directory.
pub const HEADER_SIZE: usize = 4 + 4 + LUMP_COUNT * 8;

/// The lumps of a BSP file, in directory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LumpKind {
    Entities,
    Planes,
    Vertices,
    Visibility,
    Nodes,
    TextureInfo,
    Faces,
    Lighting,
    Leaves,
    LeafFaces,
    LeafBrushes,
    Edges,
    SurfaceEdges,
    Models,
    Brushes,
    BrushSides,
    Pop,
    Areas,
    AreaPortals,
}

impl LumpKind {
    /// All lumps in directory order.
    pub const ALL: [LumpKind; LUMP_COUNT] = [
        Self::Entities,
        Self::Planes,
        Self::Vertices,
        Self::Visibility,
        Self::Nodes,
        Self::TextureInfo,
        Self::Faces,
        Self::Lighting,
        Self::Leaves,
        Self::LeafFaces,
        Self::LeafBrushes,
        Self::Edges,
        Self::SurfaceEdges,
        Self::Models,
        Self::Brushes,
        Self::BrushSides,
        Self::Pop,
        Self::Areas,
        Self::AreaPortals,
    ];

    /// Position of this lump in the directory.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Size of one record, or `None` for lumps stored as raw bytes.
    #[must_use]
    pub fn record_size(self) -> Option<usize> {
        match self {
            Self::Entities | Self::Visibility | Self::Lighting | Self::Pop => None,
            Self::Planes | Self::Faces => Some(20),
            Self::Vertices | Self::Brushes => Some(12),
            Self::Nodes | Self::Leaves => Some(28),
            Self::TextureInfo => Some(76),
            Self::LeafFaces | Self::LeafBrushes => Some(2),
            Self::Edges | Self::SurfaceEdges | Self::BrushSides => Some(4),
            Self::Models => Some(48),
            Self::Areas | Self::AreaPortals => Some(8),
        }
    }

    /// Lowercase name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Entities => "entities",
            Self::Planes => "planes",
            Self::Vertices => "vertices",
            Self::Visibility => "visibility",
            Self::Nodes => "nodes",
            Self::TextureInfo => "texture info",
            Self::Faces => "faces",
            Self::Lighting => "lighting",
            Self::Leaves => "leaves",
            Self::LeafFaces => "leaf faces",
            Self::LeafBrushes => "leaf brushes",
            Self::Edges => "edges",
            Self::SurfaceEdges => "surface edges",
            Self::Models => "models",
            Self::Brushes => "brushes",
            Self::BrushSides => "brush sides",
            Self::Pop => "pop",
            Self::Areas => "areas",
            Self::AreaPortals => "area portals",
        }
    }
}

impl fmt::Display for LumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Location of one lump within the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LumpEntry {
    /// Byte offset from the start of the file.
    pub offset: u32,
    /// Length in bytes.
    pub length: u32,
}

/// The validated file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Lump directory, indexed by [`LumpKind::index`].
    pub lumps: [LumpEntry; LUMP_COUNT],
}

impl Header {
    /// Parse and validate the header at the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is shorter than [`HEADER_SIZE`], the magic
    /// is not `IBSP`, or the version is not 38.
    pub fn parse(data: &[u8]) -> DecodeResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(DecodeError::BufferTooSmall {
                context: "header",
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut reader = RecordReader::new(&data[..HEADER_SIZE], "header");
        let magic = reader.read_array::<4>()?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic { found: magic });
        }
        let version = reader.read_i32()?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion { found: version });
        }

        let mut lumps = [LumpEntry::default(); LUMP_COUNT];
        for entry in &mut lumps {
            entry.offset = reader.read_u32()?;
            entry.length = reader.read_u32()?;
        }

        Ok(Self { lumps })
    }

    /// Directory entry for `kind`.
    #[must_use]
    pub fn lump(&self, kind: LumpKind) -> LumpEntry {
        self.lumps[kind.index()]
    }

    /// Byte slice of `kind` within `data`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::LumpOutOfBounds`] if the lump does not lie
    /// entirely within `data`.
    pub fn lump_bytes<'a>(&self, data: &'a [u8], kind: LumpKind) -> DecodeResult<&'a [u8]> {
        let entry = self.lump(kind);
        let offset = entry.offset as usize;
        let length = entry.length as usize;
        offset
            .checked_add(length)
            .and_then(|end| data.get(offset..end))
            .ok_or(DecodeError::LumpOutOfBounds {
                lump: kind,
                offset,
                length,
                file_len: data.len(),
            })
    }
}
