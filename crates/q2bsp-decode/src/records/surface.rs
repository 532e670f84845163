//! Faces and texture info.

use bitflags::bitflags;
use glam::{Vec3, Vec4};

use super::Record;
use crate::error::DecodeResult;
use crate::header::LumpKind;
use crate::reader::RecordReader;

/// Style byte marking an unused lightmap slot.
pub const NO_STYLE: u8 = 255;

bitflags! {
    /// Surface flags from a texture info record.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: u32 {
        /// Emits light.
        const LIGHT = 0x1;
        /// Reduced friction.
        const SLICK = 0x2;
        /// Drawn as the sky box.
        const SKY = 0x4;
        /// Turbulent water warp.
        const WARP = 0x8;
        /// 33% translucent.
        const TRANS33 = 0x10;
        /// 66% translucent.
        const TRANS66 = 0x20;
        /// Scrolling texture.
        const FLOWING = 0x40;
        /// Never drawn.
        const NODRAW = 0x80;

        // Compiler-only bits and mod extensions pass through unchanged.
        const _ = !0;
    }
}

impl SurfaceFlags {
    /// Whether faces with these flags are drawn as world geometry.
    #[must_use]
    pub fn is_drawable(self) -> bool {
        !self.intersects(Self::NODRAW | Self::SKY)
    }

    /// Whether faces with these flags carry baked light samples.
    #[must_use]
    pub fn has_lightmap(self) -> bool {
        !self.intersects(Self::NODRAW | Self::SKY | Self::TRANS33 | Self::TRANS66 | Self::WARP)
    }
}

/// Texture projection and surface properties shared by faces.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    /// S axis in `xyz`, offset in `w`.
    pub s: Vec4,
    /// T axis in `xyz`, offset in `w`.
    pub t: Vec4,
    pub flags: SurfaceFlags,
    /// Light emission value for `LIGHT` surfaces.
    pub value: i32,
    /// Lowercase texture name, e.g. `e1u1/floor3_1`.
    pub name: String,
    /// Next texture info in the animation chain, or -1.
    pub next: i32,
}

impl TextureInfo {
    /// Project a position into texture space.
    #[must_use]
    pub fn project(&self, position: Vec3) -> glam::Vec2 {
        glam::Vec2::new(
            position.dot(self.s.truncate()) + self.s.w,
            position.dot(self.t.truncate()) + self.t.w,
        )
    }
}

impl Record for TextureInfo {
    const KIND: LumpKind = LumpKind::TextureInfo;
    const SIZE: usize = 76;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            s: reader.read_vec4()?,
            t: reader.read_vec4()?,
            flags: SurfaceFlags::from_bits_retain(reader.read_u32()?),
            value: reader.read_i32()?,
            name: reader.read_name::<32>()?.to_lowercase(),
            next: reader.read_i32()?,
        })
    }
}

/// A convex polygon on a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub plane: u16,
    /// Positive when the face lies on the back of its plane.
    pub side: i16,
    pub first_edge: i32,
    pub edge_count: i16,
    pub texture_info: i16,
    /// Lightmap styles, [`NO_STYLE`] for unused slots.
    pub styles: [u8; 4],
    /// Byte offset into the lighting lump, negative when unlit.
    pub light_offset: i32,
}

impl Face {
    /// The four style bytes packed little-endian into one value.
    #[must_use]
    pub fn packed_styles(&self) -> u32 {
        u32::from_le_bytes(self.styles)
    }

    /// Whether the face's normal is the negated plane normal.
    #[must_use]
    pub fn is_back_side(&self) -> bool {
        self.side > 0
    }
}

impl Record for Face {
    const KIND: LumpKind = LumpKind::Faces;
    const SIZE: usize = 20;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            plane: reader.read_u16()?,
            side: reader.read_i16()?,
            first_edge: reader.read_i32()?,
            edge_count: reader.read_i16()?,
            texture_info: reader.read_i16()?,
            styles: reader.read_array()?,
            light_offset: reader.read_i32()?,
        })
    }
}
