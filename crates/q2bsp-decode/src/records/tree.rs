//! BSP tree, brush and area records.

use bitflags::bitflags;
use glam::Vec3;

use super::Record;
use crate::error::DecodeResult;
use crate::header::LumpKind;
use crate::reader::RecordReader;

bitflags! {
    /// Contents of a leaf or brush.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ContentFlags: u32 {
        const SOLID = 0x1;
        const WINDOW = 0x2;
        const AUX = 0x4;
        const LAVA = 0x8;
        const SLIME = 0x10;
        const WATER = 0x20;
        const MIST = 0x40;
        const AREAPORTAL = 0x8000;
        const PLAYERCLIP = 0x1_0000;
        const MONSTERCLIP = 0x2_0000;
        const CURRENT_0 = 0x4_0000;
        const CURRENT_90 = 0x8_0000;
        const CURRENT_180 = 0x10_0000;
        const CURRENT_270 = 0x20_0000;
        const CURRENT_UP = 0x40_0000;
        const CURRENT_DOWN = 0x80_0000;
        const ORIGIN = 0x100_0000;
        const MONSTER = 0x200_0000;
        const DEADMONSTER = 0x400_0000;
        const DETAIL = 0x800_0000;
        const TRANSLUCENT = 0x1000_0000;
        const LADDER = 0x2000_0000;

        const _ = !0;
    }
}

/// One child slot of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeChild {
    Node(usize),
    Leaf(usize),
}

impl NodeChild {
    /// Decode the on-disk child value. Negative values address leaves as
    /// `-(leaf + 1)`.
    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        if raw < 0 {
            Self::Leaf((!raw).unsigned_abs() as usize)
        } else {
            Self::Node(raw.unsigned_abs() as usize)
        }
    }
}

/// An interior node of the BSP tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub plane: i32,
    /// Front and back children in their raw encoding, see [`NodeChild`].
    pub children: [i32; 2],
    pub mins: [i16; 3],
    pub maxs: [i16; 3],
    pub first_face: u16,
    pub face_count: u16,
}

impl Node {
    /// Front and back children.
    #[must_use]
    pub fn child_nodes(&self) -> [NodeChild; 2] {
        self.children.map(NodeChild::from_raw)
    }
}

impl Record for Node {
    const KIND: LumpKind = LumpKind::Nodes;
    const SIZE: usize = 28;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            plane: reader.read_i32()?,
            children: [reader.read_i32()?, reader.read_i32()?],
            mins: reader.read_i16x3()?,
            maxs: reader.read_i16x3()?,
            first_face: reader.read_u16()?,
            face_count: reader.read_u16()?,
        })
    }
}

/// A convex region at the bottom of the BSP tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub contents: ContentFlags,
    /// Visibility cluster, -1 for none.
    pub cluster: i16,
    pub area: i16,
    pub mins: [i16; 3],
    pub maxs: [i16; 3],
    pub first_leaf_face: u16,
    pub leaf_face_count: u16,
    pub first_leaf_brush: u16,
    pub leaf_brush_count: u16,
}

impl Leaf {
    /// Whether the leaf is filled with water, lava or slime.
    #[must_use]
    pub fn is_liquid(&self) -> bool {
        self.contents
            .intersects(ContentFlags::WATER | ContentFlags::LAVA | ContentFlags::SLIME)
    }
}

impl Record for Leaf {
    const KIND: LumpKind = LumpKind::Leaves;
    const SIZE: usize = 28;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            contents: ContentFlags::from_bits_retain(reader.read_u32()?),
            cluster: reader.read_i16()?,
            area: reader.read_i16()?,
            mins: reader.read_i16x3()?,
            maxs: reader.read_i16x3()?,
            first_leaf_face: reader.read_u16()?,
            leaf_face_count: reader.read_u16()?,
            first_leaf_brush: reader.read_u16()?,
            leaf_brush_count: reader.read_u16()?,
        })
    }
}

/// Face index listed by a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafFace(pub u16);

impl Record for LeafFace {
    const KIND: LumpKind = LumpKind::LeafFaces;
    const SIZE: usize = 2;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        reader.read_u16().map(Self)
    }
}

/// Brush index listed by a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafBrush(pub u16);

impl Record for LeafBrush {
    const KIND: LumpKind = LumpKind::LeafBrushes;
    const SIZE: usize = 2;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        reader.read_u16().map(Self)
    }
}

/// A submodel: the world (index 0) or a brush entity such as a door.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Model {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub origin: Vec3,
    pub head_node: i32,
    pub first_face: i32,
    pub face_count: i32,
}

impl Record for Model {
    const KIND: LumpKind = LumpKind::Models;
    const SIZE: usize = 48;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            mins: reader.read_vec3()?,
            maxs: reader.read_vec3()?,
            origin: reader.read_vec3()?,
            head_node: reader.read_i32()?,
            first_face: reader.read_i32()?,
            face_count: reader.read_i32()?,
        })
    }
}

/// A convex solid bounded by brush sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brush {
    pub first_side: i32,
    pub side_count: i32,
    pub contents: ContentFlags,
}

impl Record for Brush {
    const KIND: LumpKind = LumpKind::Brushes;
    const SIZE: usize = 12;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            first_side: reader.read_i32()?,
            side_count: reader.read_i32()?,
            contents: ContentFlags::from_bits_retain(reader.read_u32()?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushSide {
    pub plane: u16,
    pub texture_info: i16,
}

impl Record for BrushSide {
    const KIND: LumpKind = LumpKind::BrushSides;
    const SIZE: usize = 4;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            plane: reader.read_u16()?,
            texture_info: reader.read_i16()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub portal_count: i32,
    pub first_portal: i32,
}

impl Record for Area {
    const KIND: LumpKind = LumpKind::Areas;
    const SIZE: usize = 8;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            portal_count: reader.read_i32()?,
            first_portal: reader.read_i32()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaPortal {
    pub portal: i32,
    pub other_area: i32,
}

impl Record for AreaPortal {
    const KIND: LumpKind = LumpKind::AreaPortals;
    const SIZE: usize = 8;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            portal: reader.read_i32()?,
            other_area: reader.read_i32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_child_encoding() {
        assert_eq!(NodeChild::from_raw(4), NodeChild::Node(4));
        assert_eq!(NodeChild::from_raw(-1), NodeChild::Leaf(0));
        assert_eq!(NodeChild::from_raw(-8), NodeChild::Leaf(7));
        assert_eq!(
            NodeChild::from_raw(i32::MIN),
            NodeChild::Leaf(2_147_483_647)
        );
    }

    #[test]
    fn test_read_leaf() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x21_u32.to_le_bytes());
        for v in [3_i16, 1, -16, -16, -16, 16, 16, 16] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [5_u16, 2, 7, 1] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }

        let leaf = Leaf::read(&mut RecordReader::new(&bytes, "leaf")).unwrap();
        assert_eq!(leaf.contents, ContentFlags::SOLID | ContentFlags::WATER);
        assert!(leaf.is_liquid());
        assert_eq!(leaf.cluster, 3);
        assert_eq!(leaf.area, 1);
        assert_eq!(leaf.mins, [-16, -16, -16]);
        assert_eq!(leaf.maxs, [16, 16, 16]);
        assert_eq!(
            (
                leaf.first_leaf_face,
                leaf.leaf_face_count,
                leaf.first_leaf_brush,
                leaf.leaf_brush_count
            ),
            (5, 2, 7, 1)
        );
    }

    #[test]
    fn test_read_model() {
        let mut bytes = Vec::new();
        for v in [-1.0_f32, -2.0, -3.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [0_i32, 4, 12] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }

        let model = Model::read(&mut RecordReader::new(&bytes, "model")).unwrap();
        assert_eq!(model.mins, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(model.maxs, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!((model.head_node, model.first_face, model.face_count), (0, 4, 12));
    }
}
