//! Fixed-size lump records.
//!
//! Every record type implements [`Record`], which ties it to its lump and
//! its on-disk size. Fields are read in file order through a
//! [`RecordReader`], so each `read` body doubles as the layout table for
//! that record.

mod geometry;
mod surface;
mod tree;

pub use geometry::{Edge, EdgeEndpoint, Plane, SurfaceEdge};
pub use surface::{Face, NO_STYLE, SurfaceFlags, TextureInfo};
pub use tree::{
    Area, AreaPortal, Brush, BrushSide, ContentFlags, Leaf, LeafBrush, LeafFace, Model, Node,
    NodeChild,
};

use glam::Vec3;

use crate::error::{DecodeError, DecodeResult};
use crate::header::LumpKind;
use crate::reader::RecordReader;

/// A fixed-size record stored in one lump.
pub trait Record: Sized {
    /// The lump this record is stored in.
    const KIND: LumpKind;
    /// Size of one record in bytes.
    const SIZE: usize;

    /// Read one record. The reader covers exactly [`Self::SIZE`] bytes.
    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self>;
}

impl Record for Vec3 {
    const KIND: LumpKind = LumpKind::Vertices;
    const SIZE: usize = 12;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        reader.read_vec3()
    }
}

/// Decode every record in a lump's bytes.
///
/// # Errors
///
/// Returns [`DecodeError::LumpSizeMismatch`] if `bytes` is not a whole
/// number of records, or any error from reading the records themselves.
pub fn decode_records<T: Record>(bytes: &[u8]) -> DecodeResult<Vec<T>> {
    debug_assert_eq!(T::KIND.record_size(), Some(T::SIZE));

    if !bytes.len().is_multiple_of(T::SIZE) {
        return Err(DecodeError::LumpSizeMismatch {
            lump: T::KIND,
            length: bytes.len(),
            record_size: T::SIZE,
        });
    }

    bytes
        .chunks_exact(T::SIZE)
        .map(|chunk| T::read(&mut RecordReader::new(chunk, T::KIND.name())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_vertices() {
        let mut bytes = Vec::new();
        for v in [1.0_f32, 2.0, 3.0, -4.0, 5.5, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let vertices: Vec<Vec3> = decode_records(&bytes).unwrap();
        assert_eq!(vertices, vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 5.5, 0.0)]);
    }

    #[test]
    fn test_decode_empty_lump() {
        let edges: Vec<Edge> = decode_records(&[]).unwrap();
        assert!(edges.is_empty());
    }

    #[test]
    fn test_decode_size_mismatch() {
        let result = decode_records::<Face>(&[0; 30]);
        assert!(matches!(
            result,
            Err(DecodeError::LumpSizeMismatch {
                lump: LumpKind::Faces,
                length: 30,
                record_size: 20,
            })
        ));
    }

    #[test]
    fn test_record_sizes_match_lump_table() {
        fn check<T: Record>() {
            assert_eq!(T::KIND.record_size(), Some(T::SIZE), "{}", T::KIND);
        }
        check::<Plane>();
        check::<Vec3>();
        check::<Node>();
        check::<TextureInfo>();
        check::<Face>();
        check::<Leaf>();
        check::<LeafFace>();
        check::<LeafBrush>();
        check::<Edge>();
        check::<SurfaceEdge>();
        check::<Model>();
        check::<Brush>();
        check::<BrushSide>();
        check::<Area>();
        check::<AreaPortal>();
    }
}
