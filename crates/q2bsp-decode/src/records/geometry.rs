//! Planes, edges and surface edges.

use glam::Vec3;

use super::Record;
use crate::error::DecodeResult;
use crate::header::LumpKind;
use crate::reader::RecordReader;

/// A plane `dot(normal, p) == distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
    /// Axial classification used by the compiler (0-2 axial, 3-5 nearest axis).
    pub kind: i32,
}

impl Plane {
    /// Signed distance from `point` to the plane.
    #[must_use]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

impl Record for Plane {
    const KIND: LumpKind = LumpKind::Planes;
    const SIZE: usize = 20;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            normal: reader.read_vec3()?,
            distance: reader.read_f32()?,
            kind: reader.read_i32()?,
        })
    }
}

/// Which end of an [`Edge`] a surface edge starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEndpoint {
    First,
    Second,
}

/// A pair of vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub vertices: [u16; 2],
}

impl Edge {
    /// Vertex index at the given end of the edge.
    #[must_use]
    pub fn vertex(&self, endpoint: EdgeEndpoint) -> u16 {
        match endpoint {
            EdgeEndpoint::First => self.vertices[0],
            EdgeEndpoint::Second => self.vertices[1],
        }
    }
}

impl Record for Edge {
    const KIND: LumpKind = LumpKind::Edges;
    const SIZE: usize = 4;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            vertices: [reader.read_u16()?, reader.read_u16()?],
        })
    }
}

/// A signed reference into the edge table.
///
/// The magnitude selects the edge. The sign selects which end of the edge
/// begins the face's boundary walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceEdge(pub i32);

impl SurfaceEdge {
    /// Index into the edge table.
    #[must_use]
    pub fn edge_index(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// The edge end this surface edge starts from.
    ///
    /// Positive ids walk the edge forwards. Zero and negative ids walk it
    /// backwards.
    #[must_use]
    pub fn endpoint(self) -> EdgeEndpoint {
        if self.0 > 0 {
            EdgeEndpoint::First
        } else {
            EdgeEndpoint::Second
        }
    }
}

impl Record for SurfaceEdge {
    const KIND: LumpKind = LumpKind::SurfaceEdges;
    const SIZE: usize = 4;

    fn read(reader: &mut RecordReader<'_>) -> DecodeResult<Self> {
        reader.read_i32().map(Self)
    }
}
