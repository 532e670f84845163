//! The decoded contents of a BSP file.

use std::ops::Range;

use glam::Vec3;

use crate::entities;
use crate::error::{DecodeError, DecodeResult, lookup};
use crate::header::{Header, LumpKind};
use crate::records::{
    Area, AreaPortal, Brush, BrushSide, Edge, Face, Leaf, LeafBrush, LeafFace, Model, Node,
    NodeChild, Plane, SurfaceEdge, TextureInfo, decode_records,
};

/// Every lump of a BSP file, decoded.
///
/// A `Document` is only produced by [`decode_document`] and cannot be
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    entities: String,
    planes: Vec<Plane>,
    vertices: Vec<Vec3>,
    visibility: Vec<u8>,
    nodes: Vec<Node>,
    texture_infos: Vec<TextureInfo>,
    faces: Vec<Face>,
    lighting: Vec<u8>,
    leaves: Vec<Leaf>,
    leaf_faces: Vec<LeafFace>,
    leaf_brushes: Vec<LeafBrush>,
    edges: Vec<Edge>,
    surface_edges: Vec<SurfaceEdge>,
    models: Vec<Model>,
    brushes: Vec<Brush>,
    brush_sides: Vec<BrushSide>,
    areas: Vec<Area>,
    area_portals: Vec<AreaPortal>,
}

/// Decode a complete BSP file held in memory.
///
/// # Errors
///
/// Returns an error if the header is invalid, any lump lies outside
/// `data`, or any lump is not a whole number of records. No partial
/// document is returned.
pub fn decode_document(data: &[u8]) -> DecodeResult<Document> {
    let header = Header::parse(data)?;

    let bytes = |kind: LumpKind| header.lump_bytes(data, kind);

    let entities_raw = bytes(LumpKind::Entities)?;
    let entities = String::from_utf8_lossy(entities_raw)
        .trim_end_matches('\0')
        .to_owned();

    // The pop lump is unused by version 38 tools, but its range is still
    // validated with the rest of the directory.
    bytes(LumpKind::Pop)?;

    Ok(Document {
        entities,
        planes: decode_records(bytes(LumpKind::Planes)?)?,
        vertices: decode_records(bytes(LumpKind::Vertices)?)?,
        visibility: bytes(LumpKind::Visibility)?.to_vec(),
        nodes: decode_records(bytes(LumpKind::Nodes)?)?,
        texture_infos: decode_records(bytes(LumpKind::TextureInfo)?)?,
        faces: decode_records(bytes(LumpKind::Faces)?)?,
        lighting: bytes(LumpKind::Lighting)?.to_vec(),
        leaves: decode_records(bytes(LumpKind::Leaves)?)?,
        leaf_faces: decode_records(bytes(LumpKind::LeafFaces)?)?,
        leaf_brushes: decode_records(bytes(LumpKind::LeafBrushes)?)?,
        edges: decode_records(bytes(LumpKind::Edges)?)?,
        surface_edges: decode_records(bytes(LumpKind::SurfaceEdges)?)?,
        models: decode_records(bytes(LumpKind::Models)?)?,
        brushes: decode_records(bytes(LumpKind::Brushes)?)?,
        brush_sides: decode_records(bytes(LumpKind::BrushSides)?)?,
        areas: decode_records(bytes(LumpKind::Areas)?)?,
        area_portals: decode_records(bytes(LumpKind::AreaPortals)?)?,
    })
}

impl Document {
    /// Raw entity text.
    #[must_use]
    pub fn entities(&self) -> &str {
        &self.entities
    }

    /// Sky box name from the worldspawn entity, if any.
    #[must_use]
    pub fn sky(&self) -> Option<&str> {
        entities::sky_name(&self.entities)
    }

    #[must_use]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Compressed PVS data, kept as raw bytes.
    #[must_use]
    pub fn visibility(&self) -> &[u8] {
        &self.visibility
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn texture_infos(&self) -> &[TextureInfo] {
        &self.texture_infos
    }

    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Raw light samples addressed by [`Face::light_offset`].
    #[must_use]
    pub fn lighting(&self) -> &[u8] {
        &self.lighting
    }

    #[must_use]
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    #[must_use]
    pub fn leaf_faces(&self) -> &[LeafFace] {
        &self.leaf_faces
    }

    #[must_use]
    pub fn leaf_brushes(&self) -> &[LeafBrush] {
        &self.leaf_brushes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn surface_edges(&self) -> &[SurfaceEdge] {
        &self.surface_edges
    }

    #[must_use]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    #[must_use]
    pub fn brushes(&self) -> &[Brush] {
        &self.brushes
    }

    #[must_use]
    pub fn brush_sides(&self) -> &[BrushSide] {
        &self.brush_sides
    }

    #[must_use]
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    #[must_use]
    pub fn area_portals(&self) -> &[AreaPortal] {
        &self.area_portals
    }

    /// Face indices belonging to a model.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::IndexOutOfBounds`] if the model does not exist
    /// or its face range exceeds the face lump.
    pub fn model_faces(&self, model: usize) -> DecodeResult<Range<usize>> {
        let m = lookup(&self.models, model, "model")?;
        checked_range(m.first_face, m.face_count, self.faces.len(), "model face")
    }

    /// Texture info of a face.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::IndexOutOfBounds`] if the face or its texture
    /// info does not exist.
    pub fn face_texture(&self, face: usize) -> DecodeResult<&TextureInfo> {
        let f = lookup(&self.faces, face, "face")?;
        lookup(&self.texture_infos, f.texture_info, "texture info")
    }

    /// Planes bounding a brush, in side order.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::IndexOutOfBounds`] if the brush, any of its
    /// sides, or any side's plane does not exist.
    pub fn brush_planes(&self, brush: usize) -> DecodeResult<Vec<Plane>> {
        let b = lookup(&self.brushes, brush, "brush")?;
        let sides = checked_range(
            b.first_side,
            b.side_count,
            self.brush_sides.len(),
            "brush side",
        )?;
        self.brush_sides[sides]
            .iter()
            .map(|side| lookup(&self.planes, side.plane, "plane").copied())
            .collect()
    }

    /// First leaf whose face list contains `face`.
    ///
    /// Leaves with face ranges outside the leaf-face lump are ignored.
    #[must_use]
    pub fn find_containing_leaf(&self, face: usize) -> Option<usize> {
        self.leaves.iter().position(|leaf| {
            let start = usize::from(leaf.first_leaf_face);
            let end = start + usize::from(leaf.leaf_face_count);
            self.leaf_faces
                .get(start..end)
                .is_some_and(|list| list.iter().any(|lf| usize::from(lf.0) == face))
        })
    }

    /// Leaves reachable from a model's head node, each listed once.
    ///
    /// The tree is walked depth first, front child before back child.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::IndexOutOfBounds`] if the model, a node or a
    /// leaf reference is invalid.
    pub fn model_leaves(&self, model: usize) -> DecodeResult<Vec<usize>> {
        let m = lookup(&self.models, model, "model")?;

        let mut seen_nodes = vec![false; self.nodes.len()];
        let mut seen_leaves = vec![false; self.leaves.len()];
        let mut result = Vec::new();
        let mut stack = vec![NodeChild::from_raw(m.head_node)];

        while let Some(child) = stack.pop() {
            match child {
                NodeChild::Leaf(index) => {
                    lookup(&self.leaves, index, "leaf")?;
                    if !seen_leaves[index] {
                        seen_leaves[index] = true;
                        result.push(index);
                    }
                }
                NodeChild::Node(index) => {
                    let node = lookup(&self.nodes, index, "node")?;
                    // Compiled trees never share nodes; this only guards
                    // against cycles in corrupt files.
                    if seen_nodes[index] {
                        continue;
                    }
                    seen_nodes[index] = true;
                    let [front, back] = node.child_nodes();
                    stack.push(back);
                    stack.push(front);
                }
            }
        }

        Ok(result)
    }
}

/// Validate a `(first, count)` pair against a table of `len` entries.
fn checked_range(
    first: i32,
    count: i32,
    len: usize,
    context: &'static str,
) -> DecodeResult<Range<usize>> {
    let error = DecodeError::IndexOutOfBounds {
        context,
        index: i64::from(first) + i64::from(count),
        len,
    };
    let start = usize::try_from(first).map_err(|_| error.clone())?;
    let count = usize::try_from(count).map_err(|_| error.clone())?;
    let end = start + count;
    if end > len {
        return Err(error);
    }
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{BspWriter, unit_square};

    #[test]
    fn test_decode_counts() {
        let data = unit_square().finish();
        let doc = decode_document(&data).unwrap();

        assert_eq!(doc.vertices().len(), 4);
        assert_eq!(doc.edges().len(), 5);
        assert_eq!(doc.surface_edges().len(), 4);
        assert_eq!(doc.faces().len(), 1);
        assert_eq!(doc.texture_infos().len(), 1);
        assert_eq!(doc.models().len(), 1);
        assert_eq!(doc.texture_infos()[0].name, "e1u1/floor3_1");
        assert_eq!(doc.sky(), Some("unit1_"));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let data = unit_square().finish();
        assert_eq!(decode_document(&data).unwrap(), decode_document(&data).unwrap());
    }

    #[test]
    fn test_empty_document() {
        let data = BspWriter::default().finish();
        let doc = decode_document(&data).unwrap();
        assert!(doc.faces().is_empty());
        assert!(doc.entities().is_empty());
        assert_eq!(doc.sky(), None);
    }

    #[test]
    fn test_truncated_lump() {
        let mut data = unit_square().finish();
        data.truncate(data.len() - 1);
        assert!(matches!(
            decode_document(&data),
            Err(DecodeError::LumpOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_misaligned_lump() {
        let data = BspWriter::default()
            .raw(LumpKind::Faces, vec![0; 21])
            .finish();
        assert!(matches!(
            decode_document(&data),
            Err(DecodeError::LumpSizeMismatch {
                lump: LumpKind::Faces,
                ..
            })
        ));
    }

    #[test]
    fn test_model_faces() {
        let doc = decode_document(&unit_square().finish()).unwrap();
        assert_eq!(doc.model_faces(0).unwrap(), 0..1);
        assert!(matches!(
            doc.model_faces(1),
            Err(DecodeError::IndexOutOfBounds { context: "model", .. })
        ));
    }

    #[test]
    fn test_model_leaves_and_containing_leaf() {
        let doc = decode_document(&unit_square().finish()).unwrap();
        // Head node 0 splits into leaf 1 (front) and leaf 0 (back).
        assert_eq!(doc.model_leaves(0).unwrap(), vec![1, 0]);
        assert_eq!(doc.find_containing_leaf(0), Some(1));
        assert_eq!(doc.find_containing_leaf(5), None);
    }

    #[test]
    fn test_face_texture() {
        let mut writer = unit_square();
        let doc = decode_document(&writer.finish()).unwrap();
        assert_eq!(doc.face_texture(0).unwrap().name, "e1u1/floor3_1");

        writer.faces[0].texture_info = 3;
        let doc = decode_document(&writer.finish()).unwrap();
        assert!(matches!(
            doc.face_texture(0),
            Err(DecodeError::IndexOutOfBounds {
                context: "texture info",
                index: 3,
                len: 1
            })
        ));
    }

    #[test]
    fn test_brush_planes() {
        let doc = decode_document(&unit_square().finish()).unwrap();
        let planes = doc.brush_planes(0).unwrap();
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].normal, Vec3::Z);
    }

    #[test]
    fn test_checked_range_rejects_negative() {
        assert!(checked_range(-1, 2, 10, "x").is_err());
        assert!(checked_range(0, -2, 10, "x").is_err());
        assert!(checked_range(8, 3, 10, "x").is_err());
        assert_eq!(checked_range(8, 2, 10, "x").unwrap(), 8..10);
    }
}
