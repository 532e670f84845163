//! Face vertex reconstruction and triangulation.

use glam::{IVec2, Vec2, Vec3};

use crate::document::Document;
use crate::error::{DecodeError, DecodeResult, lookup};

/// Texels per light sample along each texture axis.
pub const LIGHTMAP_SCALE: i32 = 16;

/// One corner of a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceVertex {
    /// Index into the document's vertex table.
    pub index: u16,
    pub position: Vec3,
    pub normal: Vec3,
    /// Texture coordinates in texels.
    pub uv: Vec2,
    /// Coordinates within the face's own light block, in `[0, 1]`.
    pub lightmap_uv: Vec2,
}

/// A face's boundary vertices and the light block they map into.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGeometry {
    /// Index of the source face.
    pub face: usize,
    /// Boundary vertices in winding order.
    pub vertices: Vec<FaceVertex>,
    /// Texture-space origin of the light block, a multiple of 16.
    pub tex_min: IVec2,
    /// Texture-space size of the light block, a multiple of 16.
    pub extent: IVec2,
}

impl FaceGeometry {
    /// Number of triangles the face fans into.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        triangle_count(self.vertices.len())
    }

    /// Fan-triangulated vertices, three per triangle.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::DegenerateGeometry`] if the face has fewer than
    /// three vertices.
    pub fn triangulate(&self) -> DecodeResult<Vec<FaceVertex>> {
        if self.vertices.len() < 3 {
            return Err(DecodeError::DegenerateGeometry {
                face: self.face,
                vertices: self.vertices.len(),
            });
        }
        Ok(fan_triangulate(&self.vertices))
    }
}

/// Triangles produced by fanning a polygon of `vertex_count` vertices.
#[must_use]
pub fn triangle_count(vertex_count: usize) -> usize {
    vertex_count.saturating_sub(2)
}

/// Convert a convex polygon into a triangle list by fanning from vertex 0.
///
/// Triangle `k` is `(v[0], v[k + 1], v[k + 2])`. Polygons with fewer than
/// three vertices produce nothing.
#[must_use]
pub fn fan_triangulate<T: Copy>(polygon: &[T]) -> Vec<T> {
    let Some((&root, rest)) = polygon.split_first() else {
        return Vec::new();
    };

    let mut triangles = Vec::with_capacity(triangle_count(polygon.len()) * 3);
    for pair in rest.windows(2) {
        triangles.push(root);
        triangles.push(pair[0]);
        triangles.push(pair[1]);
    }
    triangles
}

/// Quantize a texture-space UV range onto the light sample grid.
///
/// Returns `(tex_min, extent)` where `tex_min = floor(min / 16) * 16` and
/// `extent = (ceil(max / 16) - floor(min / 16)) * 16`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn light_block_bounds(uv_min: Vec2, uv_max: Vec2) -> (IVec2, IVec2) {
    let scale = LIGHTMAP_SCALE as f32;
    let block_min = (uv_min / scale).floor();
    let block_max = (uv_max / scale).ceil();
    let tex_min = block_min.as_ivec2() * LIGHTMAP_SCALE;
    let extent = (block_max - block_min).as_ivec2() * LIGHTMAP_SCALE;
    (tex_min, extent)
}

/// Reconstruct the boundary vertices of a face.
///
/// Each surface edge contributes the vertex at the end of its edge selected
/// by the sign of the surface edge. Normals come from the face's plane and
/// are flipped for back-side faces.
///
/// # Errors
///
/// Returns [`DecodeError::IndexOutOfBounds`] if the face, or anything it
/// references, does not exist.
pub fn build_face(document: &Document, face_index: usize) -> DecodeResult<FaceGeometry> {
    let face = lookup(document.faces(), face_index, "face")?;
    let plane = lookup(document.planes(), face.plane, "plane")?;
    let texture = lookup(document.texture_infos(), face.texture_info, "texture info")?;

    let normal = if face.is_back_side() {
        -plane.normal
    } else {
        plane.normal
    };

    let first = i64::from(face.first_edge);
    let count = i64::from(face.edge_count.max(0));
    let mut vertices = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
    let mut uv_min = Vec2::splat(f32::MAX);
    let mut uv_max = Vec2::splat(f32::MIN);

    for i in first..first + count {
        let surface_edge = *lookup(document.surface_edges(), i, "surface edge")?;
        let edge = lookup(document.edges(), surface_edge.edge_index(), "edge")?;
        let index = edge.vertex(surface_edge.endpoint());
        let position = *lookup(document.vertices(), index, "vertex")?;

        let uv = texture.project(position);
        uv_min = uv_min.min(uv);
        uv_max = uv_max.max(uv);

        vertices.push(FaceVertex {
            index,
            position,
            normal,
            uv,
            lightmap_uv: Vec2::ZERO,
        });
    }

    if vertices.is_empty() {
        return Ok(FaceGeometry {
            face: face_index,
            vertices,
            tex_min: IVec2::ZERO,
            extent: IVec2::ZERO,
        });
    }

    let (tex_min, extent) = light_block_bounds(uv_min, uv_max);
    let origin = tex_min.as_vec2();
    let size = extent.as_vec2();
    for vertex in &mut vertices {
        let local = vertex.uv - origin;
        vertex.lightmap_uv = Vec2::new(
            if size.x > 0.0 { local.x / size.x } else { 0.0 },
            if size.y > 0.0 { local.y / size.y } else { 0.0 },
        );
    }

    Ok(FaceGeometry {
        face: face_index,
        vertices,
        tex_min,
        extent,
    })
}
