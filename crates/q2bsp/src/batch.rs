//! Grouping faces into draw batches.
//!
//! Faces of a model that share a texture, surface flags and light styles
//! can be drawn with one call. Each group's triangles are written into a
//! contiguous range of the model's vertex buffer.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use q2bsp_decode::{Document, build_face, records::SurfaceFlags, triangle_count};

use crate::atlas::LightmapAtlas;
use crate::config::LevelConfig;
use crate::error::Result;
use crate::texture::{TextureCache, TextureHandle};

/// A vertex ready for upload.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Texture coordinates, one unit per texture repeat.
    pub uv: Vec2,
    /// Atlas coordinates. Only meaningful for batches with a lightmap.
    pub lightmap_uv: Vec2,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// A box containing nothing. Extending it by a point yields that point.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// What faces must share to be drawn together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    /// Lowercase texture name.
    pub texture: String,
    pub flags: SurfaceFlags,
    /// The four style bytes, first style in the low byte.
    pub styles: u32,
}

/// A run of vertices drawn with one texture and lightmap style set.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBatch {
    pub texture: TextureHandle,
    pub texture_name: String,
    pub flags: SurfaceFlags,
    pub styles: [u8; 4],
    /// Whether the vertices carry atlas coordinates.
    pub has_lightmap: bool,
    /// First vertex in the model's vertex buffer.
    pub offset: usize,
    /// Number of vertices, three per triangle.
    pub count: usize,
    pub bounds: Aabb,
    /// Source faces, including degenerate ones that produced no vertices.
    pub faces: Vec<usize>,
}

/// The batched geometry of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBatches {
    pub model: usize,
    /// Triangle-list vertices shared by every batch of the model.
    pub vertices: Vec<Vertex>,
    /// Batches in the order their first face appears in the model.
    pub batches: Vec<FaceBatch>,
}

impl ModelBatches {
    /// Bounds of every batch combined.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for batch in self.batches.iter().filter(|b| !b.bounds.is_empty()) {
            bounds.extend(batch.bounds.min);
            bounds.extend(batch.bounds.max);
        }
        bounds
    }

    /// Vertices belonging to one batch.
    #[must_use]
    pub fn batch_vertices(&self, batch: &FaceBatch) -> &[Vertex] {
        self.vertices
            .get(batch.offset..batch.offset + batch.count)
            .unwrap_or_default()
    }
}

/// Builds [`ModelBatches`] for the models of one document.
pub struct FaceBatcher<'a> {
    document: &'a Document,
    textures: &'a dyn TextureCache,
    config: &'a LevelConfig,
}

impl<'a> FaceBatcher<'a> {
    #[must_use]
    pub fn new(
        document: &'a Document,
        textures: &'a dyn TextureCache,
        config: &'a LevelConfig,
    ) -> Self {
        Self {
            document,
            textures,
            config,
        }
    }

    /// Group a model's drawable faces by [`GroupKey`] in first-seen order.
    ///
    /// Faces flagged `NODRAW` or `SKY` are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the model, one of its faces or a face's texture
    /// info does not exist.
    pub fn group_faces(&self, model: usize) -> Result<Vec<(GroupKey, Vec<usize>)>> {
        let mut groups: Vec<(GroupKey, Vec<usize>)> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();

        for face_index in self.document.model_faces(model)? {
            let texture = self.document.face_texture(face_index)?;
            if !texture.flags.is_drawable() {
                continue;
            }

            let face = &self.document.faces()[face_index];
            let key = GroupKey {
                texture: texture.name.clone(),
                flags: texture.flags,
                styles: face.packed_styles(),
            };
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push((key, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(face_index);
        }

        Ok(groups)
    }

    /// Batch one model, placing the light blocks of its lit faces in
    /// `atlas`.
    ///
    /// Faces with fewer than three vertices are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the model references missing data, a face's light
    /// samples are truncated, or the atlas runs out of space.
    pub fn batch_model(&self, model: usize, atlas: &mut LightmapAtlas) -> Result<ModelBatches> {
        let groups = self.group_faces(model)?;
        let coords = self.config.coordinate_system;

        let capacity = groups
            .iter()
            .flat_map(|(_, faces)| faces)
            .map(|&f| {
                let edges = self.document.faces()[f].edge_count.max(0).unsigned_abs();
                triangle_count(usize::from(edges)) * 3
            })
            .sum();
        let mut vertices = Vec::with_capacity(capacity);
        let mut batches = Vec::with_capacity(groups.len());

        for (key, faces) in groups {
            let texture = self.textures.resolve_or_fallback(&key.texture);
            let uv_scale = texture.uv_scale();
            let has_lightmap = key.flags.has_lightmap();
            let offset = vertices.len();
            let mut bounds = Aabb::empty();

            for &face_index in &faces {
                let geometry = build_face(self.document, face_index)?;
                let Ok(triangles) = geometry.triangulate() else {
                    tracing::trace!(
                        face = face_index,
                        vertices = geometry.vertices.len(),
                        "skipping degenerate face"
                    );
                    continue;
                };

                let lightmap = if has_lightmap {
                    match atlas.allocate_face(self.document, &geometry) {
                        Ok(transform) => Some(transform),
                        Err(e) => {
                            tracing::debug!(
                                model,
                                face = face_index,
                                error = %e,
                                "lightmap allocation failed"
                            );
                            return Err(e);
                        }
                    }
                } else {
                    None
                };

                for v in triangles {
                    let position = coords.convert(v.position);
                    bounds.extend(position);
                    vertices.push(Vertex {
                        position,
                        normal: coords.convert(v.normal),
                        uv: v.uv * uv_scale,
                        lightmap_uv: lightmap.map_or(v.lightmap_uv, |t| t.apply(v.lightmap_uv)),
                    });
                }
            }

            batches.push(FaceBatch {
                texture,
                texture_name: key.texture,
                flags: key.flags,
                styles: key.styles.to_le_bytes(),
                has_lightmap,
                offset,
                count: vertices.len() - offset,
                bounds,
                faces,
            });
        }

        tracing::debug!(
            model,
            batches = batches.len(),
            vertices = vertices.len(),
            "batched model"
        );

        Ok(ModelBatches {
            model,
            vertices,
            batches,
        })
    }
}
