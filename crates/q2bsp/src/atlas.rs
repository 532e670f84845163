//! Lightmap atlas packing.
//!
//! Light blocks are packed greedily into rows ("shelves") of a single
//! square atlas in the order faces are visited. Blocks are never moved or
//! freed, and the atlas never grows: once a block does not fit, the load
//! fails.

use glam::{IVec2, UVec2, Vec2};
use q2bsp_decode::{
    Document, FaceGeometry, LIGHTMAP_SCALE, decode_light_samples,
    lighting::{BLACK, Rgba},
    lightmap_size,
};

use crate::config::LevelConfig;
use crate::error::{Error, ExhaustedReason, Result};

/// A placed block, in atlas texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Top-left corner.
    pub origin: UVec2,
    /// Block size, one texel per light sample.
    pub size: UVec2,
}

impl Placement {
    /// Whether two placements share any texel.
    #[must_use]
    pub fn overlaps(&self, other: &Placement) -> bool {
        let a_max = self.origin + self.size;
        let b_max = other.origin + other.size;
        self.origin.cmplt(b_max).all() && other.origin.cmplt(a_max).all()
    }
}

/// Append-only shelf packer for one square atlas.
///
/// The cursor starts at `(padding, padding)`. Each block goes to the right
/// of the previous one while the row has room, otherwise it starts a new
/// row below the tallest block of the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfAllocator {
    size: u32,
    padding: u32,
    cursor: UVec2,
    row_height: u32,
}

impl ShelfAllocator {
    #[must_use]
    pub fn new(size: u32, padding: u32) -> Self {
        Self {
            size,
            padding,
            cursor: UVec2::splat(padding),
            row_height: padding,
        }
    }

    /// Forget every placement.
    pub fn reset(&mut self) {
        self.cursor = UVec2::splat(self.padding);
        self.row_height = self.padding;
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[must_use]
    pub fn padding(&self) -> u32 {
        self.padding
    }

    /// Where the next block in the current row would go.
    #[must_use]
    pub fn cursor(&self) -> UVec2 {
        self.cursor
    }

    /// Height of the current row including padding.
    #[must_use]
    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    /// Texel rows covered by placed blocks, including the current row.
    #[must_use]
    pub fn used_height(&self) -> u32 {
        (self.cursor.y + self.row_height).min(self.size)
    }

    /// Block size for `extent`, if a block that size fits in an empty atlas.
    ///
    /// A block needs `padding` texels on both sides along each axis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationExhausted`] with
    /// [`ExhaustedReason::BlockTooLarge`] if it never fits.
    pub fn check(&self, extent: IVec2) -> Result<UVec2> {
        let block = lightmap_size(extent);
        let padded = block.saturating_add(UVec2::splat(self.padding.saturating_mul(2)));
        if padded.cmpge(UVec2::splat(self.size)).any() {
            return Err(Error::AllocationExhausted {
                requested: block,
                atlas_size: self.size,
                reason: ExhaustedReason::BlockTooLarge,
            });
        }
        Ok(block)
    }

    /// Place a block for a face whose light block spans `extent` texels.
    ///
    /// The extent is first quantized to one sample per 16 texels plus one.
    /// On failure the allocator is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationExhausted`] if the padded block is as large
    /// as the atlas or no space is left for it.
    pub fn allocate(&mut self, extent: IVec2) -> Result<Placement> {
        let block = self.check(extent)?;
        let atlas_size = self.size;
        let pad = self.padding;
        let exhausted = |reason| Error::AllocationExhausted {
            requested: block,
            atlas_size,
            reason,
        };

        if self.cursor.y + block.y + pad * 2 >= atlas_size {
            return Err(exhausted(ExhaustedReason::AtlasFull));
        }

        let mut cursor = self.cursor;
        let mut row_height = self.row_height;
        let origin = if cursor.x + block.x + pad * 2 >= atlas_size {
            cursor.y += row_height + pad;
            cursor.x = pad + block.x;
            row_height = block.y + pad;
            if cursor.y + block.y + pad * 2 >= atlas_size {
                return Err(exhausted(ExhaustedReason::AtlasFull));
            }
            UVec2::new(pad, cursor.y)
        } else {
            let origin = cursor;
            cursor.x += block.x + pad;
            origin
        };
        row_height = row_height.max(block.y + pad);

        self.cursor = cursor;
        self.row_height = row_height;
        Ok(Placement {
            origin,
            size: block,
        })
    }
}

/// Maps a face's block-local lightmap coordinates into atlas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub offset: Vec2,
    pub scale: Vec2,
}

impl UvTransform {
    /// Transform for a block placed at `placement`.
    ///
    /// The block is inset by half a texel on each side so bilinear
    /// filtering does not sample neighbouring blocks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_placement(placement: &Placement, extent: IVec2, atlas_size: u32) -> Self {
        let size = atlas_size as f32;
        let texel = 1.0 / size;
        let scale = LIGHTMAP_SCALE as f32;
        Self {
            offset: placement.origin.as_vec2() / size + Vec2::splat(texel * 0.5),
            scale: (extent.as_vec2() + Vec2::splat(scale)) / (size * scale) - Vec2::splat(texel),
        }
    }

    #[must_use]
    pub fn apply(&self, uv: Vec2) -> Vec2 {
        self.offset + uv * self.scale
    }
}

/// One face's light samples and where they live in the atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasBlock {
    pub face: usize,
    pub placement: Placement,
    /// Number of styles with real samples, 0 to 4.
    pub style_count: usize,
    /// Row-major RGBA samples, one vector per atlas layer.
    pub layers: Vec<Vec<Rgba>>,
}

/// A layered lightmap atlas and the blocks placed in it.
///
/// Each layer holds one light style, so a face with two styles writes its
/// samples into layers 0 and 1 at the same position and leaves the other
/// layers black.
#[derive(Debug, Clone)]
pub struct LightmapAtlas {
    allocator: ShelfAllocator,
    layer_count: usize,
    blocks: Vec<AtlasBlock>,
}

impl LightmapAtlas {
    #[must_use]
    pub fn new(config: &LevelConfig) -> Self {
        Self {
            allocator: ShelfAllocator::new(config.atlas_size, config.padding),
            layer_count: config.lightmap_layers,
            blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        self.allocator.size()
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    #[must_use]
    pub fn allocator(&self) -> &ShelfAllocator {
        &self.allocator
    }

    #[must_use]
    pub fn blocks(&self) -> &[AtlasBlock] {
        &self.blocks
    }

    /// Decode a face's light samples, place them and return the transform
    /// for its lightmap coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist, its samples run past the
    /// lighting lump, or the atlas has no room for the block. Nothing is
    /// placed on failure.
    pub fn allocate_face(
        &mut self,
        document: &Document,
        geometry: &FaceGeometry,
    ) -> Result<UvTransform> {
        let face = document.faces().get(geometry.face).ok_or(
            q2bsp_decode::DecodeError::IndexOutOfBounds {
                context: "face",
                index: i64::try_from(geometry.face).unwrap_or(i64::MAX),
                len: document.faces().len(),
            },
        )?;

        self.allocator.check(geometry.extent)?;
        let samples = decode_light_samples(
            document.lighting(),
            face.light_offset,
            geometry.extent,
            face.styles,
            self.layer_count,
        )?;
        let placement = self.allocator.allocate(geometry.extent)?;

        self.blocks.push(AtlasBlock {
            face: geometry.face,
            placement,
            style_count: samples.style_count,
            layers: samples.layers,
        });
        Ok(UvTransform::for_placement(
            &placement,
            geometry.extent,
            self.allocator.size(),
        ))
    }

    /// Compose one layer into a `size * size` RGBA image.
    ///
    /// Texels outside every block are black. Returns `None` if the layer
    /// does not exist.
    #[must_use]
    pub fn layer_pixels(&self, layer: usize) -> Option<Vec<Rgba>> {
        if layer >= self.layer_count {
            return None;
        }

        let size = self.size() as usize;
        let mut pixels = vec![BLACK; size * size];
        for block in &self.blocks {
            let Some(samples) = block.layers.get(layer) else {
                continue;
            };
            let (x, y) = (
                block.placement.origin.x as usize,
                block.placement.origin.y as usize,
            );
            let width = block.placement.size.x as usize;
            for (row, line) in samples.chunks_exact(width).enumerate() {
                let start = (y + row) * size + x;
                pixels[start..start + width].copy_from_slice(line);
            }
        }
        Some(pixels)
    }

    /// Remove every block and rewind the allocator.
    pub fn clear(&mut self) {
        self.allocator.reset();
        self.blocks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use q2bsp_decode::{build_face, decode_document, fixture::unit_square};

    #[test]
    fn test_placement_with_padding() {
        let mut allocator = ShelfAllocator::new(128, 1);
        let first = allocator.allocate(IVec2::new(32, 32)).unwrap();
        let second = allocator.allocate(IVec2::new(32, 32)).unwrap();

        assert_eq!(first.origin, UVec2::new(1, 1));
        assert_eq!(first.size, UVec2::new(3, 3));
        assert_eq!(second.origin.x, first.origin.x + 32 / 16 + 1 + 1);
        assert_eq!(second.origin.y, first.origin.y);
    }

    #[test]
    fn test_row_wrap() {
        let mut allocator = ShelfAllocator::new(12, 0);
        // 5 samples wide: two fit in a row, the third wraps.
        let a = allocator.allocate(IVec2::new(64, 16)).unwrap();
        let b = allocator.allocate(IVec2::new(64, 32)).unwrap();
        let c = allocator.allocate(IVec2::new(64, 0)).unwrap();

        assert_eq!(a.origin, UVec2::new(0, 0));
        assert_eq!(b.origin, UVec2::new(5, 0));
        // Row height is the tallest block in the row.
        assert_eq!(c.origin, UVec2::new(0, 3));
        assert_eq!(allocator.cursor(), UVec2::new(5, 3));
        assert_eq!(allocator.row_height(), 1);
    }

    #[test]
    fn test_oversize_block_does_not_mutate() {
        let mut allocator = ShelfAllocator::new(128, 1);
        allocator.allocate(IVec2::new(32, 32)).unwrap();
        let before = allocator.clone();

        let err = allocator.allocate(IVec2::new(128 * 16, 16)).unwrap_err();
        assert!(matches!(
            err,
            Error::AllocationExhausted {
                reason: ExhaustedReason::BlockTooLarge,
                atlas_size: 128,
                ..
            }
        ));
        assert_eq!(allocator, before);
    }

    #[test]
    fn test_padded_block_stays_inside_atlas() {
        let config = LevelConfig::default().with_atlas_size(12).with_padding(2);
        assert!(config.validate().is_ok());

        // 11 samples wide: fits the atlas alone but not with padding.
        let mut allocator = ShelfAllocator::new(12, 2);
        assert!(matches!(
            allocator.allocate(IVec2::new(160, 0)),
            Err(Error::AllocationExhausted {
                reason: ExhaustedReason::BlockTooLarge,
                ..
            })
        ));
        assert_eq!(allocator, ShelfAllocator::new(12, 2));

        let mut allocator = ShelfAllocator::new(16, 2);
        allocator.allocate(IVec2::new(16, 16)).unwrap();
        let before = allocator.clone();
        assert!(allocator.allocate(IVec2::new(192, 0)).is_err());
        assert_eq!(allocator, before);

        // The widest block that fits still stays inside after a row wrap.
        let placement = allocator.allocate(IVec2::new(160, 0)).unwrap();
        assert_eq!(placement.origin, UVec2::new(2, 8));
        assert!(placement.origin.x + placement.size.x <= 16 - 2);
        let far = UvTransform::for_placement(&placement, IVec2::new(160, 0), 16)
            .apply(Vec2::ONE);
        assert!(far.cmple(Vec2::ONE).all());
    }

    #[test]
    fn test_full_atlas_does_not_mutate() {
        let mut allocator = ShelfAllocator::new(8, 0);
        // 7x4 samples each: the first fills a row, the second wraps and
        // runs out of vertical space.
        allocator.allocate(IVec2::new(96, 48)).unwrap();
        let before = allocator.clone();
        assert!(matches!(
            allocator.allocate(IVec2::new(96, 48)),
            Err(Error::AllocationExhausted {
                reason: ExhaustedReason::AtlasFull,
                ..
            })
        ));
        assert_eq!(allocator, before);
    }

    #[test]
    fn test_reset() {
        let mut allocator = ShelfAllocator::new(64, 2);
        allocator.allocate(IVec2::new(16, 16)).unwrap();
        allocator.reset();
        assert_eq!(allocator, ShelfAllocator::new(64, 2));
    }

    #[test]
    fn test_uv_transform() {
        let placement = Placement {
            origin: UVec2::new(8, 16),
            size: UVec2::new(5, 5),
        };
        let transform = UvTransform::for_placement(&placement, IVec2::new(64, 64), 64);
        assert_eq!(transform.offset, Vec2::new(8.5 / 64.0, 16.5 / 64.0));
        assert_eq!(transform.apply(Vec2::ZERO), transform.offset);
        let far = transform.apply(Vec2::ONE);
        assert!((far.x - 12.5 / 64.0).abs() < 1e-6);
        assert!((far.y - 20.5 / 64.0).abs() < 1e-6);
    }

    #[test]
    fn test_allocate_face_and_compose() {
        let doc = decode_document(&unit_square().finish()).unwrap();
        let geometry = build_face(&doc, 0).unwrap();
        let config = LevelConfig::default().with_atlas_size(16).with_lightmap_layers(2);
        let mut atlas = LightmapAtlas::new(&config);

        let transform = atlas.allocate_face(&doc, &geometry).unwrap();
        assert_eq!(transform.offset, Vec2::splat(0.5 / 16.0));

        let block = &atlas.blocks()[0];
        assert_eq!(block.placement.size, UVec2::new(5, 5));
        assert_eq!(block.style_count, 1);
        // Samples are stored BGR; the fixture writes (i, 2i, 3i).
        assert_eq!(block.layers[0][1], [3, 2, 1, 255]);

        let layer0 = atlas.layer_pixels(0).unwrap();
        assert_eq!(layer0.len(), 16 * 16);
        assert_eq!(layer0[0], [0, 0, 0, 255]);
        // Sample 6 is row 1, column 1.
        assert_eq!(layer0[16 + 1], [18, 12, 6, 255]);
        // Past the block is untouched.
        assert_eq!(layer0[5], BLACK);

        assert!(atlas.layer_pixels(1).unwrap().iter().all(|&p| p == BLACK));
        assert_eq!(atlas.layer_pixels(2), None);

        atlas.clear();
        assert!(atlas.blocks().is_empty());
        assert_eq!(atlas.allocator().cursor(), UVec2::ZERO);
    }

    #[test]
    fn test_allocate_face_huge_extent() {
        let doc = decode_document(&unit_square().finish()).unwrap();
        let mut geometry = build_face(&doc, 0).unwrap();
        geometry.extent = IVec2::splat(16 * 70_000);
        let mut atlas = LightmapAtlas::new(&LevelConfig::default());

        assert!(matches!(
            atlas.allocate_face(&doc, &geometry),
            Err(Error::AllocationExhausted {
                reason: ExhaustedReason::BlockTooLarge,
                ..
            })
        ));
        assert!(atlas.blocks().is_empty());
        assert_eq!(atlas.allocator().cursor(), UVec2::ZERO);
    }

    #[test]
    fn test_allocate_face_without_room() {
        let doc = decode_document(&unit_square().finish()).unwrap();
        let geometry = build_face(&doc, 0).unwrap();
        let mut atlas = LightmapAtlas::new(&LevelConfig::default().with_atlas_size(4));

        assert!(matches!(
            atlas.allocate_face(&doc, &geometry),
            Err(Error::AllocationExhausted { .. })
        ));
        assert!(atlas.blocks().is_empty());
    }

    proptest! {
        #[test]
        fn prop_placements_never_overlap(
            extents in prop::collection::vec((0_i32..72, 0_i32..72), 1..64),
            padding in 0_u32..5,
            size in 16_u32..80,
        ) {
            let mut allocator = ShelfAllocator::new(size, padding);
            let mut placed: Vec<Placement> = Vec::new();

            for (w, h) in extents {
                let extent = IVec2::new(w, h) * 16;
                let placement = match allocator.allocate(extent) {
                    Ok(placement) => placement,
                    Err(Error::AllocationExhausted {
                        reason: ExhaustedReason::BlockTooLarge,
                        ..
                    }) => continue,
                    Err(_) => break,
                };

                let max = placement.origin + placement.size;
                prop_assert!(max.x <= size && max.y <= size);
                for other in &placed {
                    prop_assert!(!placement.overlaps(other));
                    // Later blocks never go above or left within the same row.
                    prop_assert!(
                        placement.origin.y > other.origin.y
                            || placement.origin.x >= other.origin.x + other.size.x
                    );
                }

                let transform = UvTransform::for_placement(&placement, extent, size);
                for corner in [Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::ONE] {
                    let uv = transform.apply(corner);
                    prop_assert!(uv.cmpge(Vec2::ZERO).all() && uv.cmple(Vec2::ONE).all());
                }
                placed.push(placement);
            }
        }
    }
}
