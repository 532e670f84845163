//! Light sample decoding.
//!
//! Each lit face stores one block of light samples per active style. A
//! block has one sample per 16 texels plus one along each axis, and each
//! sample is three bytes in blue, green, red order. Blocks for successive
//! styles follow each other directly.

use glam::{IVec2, UVec2};

use crate::error::{DecodeError, DecodeResult};
use crate::geometry::LIGHTMAP_SCALE;
use crate::records::NO_STYLE;

/// Maximum number of light styles per face.
pub const MAX_STYLES: usize = 4;

/// Largest light block accepted along either axis, in samples.
pub const MAX_LIGHTMAP_SIZE: u32 = 4096;

/// An RGBA sample with full alpha.
pub type Rgba = [u8; 4];

/// Opaque black, used for unused style layers.
pub const BLACK: Rgba = [0, 0, 0, 255];

/// Number of light styles a face uses.
///
/// Scans from the last slot backwards for the first used style, so unused
/// slots are only recognized at the end of the list.
#[must_use]
pub fn style_count(styles: [u8; 4]) -> usize {
    styles
        .iter()
        .rposition(|&s| s != NO_STYLE)
        .map_or(0, |last| last + 1)
}

/// Light block dimensions in samples for a face extent in texels.
#[must_use]
pub fn lightmap_size(extent: IVec2) -> UVec2 {
    (extent / LIGHTMAP_SCALE + IVec2::ONE).max(IVec2::ZERO).as_uvec2()
}

/// Decoded light samples for one face, one layer per style slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSamples {
    /// Block size in samples.
    pub size: UVec2,
    /// Number of layers holding real samples. Later layers are black.
    pub style_count: usize,
    /// `size.x * size.y` samples per layer, row major.
    pub layers: Vec<Vec<Rgba>>,
}

/// Decode a face's light samples into `layer_count` layers.
///
/// Layers past the face's style count are filled with black. A negative
/// `offset` marks a face without samples and yields all-black layers.
///
/// # Errors
///
/// Returns [`DecodeError::LightmapTooLarge`] if the block is wider or taller
/// than [`MAX_LIGHTMAP_SIZE`], and [`DecodeError::BufferTooSmall`] if the
/// samples for a used style run past the end of `lighting`.
pub fn decode_light_samples(
    lighting: &[u8],
    offset: i32,
    extent: IVec2,
    styles: [u8; 4],
    layer_count: usize,
) -> DecodeResult<LightSamples> {
    let size = lightmap_size(extent);
    if size.x > MAX_LIGHTMAP_SIZE || size.y > MAX_LIGHTMAP_SIZE {
        return Err(DecodeError::LightmapTooLarge {
            width: size.x,
            height: size.y,
        });
    }
    let pixel_count = size.x as usize * size.y as usize;
    let used = if offset < 0 {
        0
    } else {
        style_count(styles).min(layer_count)
    };

    let mut cursor = usize::try_from(offset).unwrap_or(0);
    let mut layers = Vec::with_capacity(layer_count);
    for layer in 0..layer_count {
        if layer >= used {
            layers.push(vec![BLACK; pixel_count]);
            continue;
        }

        let end = cursor.saturating_add(pixel_count * 3);
        let bytes = lighting
            .get(cursor..end)
            .ok_or(DecodeError::BufferTooSmall {
                context: "light samples",
                expected: end,
                actual: lighting.len(),
            })?;
        layers.push(
            bytes
                .chunks_exact(3)
                .map(|bgr| [bgr[2], bgr[1], bgr[0], 255])
                .collect(),
        );
        cursor = end;
    }

    Ok(LightSamples {
        size,
        style_count: used,
        layers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_count() {
        assert_eq!(style_count([255, 255, 255, 255]), 0);
        assert_eq!(style_count([0, 255, 255, 255]), 1);
        assert_eq!(style_count([0, 1, 255, 255]), 2);
        assert_eq!(style_count([0, 1, 2, 3]), 4);
        // A gap is counted as used because the scan stops at the last style.
        assert_eq!(style_count([0, 255, 5, 255]), 3);
    }

    #[test]
    fn test_lightmap_size() {
        assert_eq!(lightmap_size(IVec2::new(64, 32)), UVec2::new(5, 3));
        assert_eq!(lightmap_size(IVec2::ZERO), UVec2::ONE);
    }

    #[test]
    fn test_decode_two_styles() {
        // 1x2 block, two styles.
        let lighting = [
            1, 2, 3, 4, 5, 6, // style 0
            7, 8, 9, 10, 11, 12, // style 1
        ];
        let samples =
            decode_light_samples(&lighting, 0, IVec2::new(0, 16), [0, 1, 255, 255], 4).unwrap();

        assert_eq!(samples.size, UVec2::new(1, 2));
        assert_eq!(samples.style_count, 2);
        assert_eq!(samples.layers.len(), 4);
        assert_eq!(samples.layers[0], vec![[3, 2, 1, 255], [6, 5, 4, 255]]);
        assert_eq!(samples.layers[1], vec![[9, 8, 7, 255], [12, 11, 10, 255]]);
        assert_eq!(samples.layers[2], vec![BLACK; 2]);
        assert_eq!(samples.layers[3], vec![BLACK; 2]);
    }

    #[test]
    fn test_decode_at_offset() {
        let lighting = [0, 0, 0, 30, 20, 10];
        let samples =
            decode_light_samples(&lighting, 3, IVec2::ZERO, [0, 255, 255, 255], 1).unwrap();
        assert_eq!(samples.layers, vec![vec![[10, 20, 30, 255]]]);
    }

    #[test]
    fn test_decode_unlit_face() {
        let samples = decode_light_samples(&[], -1, IVec2::new(16, 16), [0, 255, 255, 255], 2)
            .unwrap();
        assert_eq!(samples.style_count, 0);
        assert!(samples.layers.iter().flatten().all(|&p| p == BLACK));
        assert_eq!(samples.layers[0].len(), 4);
    }

    #[test]
    fn test_decode_huge_extent() {
        let extent = IVec2::splat(16 * 70_000);
        assert!(matches!(
            decode_light_samples(&[], -1, extent, [0, 255, 255, 255], 4),
            Err(DecodeError::LightmapTooLarge {
                width: 70_001,
                height: 70_001,
            })
        ));
        // The largest accepted block still decodes.
        let edge = (MAX_LIGHTMAP_SIZE as i32 - 1) * 16;
        let samples =
            decode_light_samples(&[], -1, IVec2::new(edge, 0), [255; 4], 1).unwrap();
        assert_eq!(samples.size, UVec2::new(MAX_LIGHTMAP_SIZE, 1));
    }

    #[test]
    fn test_decode_truncated() {
        let lighting = [0; 5];
        assert!(matches!(
            decode_light_samples(&lighting, 0, IVec2::new(16, 0), [0, 255, 255, 255], 4),
            Err(DecodeError::BufferTooSmall {
                expected: 6,
                actual: 5,
                ..
            })
        ));
    }
}
