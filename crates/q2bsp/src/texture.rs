//! Texture lookup abstractions.
//!
//! Faces only name their textures. A [`TextureCache`] maps those names to
//! handles carrying the image dimensions needed to normalize texture
//! coordinates. Decoding the images is up to the implementation.
//!
//! # Implementations
//!
//! - [`MemoryTextureCache`]: In-memory table of registered textures
//! - [`NoTextures`]: Resolves nothing, so every face uses the fallback

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use glam::{UVec2, Vec2};

/// A resolved texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    /// Renderer-defined texture id. Id 0 is the fallback.
    pub id: u32,
    /// Image size in pixels.
    pub size: UVec2,
}

impl TextureHandle {
    /// Placeholder checkerboard used when a texture cannot be resolved.
    pub const FALLBACK: Self = Self {
        id: 0,
        size: UVec2::splat(256),
    };

    /// Scale that maps texel coordinates into `[0, 1]` texture space.
    #[must_use]
    pub fn uv_scale(&self) -> Vec2 {
        Vec2::ONE / self.size.max(UVec2::ONE).as_vec2()
    }
}

/// Resolves lowercase texture names such as `e1u1/floor3_1`.
pub trait TextureCache: Send + Sync {
    /// Look up a texture. Returns `None` if it is not available.
    fn resolve(&self, name: &str) -> Option<TextureHandle>;

    /// Look up a texture, substituting [`TextureHandle::FALLBACK`].
    fn resolve_or_fallback(&self, name: &str) -> TextureHandle {
        self.resolve(name).unwrap_or(TextureHandle::FALLBACK)
    }
}

/// A texture cache that resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextures;

impl TextureCache for NoTextures {
    fn resolve(&self, _name: &str) -> Option<TextureHandle> {
        None
    }
}

/// An in-memory texture table.
///
/// Clones share the same table, so a loader thread can register textures
/// while another holds the cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextureCache {
    entries: Arc<RwLock<HashMap<String, TextureHandle>>>,
}

impl MemoryTextureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture under `name`, replacing any previous entry.
    ///
    /// Names are matched case-insensitively.
    pub fn insert(&self, name: &str, handle: TextureHandle) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_lowercase(), handle);
    }

    /// Get the number of registered textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TextureCache for MemoryTextureCache {
    fn resolve(&self, name: &str) -> Option<TextureHandle> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_lowercase())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_textures() {
        assert_eq!(NoTextures.resolve("e1u1/floor3_1"), None);
        assert_eq!(
            NoTextures.resolve_or_fallback("e1u1/floor3_1"),
            TextureHandle::FALLBACK
        );
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryTextureCache::new();
        assert!(cache.is_empty());

        let handle = TextureHandle {
            id: 7,
            size: UVec2::new(64, 32),
        };
        cache.insert("E1U1/Floor3_1", handle);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.resolve("e1u1/floor3_1"), Some(handle));
        assert_eq!(cache.resolve("E1U1/FLOOR3_1"), Some(handle));
        assert_eq!(cache.resolve("e1u1/wall"), None);

        // Clones share the table.
        let shared = cache.clone();
        shared.insert("e1u1/wall", TextureHandle::FALLBACK);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_uv_scale() {
        let handle = TextureHandle {
            id: 1,
            size: UVec2::new(64, 32),
        };
        assert_eq!(handle.uv_scale(), Vec2::new(1.0 / 64.0, 1.0 / 32.0));
        assert_eq!(TextureHandle::FALLBACK.uv_scale(), Vec2::splat(1.0 / 256.0));
    }
}
