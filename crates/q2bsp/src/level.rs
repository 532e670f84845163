//! Loading a complete level.

use std::io::{Read, Seek};

use q2bsp_decode::{Document, Entity, decode_document, parse_entities};

use crate::atlas::LightmapAtlas;
use crate::batch::{FaceBatcher, ModelBatches};
use crate::config::LevelConfig;
use crate::error::Result;
use crate::texture::TextureCache;

/// A decoded level with every model batched and lightmapped.
///
/// # Example
///
/// ```ignore
/// use q2bsp::{Level, LevelConfig, NoTextures};
///
/// let file = std::fs::File::open("maps/base1.bsp")?;
/// let level = Level::load(file, &LevelConfig::default(), &NoTextures)?;
/// for model in level.models() {
///     println!("model {}: {} batches", model.model, model.batches.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Level {
    document: Document,
    models: Vec<ModelBatches>,
    atlas: LightmapAtlas,
}

impl Level {
    /// Read a level from the start of `reader`.
    ///
    /// The stream is rewound and read to the end before anything is decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, reading fails, the file is
    /// malformed, or the lightmap atlas runs out of space.
    pub fn load<R: Read + Seek>(
        mut reader: R,
        config: &LevelConfig,
        textures: &dyn TextureCache,
    ) -> Result<Self> {
        reader.rewind()?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data, config, textures)
    }

    /// Decode a level held in memory.
    ///
    /// Models are batched in order and share one lightmap atlas. Any error
    /// aborts the whole load.
    ///
    /// # Errors
    ///
    /// Same as [`Level::load`], minus read failures.
    pub fn from_bytes(
        data: &[u8],
        config: &LevelConfig,
        textures: &dyn TextureCache,
    ) -> Result<Self> {
        config.validate()?;
        let document = decode_document(data)?;
        tracing::debug!(
            bytes = data.len(),
            faces = document.faces().len(),
            models = document.models().len(),
            "decoded document"
        );

        let mut atlas = LightmapAtlas::new(config);
        let batcher = FaceBatcher::new(&document, textures, config);
        let models = (0..document.models().len())
            .map(|model| batcher.batch_model(model, &mut atlas))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            models = models.len(),
            batches = models.iter().map(|m| m.batches.len()).sum::<usize>(),
            vertices = models.iter().map(|m| m.vertices.len()).sum::<usize>(),
            lightmap_blocks = atlas.blocks().len(),
            atlas_rows_used = atlas.allocator().used_height(),
            atlas_size = atlas.size(),
            "loaded level"
        );

        Ok(Self {
            document,
            models,
            atlas,
        })
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Batched geometry, one entry per model. Model 0 is the world.
    #[must_use]
    pub fn models(&self) -> &[ModelBatches] {
        &self.models
    }

    #[must_use]
    pub fn atlas(&self) -> &LightmapAtlas {
        &self.atlas
    }

    /// Sky box name, if the level sets one.
    #[must_use]
    pub fn sky(&self) -> Option<&str> {
        self.document.sky()
    }

    /// Parsed entities, in file order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        parse_entities(self.document.entities())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::texture::NoTextures;
    use q2bsp_decode::{DecodeError, fixture::unit_square};
    use std::io::{Cursor, SeekFrom};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    }

    #[test]
    fn test_load_from_stream() {
        init_tracing();
        let mut cursor = Cursor::new(unit_square().finish());
        // The loader rewinds before reading.
        cursor.seek(SeekFrom::End(0)).unwrap();

        let level = Level::load(cursor, &LevelConfig::default(), &NoTextures).unwrap();
        assert_eq!(level.models().len(), 1);
        assert_eq!(level.models()[0].batches.len(), 1);
        assert_eq!(level.models()[0].vertices.len(), 6);
        assert_eq!(level.atlas().blocks().len(), 1);
        assert_eq!(level.sky(), Some("unit1_"));
        assert_eq!(level.entities()[0].classname(), Some("worldspawn"));
        assert_eq!(level.document().faces().len(), 1);
    }

    #[test]
    fn test_bad_magic() {
        init_tracing();
        let mut data = unit_square().finish();
        data[0] = b'V';
        assert!(matches!(
            Level::from_bytes(&data, &LevelConfig::default(), &NoTextures),
            Err(Error::Decode(DecodeError::BadMagic { .. }))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let data = unit_square().finish();
        let config = LevelConfig::default().with_lightmap_layers(0);
        assert!(matches!(
            Level::from_bytes(&data, &config, &NoTextures),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_atlas_shared_across_models() {
        init_tracing();
        let mut writer = unit_square();
        // A second model reusing the lit face.
        writer.add_model(0, 1);
        let level =
            Level::from_bytes(&writer.finish(), &LevelConfig::default(), &NoTextures).unwrap();

        let blocks = level.atlas().blocks();
        assert_eq!(level.models().len(), 2);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].placement.origin.x, 5);
    }

    #[test]
    fn test_exhausted_atlas_fails_load() {
        let config = LevelConfig::default().with_atlas_size(4);
        assert!(matches!(
            Level::from_bytes(&unit_square().finish(), &config, &NoTextures),
            Err(Error::AllocationExhausted { .. })
        ));
    }
}
