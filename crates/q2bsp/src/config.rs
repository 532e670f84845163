//! Level loading configuration.

use glam::Vec3;
use q2bsp_decode::lighting::MAX_STYLES;

use crate::error::{Error, Result};

/// Default lightmap atlas edge length in texels.
pub const DEFAULT_ATLAS_SIZE: u32 = 4096;

/// Axis convention for emitted positions and normals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// Positions exactly as stored in the file, Z up.
    #[default]
    Quake,
    /// Y up, right handed: `(x, y, z)` becomes `(x, z, -y)`.
    YUp,
}

impl CoordinateSystem {
    /// Convert a file-space vector into this coordinate system.
    #[must_use]
    pub fn convert(self, v: Vec3) -> Vec3 {
        match self {
            CoordinateSystem::Quake => v,
            CoordinateSystem::YUp => Vec3::new(v.x, v.z, -v.y),
        }
    }
}

/// Settings for [`Level`](crate::Level) loading.
///
/// # Example
///
/// ```
/// use q2bsp::{CoordinateSystem, LevelConfig};
///
/// let config = LevelConfig::default()
///     .with_atlas_size(1024)
///     .with_padding(1)
///     .with_coordinate_system(CoordinateSystem::YUp);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelConfig {
    /// Lightmap atlas edge length in texels.
    pub atlas_size: u32,
    /// Gap in texels kept around each lightmap block.
    pub padding: u32,
    /// Number of style layers in the atlas, 1 to 4.
    pub lightmap_layers: usize,
    pub coordinate_system: CoordinateSystem,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            atlas_size: DEFAULT_ATLAS_SIZE,
            padding: 0,
            lightmap_layers: MAX_STYLES,
            coordinate_system: CoordinateSystem::Quake,
        }
    }
}

impl LevelConfig {
    #[must_use]
    pub fn with_atlas_size(mut self, atlas_size: u32) -> Self {
        self.atlas_size = atlas_size;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_lightmap_layers(mut self, lightmap_layers: usize) -> Self {
        self.lightmap_layers = lightmap_layers;
        self
    }

    #[must_use]
    pub fn with_coordinate_system(mut self, coordinate_system: CoordinateSystem) -> Self {
        self.coordinate_system = coordinate_system;
        self
    }

    /// Check that every setting is in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first bad setting.
    pub fn validate(&self) -> Result<()> {
        if self.atlas_size == 0 {
            return Err(Error::InvalidConfig {
                detail: "atlas size must be non-zero".to_string(),
            });
        }
        if u64::from(self.padding) * 2 >= u64::from(self.atlas_size) {
            return Err(Error::InvalidConfig {
                detail: format!(
                    "padding {} leaves no room in a {} texel atlas",
                    self.padding, self.atlas_size
                ),
            });
        }
        if !(1..=MAX_STYLES).contains(&self.lightmap_layers) {
            return Err(Error::InvalidConfig {
                detail: format!(
                    "lightmap layers must be between 1 and {MAX_STYLES}, got {}",
                    self.lightmap_layers
                ),
            });
        }
        Ok(())
    }
}
