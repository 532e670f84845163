//! Load Quake 2 BSP levels into batched, lightmapped geometry.
//!
//! This crate builds on [`q2bsp_decode`] to turn a level file into data a
//! renderer can upload directly: per-model vertex buffers split into draw
//! batches, and a layered lightmap atlas holding every lit face's samples.
//!
//! # Design principles
//!
//! - **Renderer-agnostic**: Produces plain vertex and pixel data, no GPU types
//! - **Pluggable textures**: Texture sizes come from a [`TextureCache`]
//! - **Fail whole**: A load either completes or returns an error
//!
//! # Example
//!
//! ```ignore
//! use q2bsp::{Level, LevelConfig, MemoryTextureCache};
//!
//! let textures = MemoryTextureCache::new();
//! let config = LevelConfig::default().with_padding(1);
//! let level = Level::load(std::fs::File::open("maps/base1.bsp")?, &config, &textures)?;
//!
//! let world = &level.models()[0];
//! for batch in &world.batches {
//!     let vertices = world.batch_vertices(batch);
//!     // Upload and draw.
//! }
//! ```

pub mod atlas;
pub mod batch;
mod config;
mod error;
mod level;
pub mod texture;

pub use atlas::{AtlasBlock, LightmapAtlas, Placement, ShelfAllocator, UvTransform};
pub use batch::{Aabb, FaceBatch, FaceBatcher, GroupKey, ModelBatches, Vertex};
pub use config::{CoordinateSystem, DEFAULT_ATLAS_SIZE, LevelConfig};
pub use error::{Error, ExhaustedReason, Result};
pub use level::Level;
pub use texture::{MemoryTextureCache, NoTextures, TextureCache, TextureHandle};

// Re-export decode types for convenience.
pub use q2bsp_decode::{DecodeError, Document, Entity, decode_document};
