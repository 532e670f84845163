//! Decode Quake 2 BSP (version 38) level files.
//!
//! This crate provides pure synchronous decoding of the lump container into
//! typed records, reconstruction of face geometry, and decoding of per-face
//! light samples. It performs no I/O: callers hand it the whole file as a
//! byte slice and control any parallelism themselves.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Checked**: Every cross-lump index is bounds checked before use
//! - **All or nothing**: A failed decode never yields a partial document

mod document;
pub mod entities;
mod error;
pub mod geometry;
pub mod header;
pub mod lighting;
mod reader;
pub mod records;

#[cfg(any(test, feature = "fixture"))]
pub mod fixture;

pub use document::{Document, decode_document};
pub use entities::{Entity, parse_entities, sky_name};
pub use error::{DecodeError, DecodeResult};
pub use geometry::{
    FaceGeometry, FaceVertex, LIGHTMAP_SCALE, build_face, fan_triangulate, triangle_count,
};
pub use header::{Header, LumpEntry, LumpKind};
pub use lighting::{LightSamples, decode_light_samples, lightmap_size, style_count};
pub use reader::RecordReader;
pub use records::{Record, decode_records};
