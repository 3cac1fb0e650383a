//! GPU data: generated geometry, meshes, instances and textures.
//!
//! - `geometry` generates plane, sphere and cone meshes on the CPU
//! - `model` holds the vertex layout and uploaded meshes
//! - `instance` holds per-instance transforms and emissive intensity
//! - `texture` wraps textures and the frame's render targets

pub mod geometry;
pub mod instance;
pub mod model;
pub mod texture;
