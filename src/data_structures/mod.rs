//! Scene data structures: transforms, materials, lights, textures and draw
//! snapshots.
//!
//! - `transform` turns scale/rotation/position into a model matrix
//! - `material` holds the tagged Phong coefficients
//! - `light` contains the point light table and the lighting rig
//! - `texture` is the GPU texture wrapper and creation utilities
//! - `draw_state` captures the uniform state a single draw consumes

pub mod draw_state;
pub mod light;
pub mod material;
pub mod texture;
pub mod transform;
