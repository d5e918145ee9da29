//! room-ngin
//!
//! Renders a static, furnished room from primitive meshes with wgpu. Every
//! object is drawn the same way: set its transform, pick a texture or a flat
//! colour, pick a material, draw. Textures and materials are looked up by tag
//! in two registries that are filled once at start-up.
//!
//! High-level modules
//! - `bridge`: per-draw uniform pushes (transform, colour, texture, material)
//! - `camera`: the fixed camera and its projection
//! - `config`: window, asset and camera settings
//! - `context`: window, surface, device and queue
//! - `data_structures`: transforms, materials, lights, textures and draw snapshots
//! - `flow`: the winit event loop
//! - `pipelines`: the WGSL shader and its render pipeline
//! - `render`: packs captured draws into GPU uniforms and records a frame
//! - `resources`: texture, material and mesh registries
//! - `scene`: the room itself
//! - `shader`: uniform names and the CPU-side uniform block
//!

pub mod bridge;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod shader;

pub use config::SceneConfig;
pub use flow::run;
