//! Immutable snapshots of the uniform state.
//!
//! Uniform setters only mutate the shader's state; what a draw actually sees is
//! captured into a [`DrawState`] right before the draw and handed to the mesh
//! provider. Later pushes for other objects can't leak into a draw that was
//! already issued.

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    data_structures::light::POINT_LIGHT_SLOTS,
    shader::{UniformBlock, names},
};

/// Sampler index meaning "no texture unit".
pub const NOT_FOUND_SLOT: i32 = -1;

/// Material coefficients as seen by one draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shading {
    pub ambient_color: [f32; 3],
    pub ambient_strength: f32,
    pub diffuse_color: [f32; 3],
    pub specular_color: [f32; 3],
    pub shininess: f32,
}

impl Default for Shading {
    fn default() -> Self {
        Self {
            ambient_color: [1.0; 3],
            ambient_strength: 1.0,
            diffuse_color: [1.0; 3],
            specular_color: [0.0; 3],
            shininess: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    pub model: Matrix4<f32>,
    pub object_color: [f32; 4],
    pub use_texture: bool,
    pub texture_slot: i32,
    pub uv_scale: [f32; 2],
    pub shading: Shading,
}

impl DrawState {
    /// Read everything one draw depends on. Uniforms never set fall back to an
    /// identity model, opaque white, no texture and a unit UV scale.
    pub fn capture(block: &UniformBlock) -> Self {
        let defaults = Shading::default();
        Self {
            model: block
                .mat4(names::MODEL)
                .map(Matrix4::from)
                .unwrap_or_else(Matrix4::identity),
            object_color: block.vec4(names::OBJECT_COLOR).unwrap_or([1.0; 4]),
            use_texture: block.bool(names::USE_TEXTURE).unwrap_or(false),
            texture_slot: block.int(names::OBJECT_TEXTURE).unwrap_or(NOT_FOUND_SLOT),
            uv_scale: block.vec2(names::UV_SCALE).unwrap_or([1.0, 1.0]),
            shading: Shading {
                ambient_color: block
                    .vec3(names::MATERIAL_AMBIENT_COLOR)
                    .unwrap_or(defaults.ambient_color),
                ambient_strength: block
                    .float(names::MATERIAL_AMBIENT_STRENGTH)
                    .unwrap_or(defaults.ambient_strength),
                diffuse_color: block
                    .vec3(names::MATERIAL_DIFFUSE_COLOR)
                    .unwrap_or(defaults.diffuse_color),
                specular_color: block
                    .vec3(names::MATERIAL_SPECULAR_COLOR)
                    .unwrap_or(defaults.specular_color),
                shininess: block
                    .float(names::MATERIAL_SHININESS)
                    .unwrap_or(defaults.shininess),
            },
        }
    }

    /// The texture unit this draw samples, if texturing is on and the slot
    /// resolved.
    pub fn sampled_slot(&self) -> Option<usize> {
        if self.use_texture && self.texture_slot >= 0 {
            Some(self.texture_slot as usize)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointLightState {
    pub active: bool,
    pub position: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

/// Scene-wide lighting uniforms, captured once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightingState {
    pub use_lighting: bool,
    pub view_position: [f32; 3],
    pub point_lights: [PointLightState; POINT_LIGHT_SLOTS],
    pub spot_light_active: bool,
}

impl LightingState {
    pub fn capture(block: &UniformBlock) -> Self {
        let mut point_lights = [PointLightState::default(); POINT_LIGHT_SLOTS];
        for (i, light) in point_lights.iter_mut().enumerate() {
            let vec3 = |field: &str| block.vec3(&names::point_light(i, field)).unwrap_or([0.0; 3]);
            *light = PointLightState {
                active: block
                    .bool(&names::point_light(i, "bActive"))
                    .unwrap_or(false),
                position: vec3("position"),
                ambient: vec3("ambient"),
                diffuse: vec3("diffuse"),
                specular: vec3("specular"),
            };
        }
        Self {
            use_lighting: block.bool(names::USE_LIGHTING).unwrap_or(false),
            view_position: block.vec3(names::VIEW_POSITION).unwrap_or([0.0; 3]),
            point_lights,
            spot_light_active: block.bool(names::SPOT_LIGHT_ACTIVE).unwrap_or(false),
        }
    }
}
