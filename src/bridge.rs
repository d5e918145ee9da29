//! Per-draw uniform pushes.
//!
//! [`UniformBridge`] turns "this object, with this texture and this material"
//! into uniform writes. Every push overwrites shader state that persists until
//! the next write, so the pushes for one object have to come right before its
//! draw; [`crate::data_structures::draw_state::DrawState::capture`] then freezes
//! the result for that draw.

use cgmath::{Matrix4, Vector2, Vector4};

use crate::{
    data_structures::transform::TransformSpec,
    resources::{
        material::MaterialRegistry,
        texture::{TextureBackend, TextureRegistry},
    },
    shader::{ShaderUniforms, names},
};

/// How a tagged resource selection turned out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The tag was found and its values were uploaded.
    Resolved,
    /// Nothing was selected; the draw uses flat colour or previously uploaded
    /// values.
    Defaulted,
    /// The tag is not registered.
    Unresolved,
}

pub struct UniformBridge<'a, U: ShaderUniforms, B: TextureBackend> {
    shader: &'a mut U,
    textures: &'a TextureRegistry<B>,
    materials: &'a MaterialRegistry,
}

impl<'a, U: ShaderUniforms, B: TextureBackend> UniformBridge<'a, U, B> {
    pub fn new(
        shader: &'a mut U,
        textures: &'a TextureRegistry<B>,
        materials: &'a MaterialRegistry,
    ) -> Self {
        Self {
            shader,
            textures,
            materials,
        }
    }

    pub fn set_transform(&mut self, transform: &TransformSpec) -> Matrix4<f32> {
        let model = transform.to_matrix();
        self.shader.set_mat4(names::MODEL, &model);
        model
    }

    /// Draw the next object in a flat colour.
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.shader.set_bool(names::USE_TEXTURE, false);
        self.shader.set_vec4(names::OBJECT_COLOR, Vector4::new(r, g, b, a));
    }

    /// Sample the texture registered as `tag`. An unknown tag still turns
    /// texturing on, with sampler index `-1`.
    pub fn set_texture(&mut self, tag: &str) -> Resolution {
        self.shader.set_bool(names::USE_TEXTURE, true);
        let index = self.textures.sampler_index(tag);
        self.shader.set_sampler(names::OBJECT_TEXTURE, index);
        if index < 0 {
            log::debug!("Texture '{tag}' is not registered.");
            Resolution::Unresolved
        } else {
            Resolution::Resolved
        }
    }

    /// Upload the material registered as `tag`. An unknown tag uploads nothing,
    /// so the previous material stays in effect.
    pub fn set_material(&mut self, tag: &str) -> Resolution {
        let Some(material) = self.materials.find(tag) else {
            log::debug!("Material '{tag}' is not defined, keeping the previous one.");
            return Resolution::Unresolved;
        };
        self.shader
            .set_vec3(names::MATERIAL_AMBIENT_COLOR, material.ambient_color);
        self.shader
            .set_float(names::MATERIAL_AMBIENT_STRENGTH, material.ambient_strength);
        self.shader
            .set_vec3(names::MATERIAL_DIFFUSE_COLOR, material.diffuse_color);
        self.shader
            .set_vec3(names::MATERIAL_SPECULAR_COLOR, material.specular_color);
        self.shader
            .set_float(names::MATERIAL_SHININESS, material.shininess);
        Resolution::Resolved
    }

    pub fn set_uv_scale(&mut self, u: f32, v: f32) {
        self.shader.set_vec2(names::UV_SCALE, Vector2::new(u, v));
    }
}
