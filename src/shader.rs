//! Named shader uniforms.
//!
//! The scene talks to its shader the way a GL program is driven: typed setters
//! addressed by uniform name. [`ShaderUniforms`] is that seam and
//! [`UniformBlock`] is the CPU-side copy of the program's uniform state. The
//! renderer reads the block back (see [`crate::data_structures::draw_state`])
//! and packs it into GPU buffers.

use std::collections::HashMap;

use cgmath::{Matrix4, Vector2, Vector3, Vector4};

/// Uniform names the scene shader is addressed by.
pub mod names {
    pub const MODEL: &str = "model";
    pub const OBJECT_COLOR: &str = "objectColor";
    pub const OBJECT_TEXTURE: &str = "objectTexture";
    pub const USE_TEXTURE: &str = "bUseTexture";
    pub const USE_LIGHTING: &str = "bUseLighting";
    pub const UV_SCALE: &str = "UVscale";
    pub const VIEW_POSITION: &str = "viewPosition";

    pub const MATERIAL_AMBIENT_COLOR: &str = "material.ambientColor";
    pub const MATERIAL_AMBIENT_STRENGTH: &str = "material.ambientStrength";
    pub const MATERIAL_DIFFUSE_COLOR: &str = "material.diffuseColor";
    pub const MATERIAL_SPECULAR_COLOR: &str = "material.specularColor";
    pub const MATERIAL_SHININESS: &str = "material.shininess";

    pub const SPOT_LIGHT_ACTIVE: &str = "spotLight.bActive";

    /// `pointLights[i].<field>`, e.g. `point_light(1, "diffuse")`.
    pub fn point_light(index: usize, field: &str) -> String {
        format!("pointLights[{index}].{field}")
    }
}

/// A single uniform value as last uploaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
    Sampler(i32),
}

/// Typed uniform setters of a bound shader program.
///
/// Values persist until overwritten, so whatever was set last is what the next
/// draw reads.
pub trait ShaderUniforms {
    fn set_bool(&mut self, name: &str, value: bool);
    fn set_int(&mut self, name: &str, value: i32);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec2(&mut self, name: &str, value: Vector2<f32>);
    fn set_vec3(&mut self, name: &str, value: Vector3<f32>);
    fn set_vec4(&mut self, name: &str, value: Vector4<f32>);
    fn set_mat4(&mut self, name: &str, value: &Matrix4<f32>);
    /// Selects the texture unit a sampler reads from. `-1` means "none".
    fn set_sampler(&mut self, name: &str, unit: i32);
}

/// In-memory uniform state keyed by uniform name.
#[derive(Clone, Debug, Default)]
pub struct UniformBlock {
    values: HashMap<String, UniformValue>,
}

impl UniformBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name)? {
            UniformValue::Bool(v) => Some(*v),
            // GL programs routinely receive flags through the int setter
            UniformValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.values.get(name)? {
            UniformValue::Int(v) | UniformValue::Sampler(v) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.values.get(name)? {
            UniformValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<[f32; 2]> {
        match self.values.get(name)? {
            UniformValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<[f32; 3]> {
        match self.values.get(name)? {
            UniformValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn vec4(&self, name: &str) -> Option<[f32; 4]> {
        match self.values.get(name)? {
            UniformValue::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    pub fn mat4(&self, name: &str) -> Option<[[f32; 4]; 4]> {
        match self.values.get(name)? {
            UniformValue::Mat4(v) => Some(*v),
            _ => None,
        }
    }

    fn put(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_string(), value);
    }
}

impl ShaderUniforms for UniformBlock {
    fn set_bool(&mut self, name: &str, value: bool) {
        self.put(name, UniformValue::Bool(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.put(name, UniformValue::Int(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.put(name, UniformValue::Float(value));
    }

    fn set_vec2(&mut self, name: &str, value: Vector2<f32>) {
        self.put(name, UniformValue::Vec2(value.into()));
    }

    fn set_vec3(&mut self, name: &str, value: Vector3<f32>) {
        self.put(name, UniformValue::Vec3(value.into()));
    }

    fn set_vec4(&mut self, name: &str, value: Vector4<f32>) {
        self.put(name, UniformValue::Vec4(value.into()));
    }

    fn set_mat4(&mut self, name: &str, value: &Matrix4<f32>) {
        self.put(name, UniformValue::Mat4((*value).into()));
    }

    fn set_sampler(&mut self, name: &str, unit: i32) {
        self.put(name, UniformValue::Sampler(unit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_writes_overwrite_earlier_ones() {
        let mut block = UniformBlock::new();
        block.set_vec3(&names::point_light(0, "specular"), Vector3::new(0.3, 0.3, 1.0));
        block.set_vec3(&names::point_light(0, "specular"), Vector3::new(0.3, 0.3, 0.3));

        assert_eq!(block.len(), 1);
        assert_eq!(
            block.vec3("pointLights[0].specular"),
            Some([0.3, 0.3, 0.3])
        );
    }

    #[test]
    fn typed_reads_reject_mismatched_kinds() {
        let mut block = UniformBlock::new();
        block.set_float(names::MATERIAL_SHININESS, 16.0);
        block.set_sampler(names::OBJECT_TEXTURE, -1);

        assert_eq!(block.float(names::MATERIAL_SHININESS), Some(16.0));
        assert_eq!(block.vec3(names::MATERIAL_SHININESS), None);
        assert_eq!(block.int(names::OBJECT_TEXTURE), Some(-1));
        assert_eq!(block.bool("missing"), None);
    }

    #[test]
    fn int_flags_read_back_as_bools() {
        let mut block = UniformBlock::new();
        block.set_int(names::USE_TEXTURE, 1);
        assert_eq!(block.bool(names::USE_TEXTURE), Some(true));
        block.set_bool(names::USE_TEXTURE, false);
        assert_eq!(block.bool(names::USE_TEXTURE), Some(false));
    }
}
