//! Point lights and the scene-wide lighting rig.
//!
//! The shader exposes a fixed array of [`POINT_LIGHT_SLOTS`] point lights. Each
//! slot is either [`LightSlot::Active`] or [`LightSlot::Disabled`]; uploading a
//! disabled slot only clears its `bActive` flag.

use cgmath::Vector3;
use thiserror::Error;

use crate::shader::{ShaderUniforms, names};

pub const POINT_LIGHT_SLOTS: usize = 5;

#[derive(Error, Debug, PartialEq)]
pub enum LightError {
    #[error("point light slot {index} is out of range, the shader has {} slots", POINT_LIGHT_SLOTS)]
    SlotOutOfRange { index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LightSlot {
    Active(PointLight),
    #[default]
    Disabled,
}

/// Bounds-checked point light table, all slots disabled initially.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointLights {
    slots: [LightSlot; POINT_LIGHT_SLOTS],
}

impl PointLights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: usize, light: PointLight) -> Result<(), LightError> {
        *self.slot_mut(index)? = LightSlot::Active(light);
        Ok(())
    }

    pub fn disable(&mut self, index: usize) -> Result<(), LightError> {
        *self.slot_mut(index)? = LightSlot::Disabled;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&LightSlot> {
        self.slots.get(index)
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, LightSlot::Active(_)))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LightSlot> {
        self.slots.iter()
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut LightSlot, LightError> {
        self.slots
            .get_mut(index)
            .ok_or(LightError::SlotOutOfRange { index })
    }
}

/// Everything the shader needs to light the scene. Uploaded once during
/// preparation.
#[derive(Clone, Debug, PartialEq)]
pub struct Lighting {
    pub view_position: Vector3<f32>,
    pub point_lights: PointLights,
    pub spot_light_active: bool,
}

impl Lighting {
    pub fn new(view_position: impl Into<Vector3<f32>>) -> Self {
        Self {
            view_position: view_position.into(),
            point_lights: PointLights::new(),
            spot_light_active: false,
        }
    }

    pub fn upload(&self, shader: &mut impl ShaderUniforms) {
        shader.set_bool(names::USE_LIGHTING, true);
        shader.set_vec3(names::VIEW_POSITION, self.view_position);

        for (i, slot) in self.point_lights.iter().enumerate() {
            match slot {
                LightSlot::Active(light) => {
                    shader.set_vec3(&names::point_light(i, "position"), light.position);
                    shader.set_vec3(&names::point_light(i, "ambient"), light.ambient);
                    shader.set_vec3(&names::point_light(i, "diffuse"), light.diffuse);
                    shader.set_vec3(&names::point_light(i, "specular"), light.specular);
                    shader.set_bool(&names::point_light(i, "bActive"), true);
                }
                LightSlot::Disabled => {
                    shader.set_bool(&names::point_light(i, "bActive"), false);
                }
            }
        }
        shader.set_bool(names::SPOT_LIGHT_ACTIVE, self.spot_light_active);
    }
}
