//! Start-up configuration.

use std::path::PathBuf;

use crate::resources::texture::MAX_TEXTURE_UNITS;

/// Environment variable that overrides [`SceneConfig::asset_root`].
pub const ASSETS_ENV: &str = "ROOM_NGIN_ASSETS";

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Directory containing `textures/`.
    pub asset_root: PathBuf,
    /// Texture units the registry may use, at most [`MAX_TEXTURE_UNITS`].
    pub texture_units: usize,
    pub clear_colour: wgpu::Color,
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fovy_degrees: f32,
}

impl SceneConfig {
    /// Defaults, with the asset root taken from `ROOM_NGIN_ASSETS` if set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(root) = std::env::var_os(ASSETS_ENV) {
            config.asset_root = PathBuf::from(root);
        }
        config
    }

    pub fn textures_dir(&self) -> PathBuf {
        self.asset_root.join("textures")
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            title: "room-ngin".to_string(),
            width: 1000,
            height: 800,
            asset_root: PathBuf::from("./"),
            texture_units: MAX_TEXTURE_UNITS,
            clear_colour: wgpu::Color::BLACK,
            eye: [0.0, 5.0, 12.0],
            target: [2.0, 1.0, -3.0],
            fovy_degrees: 45.0,
        }
    }
}
