//! The furnished room.
//!
//! The room is plain data: a list of [`ObjectDescriptor`]s plus the material,
//! light and texture tables they refer to. [`RoomScene`] loads those tables once
//! and then replays the list through the [`UniformBridge`] every frame.

use std::path::PathBuf;

use cgmath::Vector3;

use crate::{
    bridge::{Resolution, UniformBridge},
    config::SceneConfig,
    data_structures::{
        draw_state::DrawState,
        light::{LightError, Lighting, PointLight},
        material::MaterialRecord,
        transform::TransformSpec,
    },
    resources::{
        material::MaterialRegistry,
        mesh::{MeshError, MeshKind, MeshProvider},
        texture::{MAX_TEXTURE_UNITS, TextureBackend, TextureRegistry},
    },
    shader::UniformBlock,
};

/// Image files under `<asset_root>/textures/` and the tags they register as.
pub const ROOM_TEXTURES: [(&str, &str); 5] = [
    ("oakd.jpg", "oakd"),
    ("oakl.jpg", "oakl"),
    ("brass.jpg", "brass"),
    ("carpet.jpg", "carpet"),
    ("sheet.jpg", "sheet"),
];

#[derive(Clone, Debug, PartialEq)]
pub enum Surface {
    Color([f32; 4]),
    Texture { tag: String, uv_scale: [f32; 2] },
}

impl Surface {
    fn texture(tag: &str) -> Self {
        Surface::Texture {
            tag: tag.to_string(),
            uv_scale: [1.0, 1.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDescriptor {
    pub name: String,
    pub mesh: MeshKind,
    pub transform: TransformSpec,
    pub surface: Surface,
    /// `None` keeps whatever material the previous draw left behind.
    pub material: Option<String>,
}

impl ObjectDescriptor {
    fn new(
        name: impl Into<String>,
        mesh: MeshKind,
        transform: TransformSpec,
        surface: Surface,
        material: &str,
    ) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform,
            surface,
            material: Some(material.to_string()),
        }
    }
}

/// Draw list of the room, in draw order.
pub fn room_objects() -> Vec<ObjectDescriptor> {
    use MeshKind::*;

    let mut objects = vec![
        ObjectDescriptor::new(
            "floor",
            Plane,
            TransformSpec::scaled_at([20.0, 1.0, 10.0], [0.0, 0.0, 0.0]),
            Surface::Color([0.90, 0.85, 0.75, 1.0]),
            "plane",
        ),
        ObjectDescriptor::new(
            "dresser",
            Box,
            TransformSpec::scaled_at([4.0, 3.0, 1.5], [0.0, 1.5, -4.0]),
            Surface::texture("oakd"),
            "box",
        ),
    ];

    // 3 rows x 2 columns on the dresser front, handles slightly in front of
    // the drawers.
    let grid = |z: f32| {
        (0..3).flat_map(move |row| {
            (0..2).map(move |col| {
                let x = -1.2 + col as f32 * 2.4;
                let y = 2.5 - row as f32;
                (row, col, Vector3::new(x, y, z))
            })
        })
    };
    objects.extend(grid(-3.2).map(|(row, col, position)| {
        ObjectDescriptor::new(
            format!("handle_{row}_{col}"),
            Sphere,
            TransformSpec::scaled_at([0.1, 0.1, 0.1], position),
            Surface::texture("brass"),
            "sphere",
        )
    }));
    objects.extend(grid(-3.25).map(|(row, col, position)| {
        ObjectDescriptor::new(
            format!("drawer_{row}_{col}"),
            Box,
            TransformSpec::scaled_at([1.4, 0.5, 0.25], position),
            Surface::texture("oakl"),
            "box",
        )
    }));

    let lamp_grey = Surface::Color([0.2, 0.2, 0.2, 1.0]);
    let pillow = |name: &str, x: f32| {
        ObjectDescriptor::new(
            name,
            Box,
            TransformSpec::scaled_at([1.3, 0.2, 0.8], [x, 1.3, -4.5]),
            Surface::Color([1.0, 1.0, 1.0, 1.0]),
            "pillow",
        )
    };
    objects.extend([
        ObjectDescriptor::new(
            "lamp_base",
            Box,
            TransformSpec::scaled_at([0.4, 0.2, 0.4], [-1.0, 3.1, -4.0]),
            lamp_grey.clone(),
            "lampBase",
        ),
        ObjectDescriptor::new(
            "lamp_stem",
            Cylinder,
            TransformSpec::scaled_at([0.05, 1.0, 0.05], [-1.0, 3.2, -4.0]),
            lamp_grey,
            "lampBase",
        ),
        ObjectDescriptor::new(
            "lamp_shade",
            Cone,
            TransformSpec::scaled_at([0.6, 0.5, 0.6], [-1.0, 3.9, -4.0]),
            Surface::Color([0.95, 0.95, 0.9, 1.0]),
            "lampShade",
        ),
        ObjectDescriptor::new(
            "bed",
            Box,
            TransformSpec::scaled_at([4.0, 1.8, 7.0], [6.0, 0.4, -2.0]),
            Surface::texture("sheet"),
            "bed",
        ),
        pillow("pillow_left", 5.2),
        pillow("pillow_right", 6.8),
        ObjectDescriptor::new(
            "rug",
            Cylinder,
            TransformSpec::scaled_at([6.0, 0.05, 6.0], [2.0, 0.025, -1.0]),
            Surface::texture("carpet"),
            "rug",
        ),
    ]);
    objects
}

/// Materials referenced by [`room_objects`].
pub fn room_materials() -> Vec<MaterialRecord> {
    vec![
        MaterialRecord::new("plane", [0.3, 0.3, 0.25], 0.3, [0.8, 0.8, 0.8], [0.2, 0.2, 0.2], 16.0),
        MaterialRecord::new("cylinder", [0.25, 0.25, 0.25], 0.25, [0.7, 0.7, 0.7], [0.3, 0.3, 0.3], 32.0),
        MaterialRecord::new("box", [0.2, 0.15, 0.1], 0.4, [0.6, 0.4, 0.2], [0.4, 0.4, 0.4], 64.0),
        MaterialRecord::new("sphere", [0.3, 0.25, 0.1], 0.2, [0.8, 0.7, 0.3], [0.9, 0.9, 0.7], 128.0),
        MaterialRecord::new("lampBase", [0.1, 0.1, 0.1], 0.3, [0.3, 0.3, 0.3], [0.5, 0.5, 0.5], 64.0),
        MaterialRecord::new("lampShade", [0.9, 0.9, 0.8], 0.4, [0.95, 0.95, 0.9], [0.2, 0.2, 0.2], 16.0),
        MaterialRecord::new("bed", [0.1, 0.1, 0.3], 0.3, [0.2, 0.3, 0.8], [0.1, 0.1, 0.3], 32.0),
        MaterialRecord::new("pillow", [0.9, 0.9, 0.9], 0.4, [1.0, 1.0, 1.0], [0.3, 0.3, 0.3], 16.0),
        MaterialRecord::new("rug", [0.3, 0.1, 0.1], 0.4, [0.7, 0.2, 0.2], [0.1, 0.1, 0.1], 8.0),
    ]
}

/// Two point lights: a cool fill at the origin and a warm key light far off to
/// the side. Every other slot and the spot light stay off.
pub fn room_lighting() -> Result<Lighting, LightError> {
    let mut lighting = Lighting::new([4.0, 1.0, 4.0]);
    lighting.point_lights.set(
        0,
        PointLight {
            position: Vector3::new(0.0, 0.0, 0.0),
            ambient: Vector3::new(0.1, 0.1, 0.3),
            diffuse: Vector3::new(0.2, 0.2, 0.8),
            specular: Vector3::new(0.3, 0.3, 0.3),
        },
    )?;
    lighting.point_lights.set(
        1,
        PointLight {
            position: Vector3::new(-77.0, 10.0, -27.0),
            ambient: Vector3::new(0.1, 0.1, 0.08),
            diffuse: Vector3::new(0.5, 0.5, 0.4),
            specular: Vector3::new(0.3, 0.3, 0.3),
        },
    )?;
    Ok(lighting)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrepareReport {
    pub textures_loaded: usize,
    /// Tags whose image could not be read.
    pub textures_skipped: Vec<String>,
    /// Texture or material tags used by the draw list that do not resolve.
    pub unresolved_tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawOutcome {
    pub name: String,
    pub mesh: MeshKind,
    pub texture: Resolution,
    pub material: Resolution,
}

pub struct RoomScene<B: TextureBackend> {
    textures: TextureRegistry<B>,
    materials: MaterialRegistry,
    lighting: Lighting,
    objects: Vec<ObjectDescriptor>,
    texture_dir: PathBuf,
}

impl<B: TextureBackend> RoomScene<B> {
    pub fn new(backend: B, config: &SceneConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(
            config.texture_units <= MAX_TEXTURE_UNITS,
            "texture_units is {}, at most {MAX_TEXTURE_UNITS} are available",
            config.texture_units
        );
        Ok(Self {
            textures: TextureRegistry::with_capacity(backend, config.texture_units),
            materials: MaterialRegistry::new(),
            lighting: room_lighting()?,
            objects: room_objects(),
            texture_dir: config.textures_dir(),
        })
    }

    /// Upload lighting, fill both registries, load every mesh kind and bind the
    /// textures. Missing or unreadable images are skipped; any other texture
    /// error aborts.
    pub fn prepare(
        &mut self,
        uniforms: &mut UniformBlock,
        meshes: &mut impl MeshProvider,
    ) -> anyhow::Result<PrepareReport> {
        let mut report = PrepareReport::default();

        self.lighting.upload(uniforms);
        for material in room_materials() {
            self.materials.define(material);
        }
        for kind in MeshKind::ALL {
            meshes.load_mesh(kind);
        }

        for (file, tag) in ROOM_TEXTURES {
            match self.textures.load(self.texture_dir.join(file), tag) {
                Ok(_) => report.textures_loaded += 1,
                Err(e) if e.is_recoverable() => {
                    log::warn!("Skipping texture '{tag}': {e}");
                    report.textures_skipped.push(tag.to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.textures.bind_all();

        report.unresolved_tags = self.unresolved_tags();
        for tag in &report.unresolved_tags {
            log::warn!("Tag '{tag}' is used by the room but not registered.");
        }
        log::info!(
            "Room prepared: {} textures, {} materials, {} objects.",
            self.textures.len(),
            self.materials.len(),
            self.objects.len()
        );
        Ok(report)
    }

    /// Push every object's uniforms and hand its captured state to `meshes`.
    pub fn render(
        &self,
        uniforms: &mut UniformBlock,
        meshes: &mut impl MeshProvider,
    ) -> Result<Vec<DrawOutcome>, MeshError> {
        let mut outcomes = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            let mut bridge = UniformBridge::new(uniforms, &self.textures, &self.materials);
            bridge.set_transform(&object.transform);
            let texture = match &object.surface {
                Surface::Color([r, g, b, a]) => {
                    bridge.set_color(*r, *g, *b, *a);
                    Resolution::Defaulted
                }
                Surface::Texture { tag, uv_scale } => {
                    let resolution = bridge.set_texture(tag);
                    bridge.set_uv_scale(uv_scale[0], uv_scale[1]);
                    resolution
                }
            };
            let material = match &object.material {
                Some(tag) => bridge.set_material(tag),
                None => Resolution::Defaulted,
            };

            meshes.draw_mesh(object.mesh, DrawState::capture(uniforms))?;
            outcomes.push(DrawOutcome {
                name: object.name.clone(),
                mesh: object.mesh,
                texture,
                material,
            });
        }
        Ok(outcomes)
    }

    /// Free every texture. Materials go with the scene.
    pub fn release(&mut self) {
        self.textures.release_all();
    }

    pub fn textures(&self) -> &TextureRegistry<B> {
        &self.textures
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn objects(&self) -> &[ObjectDescriptor] {
        &self.objects
    }

    fn unresolved_tags(&self) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for object in &self.objects {
            if let Surface::Texture { tag, .. } = &object.surface {
                if self.textures.find_slot(tag).is_none() && !missing.contains(tag) {
                    missing.push(tag.clone());
                }
            }
            if let Some(tag) = &object.material {
                if self.materials.find(tag).is_none() && !missing.contains(tag) {
                    missing.push(tag.clone());
                }
            }
        }
        missing
    }
}
