#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage, RgbaImage};
use room_ngin::{
    data_structures::draw_state::DrawState,
    resources::{
        mesh::{MeshError, MeshKind, MeshProvider},
        texture::TextureBackend,
    },
    scene::ROOM_TEXTURES,
};
use tempfile::TempDir;

/// Texture backend that hands out numbered handles and remembers every call.
#[derive(Default)]
pub(crate) struct RecordingBackend {
    next: u32,
    /// (label, width, height, first pixel of the first row)
    pub(crate) uploads: Vec<(String, u32, u32, [u8; 4])>,
    pub(crate) bound: Vec<(usize, u32)>,
    pub(crate) released: Vec<(usize, u32)>,
}

impl TextureBackend for RecordingBackend {
    type Handle = u32;

    fn upload(&mut self, rgba: &RgbaImage, label: &str) -> u32 {
        let first = rgba.get_pixel(0, 0).0;
        self.uploads
            .push((label.to_string(), rgba.width(), rgba.height(), first));
        self.next += 1;
        self.next
    }

    fn bind(&mut self, unit: usize, handle: &u32) {
        self.bound.push((unit, *handle));
    }

    fn release(&mut self, unit: usize, handle: u32) {
        self.released.push((unit, handle));
    }
}

/// Mesh provider that keeps every draw instead of rendering it.
#[derive(Default)]
pub(crate) struct RecordingMeshes {
    pub(crate) loaded: Vec<MeshKind>,
    pub(crate) draws: Vec<(MeshKind, DrawState)>,
}

impl MeshProvider for RecordingMeshes {
    fn load_mesh(&mut self, kind: MeshKind) {
        if !self.loaded.contains(&kind) {
            self.loaded.push(kind);
        }
    }

    fn draw_mesh(&mut self, kind: MeshKind, state: DrawState) -> Result<(), MeshError> {
        if !self.loaded.contains(&kind) {
            return Err(MeshError::NotLoaded(kind));
        }
        self.draws.push((kind, state));
        Ok(())
    }
}

/// A fresh asset root with an empty `textures/` folder. The directory is
/// removed when the returned guard drops, so keep it alive for the whole test.
pub(crate) fn asset_root(test: &str) -> TempDir {
    let root = tempfile::Builder::new()
        .prefix(&format!("room-ngin-{test}-"))
        .tempdir()
        .expect("test directory can be created");
    std::fs::create_dir(root.path().join("textures")).expect("textures folder can be created");
    root
}

pub(crate) fn write_image(root: &Path, file: &str, image: &DynamicImage) -> PathBuf {
    let path = root.join("textures").join(file);
    image.save(&path).expect("test image can be written");
    path
}

/// A solid RGB image; jpeg keeps flat colours close enough to compare.
pub(crate) fn solid_rgb(width: u32, height: u32, colour: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb(colour)))
}

/// Asset root holding all five room textures.
pub(crate) fn furnished_asset_root(test: &str) -> TempDir {
    let root = asset_root(test);
    for (i, (file, _)) in ROOM_TEXTURES.iter().enumerate() {
        let shade = 40 * i as u8;
        write_image(root.path(), file, &solid_rgb(8, 4, [shade, 128, 255 - shade]));
    }
    root
}
