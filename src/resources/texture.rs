//! Tagged texture loading and texture-unit bookkeeping.
//!
//! [`TextureRegistry`] decodes image files, hands them to a [`TextureBackend`]
//! for upload and remembers them in load order. Load order is the texture-unit
//! slot: record `i` is bound to unit `i` by [`TextureRegistry::bind_all`].

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use image::DynamicImage;
use thiserror::Error;

use crate::data_structures::{draw_state::NOT_FOUND_SLOT, texture::Texture};

/// Texture units the shader exposes.
pub const MAX_TEXTURE_UNITS: usize = 16;

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("could not load image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("texture '{tag}' has {channels} colour channels, only RGB (3) and RGBA (4) are supported")]
    UnsupportedChannels { tag: String, channels: u8 },
    #[error("texture '{tag}' is {width}x{height}, it has no pixels to upload")]
    EmptyImage { tag: String, width: u32, height: u32 },
    #[error("all {capacity} texture units are in use, cannot load '{tag}'")]
    CapacityExceeded { tag: String, capacity: usize },
}

impl TextureError {
    /// A texture that can't be read is skipped; the scene still renders. The
    /// other variants are authoring mistakes.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TextureError::Decode { .. })
    }
}

/// Where registered textures live on the graphics side.
pub trait TextureBackend {
    type Handle;

    /// Upload a decoded, vertically flipped RGBA image.
    fn upload(&mut self, rgba: &image::RgbaImage, label: &str) -> Self::Handle;

    /// Make `handle` the texture sampled through `unit`.
    fn bind(&mut self, unit: usize, handle: &Self::Handle);

    /// Free `handle`, which was bound to `unit` if `bind_all` ran.
    fn release(&mut self, unit: usize, handle: Self::Handle);
}

#[derive(Debug)]
pub struct TextureRecord<H> {
    pub tag: String,
    pub handle: H,
}

pub struct TextureRegistry<B: TextureBackend> {
    backend: B,
    capacity: usize,
    records: Vec<TextureRecord<B::Handle>>,
    by_tag: HashMap<String, usize>,
}

impl<B: TextureBackend> TextureRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self::with_capacity(backend, MAX_TEXTURE_UNITS)
    }

    /// A registry using at most `capacity` units, clamped to
    /// [`MAX_TEXTURE_UNITS`].
    pub fn with_capacity(backend: B, capacity: usize) -> Self {
        if capacity > MAX_TEXTURE_UNITS {
            log::warn!(
                "Requested {capacity} texture units, the shader only has {MAX_TEXTURE_UNITS}."
            );
        }
        let capacity = capacity.min(MAX_TEXTURE_UNITS);
        Self {
            backend,
            capacity,
            records: Vec::with_capacity(capacity),
            by_tag: HashMap::new(),
        }
    }

    /// Decode `path` and register it under `tag`. Returns the slot the texture
    /// will be bound to.
    pub fn load(&mut self, path: impl AsRef<Path>, tag: &str) -> Result<usize, TextureError> {
        let path = path.as_ref();
        self.ensure_capacity(tag)?;
        let image = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Loaded image {}, width: {}, height: {}, channels: {}",
            path.display(),
            image.width(),
            image.height(),
            image.color().channel_count()
        );
        self.load_image(image, tag)
    }

    /// Register an already decoded image. The image is consumed and dropped on
    /// every path, including rejection.
    pub fn load_image(&mut self, image: DynamicImage, tag: &str) -> Result<usize, TextureError> {
        self.ensure_capacity(tag)?;
        let channels = image.color().channel_count();
        if channels != 3 && channels != 4 {
            return Err(TextureError::UnsupportedChannels {
                tag: tag.to_string(),
                channels,
            });
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(TextureError::EmptyImage {
                tag: tag.to_string(),
                width: image.width(),
                height: image.height(),
            });
        }

        // Image rows start at the top, texture coordinates at the bottom.
        let rgba = image.flipv().into_rgba8();
        let handle = self.backend.upload(&rgba, tag);

        let slot = self.records.len();
        if self.by_tag.contains_key(tag) {
            log::warn!("Texture tag '{tag}' is already registered, slot {slot} is shadowed.");
        } else {
            self.by_tag.insert(tag.to_string(), slot);
        }
        self.records.push(TextureRecord {
            tag: tag.to_string(),
            handle,
        });
        Ok(slot)
    }

    /// Bind every record to the unit matching its load order.
    pub fn bind_all(&mut self) {
        for (unit, record) in self.records.iter().enumerate() {
            self.backend.bind(unit, &record.handle);
        }
    }

    /// Free all textures. The registry is empty afterwards.
    pub fn release_all(&mut self) {
        for (unit, record) in self.records.drain(..).enumerate() {
            self.backend.release(unit, record.handle);
        }
        self.by_tag.clear();
    }

    pub fn find_slot(&self, tag: &str) -> Option<usize> {
        self.by_tag.get(tag).copied()
    }

    pub fn find_handle(&self, tag: &str) -> Option<&B::Handle> {
        self.find_slot(tag).map(|slot| &self.records[slot].handle)
    }

    /// The slot as the shader's sampler index, `-1` if `tag` is unknown.
    pub fn sampler_index(&self, tag: &str) -> i32 {
        self.find_slot(tag)
            .map_or(NOT_FOUND_SLOT, |slot| slot as i32)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn records(&self) -> &[TextureRecord<B::Handle>] {
        &self.records
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn ensure_capacity(&self, tag: &str) -> Result<(), TextureError> {
        if self.records.len() >= self.capacity {
            return Err(TextureError::CapacityExceeded {
                tag: tag.to_string(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

pub fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("object_texture_bind_group_layout"),
    })
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    label: &str,
) -> wgpu::BindGroup {
    let sampler = texture
        .sampler
        .clone()
        .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some(label),
    })
}

/// wgpu texture units: one bind group per bound unit plus a white fallback
/// used by untextured and unresolved draws.
pub struct WgpuTextures {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layout: wgpu::BindGroupLayout,
    units: Vec<Option<wgpu::BindGroup>>,
    fallback: wgpu::BindGroup,
}

impl WgpuTextures {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout = texture_layout(device);
        let white = Texture::solid_color(device, queue, [255; 4], "fallback texture");
        let fallback = texture_bind_group(device, &layout, &white, "fallback_texture_bind_group");
        Self {
            device: device.clone(),
            queue: queue.clone(),
            layout,
            units: vec![None; MAX_TEXTURE_UNITS],
            fallback,
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// The group to set for a draw sampling `slot`, or the fallback.
    pub fn bind_group(&self, slot: Option<usize>) -> &wgpu::BindGroup {
        slot.and_then(|slot| self.units.get(slot))
            .and_then(Option::as_ref)
            .unwrap_or(&self.fallback)
    }
}

impl TextureBackend for WgpuTextures {
    type Handle = Texture;

    fn upload(&mut self, rgba: &image::RgbaImage, label: &str) -> Texture {
        Texture::from_rgba(&self.device, &self.queue, rgba, label)
    }

    fn bind(&mut self, unit: usize, handle: &Texture) {
        let label = format!("texture_unit_{unit}");
        let group = texture_bind_group(&self.device, &self.layout, handle, &label);
        if let Some(slot) = self.units.get_mut(unit) {
            *slot = Some(group);
        } else {
            log::error!("Texture unit {unit} does not exist, the texture stays unbound.");
        }
    }

    fn release(&mut self, unit: usize, handle: Texture) {
        if let Some(slot) = self.units.get_mut(unit) {
            *slot = None;
        }
        handle.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage, RgbaImage};

    #[derive(Default)]
    struct Ids {
        next: u32,
        bound: Vec<(usize, u32)>,
        released: Vec<u32>,
        first_rows: Vec<Vec<u8>>,
    }

    impl TextureBackend for Ids {
        type Handle = u32;

        fn upload(&mut self, rgba: &RgbaImage, _: &str) -> u32 {
            let row = rgba.width() as usize * 4;
            self.first_rows.push(rgba.as_raw()[..row].to_vec());
            self.next += 1;
            self.next
        }

        fn bind(&mut self, unit: usize, handle: &u32) {
            self.bound.push((unit, *handle));
        }

        fn release(&mut self, _: usize, handle: u32) {
            self.released.push(handle);
        }
    }

    fn rgb() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(2, 2))
    }

    #[test]
    fn rgb_and_rgba_images_get_consecutive_slots() {
        let mut textures = TextureRegistry::new(Ids::default());
        assert_eq!(textures.load_image(rgb(), "oakd").unwrap(), 0);
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(4, 1));
        assert_eq!(textures.load_image(rgba, "brass").unwrap(), 1);

        assert_eq!(textures.find_slot("brass"), Some(1));
        assert_eq!(textures.find_handle("oakd"), Some(&1));
        assert_eq!(textures.sampler_index("oakd"), 0);
    }

    #[test]
    fn grayscale_is_rejected_without_registering() {
        let mut textures = TextureRegistry::new(Ids::default());
        let gray = DynamicImage::ImageLuma8(GrayImage::new(2, 2));

        let err = textures.load_image(gray, "gray").unwrap_err();
        assert!(matches!(
            err,
            TextureError::UnsupportedChannels { channels: 1, .. }
        ));
        assert!(!err.is_recoverable());
        assert!(textures.is_empty());
        assert_eq!(textures.backend().next, 0);
    }

    #[test]
    fn empty_images_never_reach_the_backend() {
        let mut textures = TextureRegistry::new(Ids::default());
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        let strip = DynamicImage::ImageRgb8(RgbImage::new(4, 0));

        let err = textures.load_image(empty, "empty").unwrap_err();
        assert!(matches!(
            err,
            TextureError::EmptyImage { width: 0, height: 0, .. }
        ));
        assert!(!err.is_recoverable());
        assert!(matches!(
            textures.load_image(strip, "strip"),
            Err(TextureError::EmptyImage { width: 4, height: 0, .. })
        ));
        assert!(textures.is_empty());
        assert_eq!(textures.backend().next, 0);
    }

    #[test]
    fn unknown_tags_resolve_to_nothing() {
        let mut textures = TextureRegistry::new(Ids::default());
        textures.load_image(rgb(), "oakd").unwrap();
        assert_eq!(textures.find_slot("oakl"), None);
        assert_eq!(textures.find_handle("oakl"), None);
        assert_eq!(textures.sampler_index("oakl"), NOT_FOUND_SLOT);
    }

    #[test]
    fn overflow_is_rejected() {
        let mut textures = TextureRegistry::with_capacity(Ids::default(), 2);
        textures.load_image(rgb(), "a").unwrap();
        textures.load_image(rgb(), "b").unwrap();

        let err = textures.load_image(rgb(), "c").unwrap_err();
        assert!(matches!(err, TextureError::CapacityExceeded { capacity: 2, .. }));
        assert_eq!(textures.len(), 2);
        assert_eq!(textures.backend().next, 2);
    }

    #[test]
    fn capacity_never_exceeds_the_texture_units() {
        let textures = TextureRegistry::with_capacity(Ids::default(), 64);
        assert_eq!(textures.capacity(), MAX_TEXTURE_UNITS);
    }

    #[test]
    fn images_are_flipped_before_upload() {
        let mut image = RgbImage::new(1, 2);
        image.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        image.put_pixel(0, 1, image::Rgb([0, 0, 255]));

        let mut textures = TextureRegistry::new(Ids::default());
        textures
            .load_image(DynamicImage::ImageRgb8(image), "flip")
            .unwrap();
        assert_eq!(textures.backend().first_rows[0], vec![0, 0, 255, 255]);
    }

    #[test]
    fn duplicate_tags_keep_the_first_slot() {
        let mut textures = TextureRegistry::new(Ids::default());
        textures.load_image(rgb(), "oak").unwrap();
        assert_eq!(textures.load_image(rgb(), "oak").unwrap(), 1);
        assert_eq!(textures.find_slot("oak"), Some(0));
        assert_eq!(textures.len(), 2);
    }

    #[test]
    fn bind_all_follows_load_order_and_release_all_empties() {
        let mut textures = TextureRegistry::new(Ids::default());
        for tag in ["oakd", "oakl", "brass"] {
            textures.load_image(rgb(), tag).unwrap();
        }
        textures.bind_all();
        assert_eq!(textures.backend().bound, vec![(0, 1), (1, 2), (2, 3)]);

        textures.release_all();
        assert!(textures.is_empty());
        assert_eq!(textures.find_slot("oakd"), None);
        assert_eq!(textures.backend().released, vec![1, 2, 3]);
    }

    #[test]
    fn missing_files_are_recoverable() {
        let mut textures = TextureRegistry::new(Ids::default());
        let err = textures
            .load("does/not/exist/oakd.jpg", "oakd")
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(textures.is_empty());
    }
}
