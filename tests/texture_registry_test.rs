mod common;

use image::{DynamicImage, GrayImage, RgbaImage};
use room_ngin::resources::texture::{TextureError, TextureRegistry};

use crate::common::test_utils::{RecordingBackend, asset_root, solid_rgb, write_image};

#[test]
fn loads_jpeg_and_png_files_in_slot_order() {
    let dir = asset_root("jpeg-png");
    let root = dir.path();
    let jpeg = write_image(root, "oakd.jpg", &solid_rgb(8, 4, [120, 80, 40]));
    let png = write_image(
        root,
        "brass.png",
        &DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, image::Rgba([200, 180, 60, 128]))),
    );

    let mut textures = TextureRegistry::new(RecordingBackend::default());
    assert_eq!(textures.load(&jpeg, "oakd").unwrap(), 0);
    assert_eq!(textures.load(&png, "brass").unwrap(), 1);

    let uploads = &textures.backend().uploads;
    assert_eq!(uploads[0].0, "oakd");
    assert_eq!((uploads[0].1, uploads[0].2), (8, 4));
    assert_eq!(uploads[0].3[3], 255, "RGB gains an opaque alpha channel");
    assert_eq!(uploads[1].3, [200, 180, 60, 128]);
    assert_eq!(textures.find_slot("brass"), Some(1));
    assert_eq!(textures.find_handle("oakd"), Some(&1));
}

#[test]
fn file_rows_are_flipped_before_upload() {
    let dir = asset_root("flip");
    let root = dir.path();
    let mut image = RgbaImage::new(1, 2);
    image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    image.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
    let path = write_image(root, "flip.png", &DynamicImage::ImageRgba8(image));

    let mut textures = TextureRegistry::new(RecordingBackend::default());
    textures.load(&path, "flip").unwrap();
    assert_eq!(textures.backend().uploads[0].3, [0, 0, 255, 255]);
}

#[test]
fn grayscale_file_is_rejected_and_fatal() {
    let dir = asset_root("gray");
    let root = dir.path();
    let path = write_image(root, "gray.png", &DynamicImage::ImageLuma8(GrayImage::new(4, 4)));

    let mut textures = TextureRegistry::new(RecordingBackend::default());
    let err = textures.load(&path, "gray").unwrap_err();

    assert!(matches!(
        err,
        TextureError::UnsupportedChannels { ref tag, channels: 1 } if tag == "gray"
    ));
    assert!(!err.is_recoverable());
    assert!(textures.is_empty());
    assert!(textures.backend().uploads.is_empty());
}

#[test]
fn unreadable_files_are_recoverable() {
    let dir = asset_root("unreadable");
    let root = dir.path();
    let garbage = root.join("textures").join("carpet.jpg");
    std::fs::write(&garbage, b"definitely not a jpeg").unwrap();

    let mut textures = TextureRegistry::new(RecordingBackend::default());
    let missing = textures
        .load(root.join("textures").join("sheet.jpg"), "sheet")
        .unwrap_err();
    let corrupt = textures.load(&garbage, "carpet").unwrap_err();

    assert!(matches!(missing, TextureError::Decode { .. }));
    assert!(missing.is_recoverable());
    assert!(corrupt.is_recoverable());
    assert!(textures.is_empty());
    assert_eq!(textures.sampler_index("sheet"), -1);
}

#[test]
fn failed_loads_do_not_take_a_unit() {
    let dir = asset_root("units");
    let root = dir.path();
    let oakd = write_image(root, "oakd.jpg", &solid_rgb(2, 2, [10, 10, 10]));
    let oakl = write_image(root, "oakl.jpg", &solid_rgb(2, 2, [200, 200, 200]));

    let mut textures = TextureRegistry::new(RecordingBackend::default());
    textures.load(&oakd, "oakd").unwrap();
    textures
        .load(root.join("textures").join("brass.jpg"), "brass")
        .unwrap_err();
    textures.load(&oakl, "oakl").unwrap();
    textures.bind_all();

    assert_eq!(textures.backend().bound, vec![(0, 1), (1, 2)]);
    assert_eq!(textures.find_slot("oakl"), Some(1));

    textures.release_all();
    assert_eq!(textures.backend().released, vec![(0, 1), (1, 2)]);
    assert!(textures.is_empty());
}

#[test]
fn capacity_is_checked_before_decoding() {
    let dir = asset_root("capacity");
    let root = dir.path();
    let path = write_image(root, "oakd.jpg", &solid_rgb(2, 2, [10, 10, 10]));

    let mut textures = TextureRegistry::with_capacity(RecordingBackend::default(), 1);
    textures.load(&path, "oakd").unwrap();
    let err = textures
        .load(root.join("textures").join("missing.jpg"), "missing")
        .unwrap_err();

    assert!(matches!(
        err,
        TextureError::CapacityExceeded { capacity: 1, .. }
    ));
    assert!(!err.is_recoverable());
    assert_eq!(textures.len(), 1);
}

#[test]
fn asset_roots_are_removed_once_dropped() {
    let dir = asset_root("cleanup");
    let path = write_image(dir.path(), "oakd.jpg", &solid_rgb(2, 2, [10, 10, 10]));
    let root = dir.path().to_path_buf();
    assert!(path.exists());

    drop(dir);
    assert!(!root.exists());
}
