use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use render_sandbox::resources::texture::{TextureData, mip_chain, mip_level_count};

fn png(image: DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn decode_flips_rows() {
    // Red top row, blue bottom row.
    let image = RgbImage::from_fn(2, 2, |_, y| {
        if y == 0 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    let data = TextureData::decode(&png(DynamicImage::ImageRgb8(image))).unwrap();

    assert_eq!((data.width, data.height), (2, 2));
    assert_eq!(*data.rgba.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
    assert_eq!(*data.rgba.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
}

#[test]
fn decode_records_the_source_channel_count() {
    let rgb = RgbImage::new(3, 1);
    let rgba = RgbaImage::new(3, 1);
    let gray = GrayImage::from_pixel(3, 1, Luma([128]));

    assert_eq!(TextureData::decode(&png(DynamicImage::ImageRgb8(rgb))).unwrap().channels, 3);
    assert_eq!(TextureData::decode(&png(DynamicImage::ImageRgba8(rgba))).unwrap().channels, 4);
    let gray = TextureData::decode(&png(DynamicImage::ImageLuma8(gray))).unwrap();
    assert_eq!(gray.channels, 1);
    assert_eq!(*gray.rgba.get_pixel(2, 0), Rgba([128, 128, 128, 255]));
}

#[test]
fn oversized_images_fail_the_dimension_check() {
    let wide = TextureData::decode(&png(DynamicImage::ImageRgb8(RgbImage::new(10_000, 2)))).unwrap();
    let err = wide.check_dimensions(8192).unwrap_err();
    assert!(err.to_string().contains("10000x2"));

    let tall = TextureData::decode(&png(DynamicImage::ImageRgb8(RgbImage::new(2, 33)))).unwrap();
    assert!(tall.check_dimensions(32).is_err());
    assert!(tall.check_dimensions(33).is_ok());
}

#[test]
fn decode_rejects_garbage() {
    assert!(TextureData::decode(b"definitely not an image").is_err());
}

#[test]
fn open_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let err = TextureData::open(&dir.path().join("nope.png")).unwrap_err();
    assert!(format!("{err:#}").contains("nope.png"));
}

#[test]
fn open_reads_files_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tile.png");
    std::fs::write(&path, png(DynamicImage::ImageRgba8(RgbaImage::new(4, 2)))).unwrap();
    let data = TextureData::open(&path).unwrap();
    assert_eq!((data.width, data.height, data.channels), (4, 2, 4));
}

#[test]
fn mip_level_count_reaches_one_texel() {
    assert_eq!(mip_level_count(1, 1), 1);
    assert_eq!(mip_level_count(2, 2), 2);
    assert_eq!(mip_level_count(256, 256), 9);
    assert_eq!(mip_level_count(512, 64), 10);
    assert_eq!(mip_level_count(0, 0), 1);
}

#[test]
fn mip_chain_halves_each_level() {
    let base = RgbaImage::from_pixel(8, 2, Rgba([200, 100, 50, 255]));
    let chain = mip_chain(&base);
    let sizes: Vec<(u32, u32)> = chain.iter().map(|l| l.dimensions()).collect();
    assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    // A flat colour stays flat through filtering.
    assert_eq!(*chain[3].get_pixel(0, 0), Rgba([200, 100, 50, 255]));
}
