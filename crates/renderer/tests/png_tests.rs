//! Tests for PNG encoding of rendered figures.
//!
//! Encoded output is decoded again with the `image` crate to check that
//! both the indexed and RGBA paths produce valid files.

use renderer::png::{encode, encode_auto, save};
use renderer::Raster;
use test_utils::temp_test_dir;

/// A figure-like raster: smooth gradient, far more than 256 colors
fn gradient_raster(width: u32, height: u32) -> Raster {
    let mut r = Raster::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            r.put(x, y, [(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]);
        }
    }
    r
}

#[test]
fn test_rgba_png_decodes() {
    let raster = gradient_raster(300, 20);
    let png = encode(&raster).unwrap();
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (300, 20));
    assert_eq!(decoded.as_raw(), raster.pixels());
}

#[test]
fn test_auto_uses_indexed_for_flat_colors() {
    let mut raster = Raster::filled(256, 256, [255, 255, 255, 255]).unwrap();
    for x in 0..256 {
        raster.put(x, 128, [0, 0, 0, 255]);
    }

    let indexed = encode_auto(&raster).unwrap();
    let rgba = encode(&raster).unwrap();
    // Color type byte in IHDR
    assert_eq!(indexed[25], 3);
    assert_eq!(rgba[25], 6);
    assert!(indexed.len() <= rgba.len());

    let decoded = image::load_from_memory(&indexed).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(10, 128).0, [0, 0, 0, 255]);
    assert_eq!(decoded.get_pixel(10, 10).0, [255, 255, 255, 255]);
}

#[test]
fn test_indexed_preserves_transparency() {
    let mut raster = Raster::new(4, 4).unwrap();
    raster.put(1, 1, [10, 20, 30, 255]);

    let png = encode_auto(&raster).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
    assert_eq!(decoded.get_pixel(1, 1).0, [10, 20, 30, 255]);
}

#[test]
fn test_auto_falls_back_to_rgba() {
    let raster = gradient_raster(300, 4);
    let png = encode_auto(&raster).unwrap();
    assert_eq!(png[25], 6);
}

#[test]
fn test_save_writes_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("figure.png");
    save(&Raster::filled(8, 8, [1, 2, 3, 255]).unwrap(), &path).unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(7, 7).0, [1, 2, 3, 255]);
}

#[test]
fn test_save_to_missing_directory_fails() {
    let dir = temp_test_dir();
    let path = dir.path().join("missing").join("figure.png");
    assert!(save(&Raster::filled(2, 2, [0, 0, 0, 255]).unwrap(), &path).is_err());
}
