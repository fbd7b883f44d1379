//! Generators for synthetic tile images.
//!
//! Mock WMTS servers in the test suite answer GetTile with these encoded
//! images so that decoding, mosaicking and warping can be verified by
//! colour.

use std::io::Cursor;

use image::{ImageOutputFormat, Rgba, RgbaImage};

/// Encode an RGBA image in the given format.
fn encode(img: RgbaImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    let dynamic = image::DynamicImage::ImageRgba8(img);
    let dynamic = match format {
        // JPEG has no alpha channel
        ImageOutputFormat::Jpeg(_) => image::DynamicImage::ImageRgb8(dynamic.to_rgb8()),
        _ => dynamic,
    };
    dynamic
        .write_to(&mut out, format)
        .expect("Failed to encode test tile");
    out.into_inner()
}

/// A PNG tile filled with one colour.
///
/// # Example
///
/// ```
/// use test_utils::solid_tile_png;
///
/// let png = solid_tile_png(4, 4, [255, 0, 0, 255]);
/// assert_eq!(&png[0..4], &[137, 80, 78, 71]);
/// ```
pub fn solid_tile_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    encode(
        RgbaImage::from_pixel(width, height, Rgba(rgba)),
        ImageOutputFormat::Png,
    )
}

/// A JPEG tile filled with one colour (quality 95).
pub fn solid_tile_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(
        RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255])),
        ImageOutputFormat::Jpeg(95),
    )
}

/// A PNG tile whose left half is `left` and right half is `right`.
pub fn split_tile_png(width: u32, height: u32, left: [u8; 4], right: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba(left)
        } else {
            Rgba(right)
        }
    });
    encode(img, ImageOutputFormat::Png)
}

/// A distinct opaque colour per tile position, for verifying mosaic layout.
pub fn tile_color(col: u32, row: u32) -> [u8; 4] {
    [
        (col * 40 % 256) as u8,
        (row * 60 % 256) as u8,
        128,
        255,
    ]
}
