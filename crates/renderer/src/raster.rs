//! RGBA rasters and tile mosaics.
//!
//! Pixels are stored row-major, 4 bytes per pixel, with straight
//! (non-premultiplied) alpha.

use wmts_common::{BoundingBox, CrsCode, TileMatrix, TileRange};

use crate::error::{RenderError, RenderResult};

pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Largest raster allocated, in pixels (1 GiB of RGBA).
pub const MAX_PIXELS: u64 = 1 << 28;

#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// A fully transparent raster.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        Self::filled(width, height, TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> RenderResult<Self> {
        if width == 0 || height == 0 || width as u64 * height as u64 > MAX_PIXELS {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let pixels = rgba.repeat(width as usize * height as usize);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Wrap an existing RGBA buffer.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode a PNG or JPEG tile.
    pub fn from_encoded(bytes: &[u8]) -> RenderResult<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| RenderError::Decode(e.to_string()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Overwrite one pixel. Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    /// Alpha-composite one pixel over the existing value.
    pub fn blend(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(dst) = self.get(x, y) {
            self.put(x, y, blend_over(rgba, dst));
        }
    }

    /// Copy `src` into this raster with its top-left corner at (x, y),
    /// clipping whatever falls outside.
    pub fn blit(&mut self, src: &Raster, x: i64, y: i64) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + src.width as i64).min(self.width as i64);
        let y1 = (y + src.height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let row_bytes = (x1 - x0) as usize * 4;
        for dy in y0..y1 {
            let sx = (x0 - x) as u32;
            let sy = (dy - y) as u32;
            let s = src.offset(sx, sy);
            let d = self.offset(x0 as u32, dy as u32);
            self.pixels[d..d + row_bytes].copy_from_slice(&src.pixels[s..s + row_bytes]);
        }
    }

    /// Alpha-composite a raster of the same size over this one.
    pub fn composite_over(&mut self, top: &Raster) -> RenderResult<()> {
        if top.width != self.width || top.height != self.height {
            return Err(RenderError::BufferSize {
                expected: self.pixels.len(),
                actual: top.pixels.len(),
            });
        }
        for (dst, src) in self
            .pixels
            .chunks_exact_mut(4)
            .zip(top.pixels.chunks_exact(4))
        {
            let out = blend_over([src[0], src[1], src[2], src[3]], [dst[0], dst[1], dst[2], dst[3]]);
            dst.copy_from_slice(&out);
        }
        Ok(())
    }

    /// Bilinear sample at fractional pixel coordinates, where (0, 0) is the
    /// centre of the top-left pixel. Edges are clamped; `None` when the
    /// point lies more than half a pixel outside the raster.
    pub fn sample_bilinear(&self, fx: f64, fy: f64) -> Option<[u8; 4]> {
        let w = self.width as f64;
        let h = self.height as f64;
        if !(-0.5..=w - 0.5).contains(&fx) || !(-0.5..=h - 0.5).contains(&fy) {
            return None;
        }

        let fx = fx.clamp(0.0, w - 1.0);
        let fy = fy.clamp(0.0, h - 1.0);
        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;

        let corners = [
            (self.get(x0, y0)?, (1.0 - tx) * (1.0 - ty)),
            (self.get(x1, y0)?, tx * (1.0 - ty)),
            (self.get(x0, y1)?, (1.0 - tx) * ty),
            (self.get(x1, y1)?, tx * ty),
        ];

        // Interpolate premultiplied so transparent neighbours don't darken edges
        let mut acc = [0.0f64; 4];
        for (px, weight) in corners {
            let a = px[3] as f64 * weight;
            acc[0] += px[0] as f64 * a;
            acc[1] += px[1] as f64 * a;
            acc[2] += px[2] as f64 * a;
            acc[3] += a;
        }
        if acc[3] <= 0.0 {
            return Some(TRANSPARENT);
        }
        Some([
            (acc[0] / acc[3]).round().clamp(0.0, 255.0) as u8,
            (acc[1] / acc[3]).round().clamp(0.0, 255.0) as u8,
            (acc[2] / acc[3]).round().clamp(0.0, 255.0) as u8,
            acc[3].round().clamp(0.0, 255.0) as u8,
        ])
    }
}

/// Straight-alpha "source over" compositing.
pub fn blend_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }
    let channel = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ]
}

/// Tiles of one tile range assembled into a single raster, georeferenced
/// in the tile matrix set's CRS.
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub raster: Raster,
    pub bbox: BoundingBox,
    range: TileRange,
    tile_width: u32,
    tile_height: u32,
}

impl Mosaic {
    /// An empty (transparent) mosaic sized for `range`.
    pub fn new(range: TileRange, matrix: &TileMatrix, crs: CrsCode) -> RenderResult<Self> {
        let (width, height) = match (
            range.cols().checked_mul(matrix.tile_width),
            range.rows().checked_mul(matrix.tile_height),
        ) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(RenderError::InvalidDimensions {
                    width: range.cols().saturating_mul(matrix.tile_width),
                    height: range.rows().saturating_mul(matrix.tile_height),
                })
            }
        };
        Ok(Self {
            raster: Raster::new(width, height)?,
            bbox: range.bbox(matrix, crs),
            range,
            tile_width: matrix.tile_width,
            tile_height: matrix.tile_height,
        })
    }

    pub fn range(&self) -> &TileRange {
        &self.range
    }

    /// Place a decoded tile. Tiles outside the range are ignored.
    pub fn insert(&mut self, col: u32, row: u32, tile: &Raster) {
        if col < self.range.min_col
            || col > self.range.max_col
            || row < self.range.min_row
            || row > self.range.max_row
        {
            return;
        }
        let x = (col - self.range.min_col) as i64 * self.tile_width as i64;
        let y = (row - self.range.min_row) as i64 * self.tile_height as i64;
        self.raster.blit(tile, x, y);
    }

    /// CRS coordinates to fractional pixel coordinates (pixel-centre origin).
    pub fn crs_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let px = (x - self.bbox.min_x) / self.bbox.width() * self.raster.width() as f64 - 0.5;
        let py = (self.bbox.max_y - y) / self.bbox.height() * self.raster.height() as f64 - 0.5;
        (px, py)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Raster::new(0, 10),
            Err(RenderError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_oversized_rejected() {
        assert!(matches!(
            Raster::new(1 << 15, 1 << 14),
            Err(RenderError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_blit_clips() {
        let mut dst = Raster::new(4, 4).unwrap();
        let src = Raster::filled(3, 3, [255, 0, 0, 255]).unwrap();
        dst.blit(&src, 2, -1);
        assert_eq!(dst.get(2, 0), Some([255, 0, 0, 255]));
        assert_eq!(dst.get(3, 1), Some([255, 0, 0, 255]));
        assert_eq!(dst.get(2, 2), Some(TRANSPARENT));
        assert_eq!(dst.get(1, 0), Some(TRANSPARENT));
    }

    #[test]
    fn test_blend_half_alpha() {
        let out = blend_over([255, 255, 255, 128], [0, 0, 0, 255]);
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_sample_bilinear_midpoint() {
        let mut r = Raster::new(2, 1).unwrap();
        r.put(0, 0, [0, 0, 0, 255]);
        r.put(1, 0, [200, 100, 50, 255]);
        assert_eq!(r.sample_bilinear(0.5, 0.0), Some([100, 50, 25, 255]));
        assert_eq!(r.sample_bilinear(-0.5, 0.0), Some([0, 0, 0, 255]));
        assert!(r.sample_bilinear(2.0, 0.0).is_none());
    }

    #[test]
    fn test_sample_next_to_transparent_keeps_color() {
        let mut r = Raster::new(2, 1).unwrap();
        r.put(0, 0, [200, 0, 0, 255]);
        let p = r.sample_bilinear(0.5, 0.0).unwrap();
        assert_eq!(p[0], 200);
        assert!((p[3] as i32 - 128).abs() <= 1);
    }
}
