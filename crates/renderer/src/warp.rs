//! Inverse-mapped reprojection of a tile mosaic into a figure.

use projection::Projection;
use rayon::prelude::*;
use tracing::debug;
use wmts_common::BoundingBox;

use crate::error::RenderResult;
use crate::raster::{Mosaic, Raster, TRANSPARENT};

/// Resample `mosaic` (georeferenced in `src`) onto a `width` x `height`
/// raster covering `dst_extent` in `dst`.
///
/// Each output pixel centre is unprojected to lon/lat, projected into the
/// source CRS and bilinearly sampled. Pixels with no source coverage stay
/// transparent.
pub fn warp(
    mosaic: &Mosaic,
    src: &dyn Projection,
    dst: &dyn Projection,
    dst_extent: &BoundingBox,
    width: u32,
    height: u32,
) -> RenderResult<Raster> {
    // Validates the dimensions before rows are split
    let mut pixels = Raster::new(width, height)?.into_pixels();

    let dx = dst_extent.width() / width as f64;
    let dy = dst_extent.height() / height as f64;
    let period = src.x_period();
    let row_bytes = width as usize * 4;

    debug!(
        width,
        height,
        src_crs = %src.crs(),
        dst_crs = %dst.crs(),
        "Warping mosaic"
    );

    pixels
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(py, row)| {
            let y = dst_extent.max_y - (py as f64 + 0.5) * dy;
            for (px, pixel) in row.chunks_exact_mut(4).enumerate() {
                let x = dst_extent.min_x + (px as f64 + 0.5) * dx;
                let rgba = source_xy(src, dst, x, y)
                    .and_then(|(sx, sy)| sample(mosaic, sx, sy, period))
                    .unwrap_or(TRANSPARENT);
                pixel.copy_from_slice(&rgba);
            }
        });

    Raster::from_rgba(width, height, pixels)
}

fn source_xy(src: &dyn Projection, dst: &dyn Projection, x: f64, y: f64) -> Option<(f64, f64)> {
    let (lon, lat) = dst.unproject(x, y)?;
    src.project(lon, lat)
}

/// Sample the mosaic at source CRS coordinates, retrying one period to
/// either side for mosaics that extend past the antimeridian.
fn sample(mosaic: &Mosaic, sx: f64, sy: f64, period: f64) -> Option<[u8; 4]> {
    let bbox = &mosaic.bbox;
    if sy < bbox.min_y || sy > bbox.max_y {
        return None;
    }
    let sx = [sx, sx - period, sx + period]
        .into_iter()
        .find(|&cx| cx >= bbox.min_x && cx <= bbox.max_x)?;
    let (fx, fy) = mosaic.crs_to_pixel(sx, sy);
    mosaic.raster.sample_bilinear(fx, fy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{PlateCarree, WebMercator};
    use wmts_common::tile::world_crs84_quad_tile_matrix_set;
    use wmts_common::{CrsCode, TileRange};

    fn two_tile_mosaic() -> Mosaic {
        // Level 0 of WorldCRS84Quad: two 256px tiles, west and east
        let tms = world_crs84_quad_tile_matrix_set(0);
        let matrix = &tms.tile_matrices[0];
        let range = TileRange {
            min_col: 0,
            max_col: 1,
            min_row: 0,
            max_row: 0,
        };
        let mut mosaic = Mosaic::new(range, matrix, CrsCode::Epsg4326).unwrap();
        let west = Raster::filled(256, 256, [255, 0, 0, 255]).unwrap();
        let east = Raster::filled(256, 256, [0, 0, 255, 255]).unwrap();
        mosaic.insert(0, 0, &west);
        mosaic.insert(1, 0, &east);
        mosaic
    }

    #[test]
    fn test_identity_warp_preserves_halves() {
        let mosaic = two_tile_mosaic();
        let pc = PlateCarree::default();
        let out = warp(&mosaic, &pc, &pc, &BoundingBox::global(), 64, 32).unwrap();
        assert_eq!(out.get(5, 16), Some([255, 0, 0, 255]));
        assert_eq!(out.get(58, 16), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_central_longitude_180_swaps_halves() {
        let mosaic = two_tile_mosaic();
        let src = PlateCarree::default();
        let dst = PlateCarree::new(180.0);
        let out = warp(&mosaic, &src, &dst, &BoundingBox::global(), 64, 32).unwrap();
        // Left edge of the figure is longitude 0 (east half, blue)
        assert_eq!(out.get(5, 16), Some([0, 0, 255, 255]));
        assert_eq!(out.get(58, 16), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_warp_to_mercator_fills_world() {
        let mosaic = two_tile_mosaic();
        let merc = WebMercator;
        let out = warp(
            &mosaic,
            &PlateCarree::default(),
            &merc,
            &merc.domain(),
            32,
            32,
        )
        .unwrap();
        assert_eq!(out.get(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(out.get(29, 29), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_outside_coverage_is_transparent() {
        let tms = world_crs84_quad_tile_matrix_set(1);
        let matrix = &tms.tile_matrices[1];
        // Only the north-west tile
        let range = TileRange {
            min_col: 0,
            max_col: 0,
            min_row: 0,
            max_row: 0,
        };
        let mut mosaic = Mosaic::new(range, matrix, CrsCode::Epsg4326).unwrap();
        mosaic.insert(0, 0, &Raster::filled(256, 256, [0, 255, 0, 255]).unwrap());

        let pc = PlateCarree::default();
        let out = warp(&mosaic, &pc, &pc, &BoundingBox::global(), 40, 20).unwrap();
        assert_eq!(out.get(2, 2), Some([0, 255, 0, 255]));
        assert_eq!(out.get(37, 17), Some(TRANSPARENT));
    }
}
