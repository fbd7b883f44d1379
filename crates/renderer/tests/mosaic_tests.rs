//! Tests for decoding tiles and assembling them into mosaics.

use projection::PlateCarree;
use renderer::{warp, Mosaic, Raster, RenderError};
use test_utils::{assert_approx_eq, solid_tile_jpeg, solid_tile_png, split_tile_png, tile_color};
use wmts_common::tile::world_crs84_quad_tile_matrix_set;
use wmts_common::{BoundingBox, CrsCode, TileRange};

#[test]
fn test_decode_png_tile() {
    let tile = Raster::from_encoded(&solid_tile_png(16, 8, [1, 2, 3, 255])).unwrap();
    assert_eq!((tile.width(), tile.height()), (16, 8));
    assert_eq!(tile.get(15, 7), Some([1, 2, 3, 255]));
}

#[test]
fn test_decode_jpeg_tile() {
    let tile = Raster::from_encoded(&solid_tile_jpeg(16, 16, [0, 200, 0])).unwrap();
    let p = tile.get(8, 8).unwrap();
    assert!(p[1] > 190);
    assert_eq!(p[3], 255);
}

#[test]
fn test_decode_garbage_fails() {
    let err = Raster::from_encoded(b"<html>not a tile</html>").unwrap_err();
    assert!(matches!(err, RenderError::Decode(_)));
}

#[test]
fn test_mosaic_rejects_absurd_tile_size() {
    let tms = world_crs84_quad_tile_matrix_set(1);
    let mut matrix = tms.get_matrix("1").unwrap().clone();
    matrix.tile_width = u32::MAX / 2;
    let range = TileRange {
        min_col: 0,
        max_col: 3,
        min_row: 0,
        max_row: 0,
    };

    let err = Mosaic::new(range, &matrix, CrsCode::Epsg4326).unwrap_err();
    assert!(matches!(
        err,
        RenderError::InvalidDimensions { width: u32::MAX, .. }
    ));

    // No overflow, but still far too large to allocate
    matrix.tile_width = 1 << 20;
    matrix.tile_height = 1 << 20;
    let err = Mosaic::new(range, &matrix, CrsCode::Epsg4326).unwrap_err();
    assert!(matches!(err, RenderError::InvalidDimensions { .. }));
}

#[test]
fn test_mosaic_places_tiles_by_index() {
    let tms = world_crs84_quad_tile_matrix_set(2);
    let matrix = tms.get_matrix("2").unwrap();
    let range = TileRange {
        min_col: 3,
        max_col: 4,
        min_row: 1,
        max_row: 2,
    };
    let mut mosaic = Mosaic::new(range, matrix, CrsCode::Epsg4326).unwrap();
    assert_eq!((mosaic.raster.width(), mosaic.raster.height()), (512, 512));

    for (col, row) in range.iter() {
        let tile = Raster::from_encoded(&solid_tile_png(256, 256, tile_color(col, row))).unwrap();
        mosaic.insert(col, row, &tile);
    }

    assert_eq!(mosaic.raster.get(0, 0), Some(tile_color(3, 1)));
    assert_eq!(mosaic.raster.get(511, 0), Some(tile_color(4, 1)));
    assert_eq!(mosaic.raster.get(0, 511), Some(tile_color(3, 2)));
    assert_eq!(mosaic.raster.get(300, 300), Some(tile_color(4, 2)));

    // Level 2: 45 degree tiles
    let b = mosaic.bbox;
    assert_approx_eq!(b.min_x, -45.0, 1e-9);
    assert_approx_eq!(b.max_x, 45.0, 1e-9);
    assert_approx_eq!(b.min_y, -45.0, 1e-9);
    assert_approx_eq!(b.max_y, 45.0, 1e-9);
}

#[test]
fn test_missing_tile_stays_transparent() {
    let tms = world_crs84_quad_tile_matrix_set(0);
    let matrix = tms.get_matrix("0").unwrap();
    let range = matrix
        .tile_range(CrsCode::Epsg4326, &BoundingBox::global())
        .unwrap();
    let mut mosaic = Mosaic::new(range, matrix, CrsCode::Epsg4326).unwrap();
    mosaic.insert(0, 0, &Raster::filled(256, 256, [9, 9, 9, 255]).unwrap());

    assert_eq!(mosaic.raster.get(10, 10), Some([9, 9, 9, 255]));
    assert_eq!(mosaic.raster.get(300, 10), Some([0, 0, 0, 0]));
}

#[test]
fn test_warp_split_tile_regional_extent() {
    // One global tile, red west of 0 and blue east of it
    let tms = world_crs84_quad_tile_matrix_set(0);
    let matrix = tms.get_matrix("0").unwrap();
    let range = TileRange {
        min_col: 0,
        max_col: 1,
        min_row: 0,
        max_row: 0,
    };
    let mut mosaic = Mosaic::new(range, matrix, CrsCode::Epsg4326).unwrap();
    let west = Raster::from_encoded(&split_tile_png(256, 256, [255, 0, 0, 255], [0, 255, 0, 255])).unwrap();
    mosaic.insert(0, 0, &west);
    mosaic.insert(1, 0, &Raster::filled(256, 256, [0, 0, 255, 255]).unwrap());

    // A figure over (-120..-60, 0..30) sees only the red and green halves of tile 0
    let pc = PlateCarree::default();
    let extent = BoundingBox::new(-120.0, 0.0, -60.0, 30.0);
    let out = warp(&mosaic, &pc, &pc, &extent, 60, 30).unwrap();
    assert_eq!(out.get(5, 15), Some([255, 0, 0, 255]));
    assert_eq!(out.get(55, 15), Some([0, 255, 0, 255]));
}
