//! WMTS Tile Matrix and TileMatrixSet definitions.
//!
//! Implements OGC WMTS tile matrix concepts: a tile matrix set is a pyramid
//! of tile matrices (zoom levels) in a single CRS, each anchored at a
//! top-left corner and cut into fixed-size tiles.

use crate::{BoundingBox, CrsCode};
use serde::{Deserialize, Serialize};

/// Standardized rendering pixel size (0.28mm) from OGC WMTS 1.0.0.
pub const STANDARD_PIXEL_SIZE: f64 = 0.00028;

/// A single tile matrix (zoom level) definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrix {
    /// Identifier (often the zoom level as string)
    pub identifier: String,

    /// Scale denominator
    pub scale_denominator: f64,

    /// Top-left corner coordinates, always (x, y) in CRS units
    pub top_left_corner: (f64, f64),

    /// Tile width in pixels
    pub tile_width: u32,

    /// Tile height in pixels
    pub tile_height: u32,

    /// Number of tile columns
    pub matrix_width: u32,

    /// Number of tile rows
    pub matrix_height: u32,
}

impl TileMatrix {
    /// Resolution in CRS units per pixel.
    pub fn resolution(&self, crs: CrsCode) -> f64 {
        self.scale_denominator * STANDARD_PIXEL_SIZE / crs.meters_per_unit()
    }

    /// Extent of a single tile in CRS units (x span, y span).
    pub fn tile_span(&self, crs: CrsCode) -> (f64, f64) {
        let res = self.resolution(crs);
        (res * self.tile_width as f64, res * self.tile_height as f64)
    }

    /// Get the bounding box for a specific tile.
    pub fn tile_bbox(&self, crs: CrsCode, col: u32, row: u32) -> BoundingBox {
        let (span_x, span_y) = self.tile_span(crs);

        let min_x = self.top_left_corner.0 + col as f64 * span_x;
        let max_y = self.top_left_corner.1 - row as f64 * span_y;

        BoundingBox::new(min_x, max_y - span_y, min_x + span_x, max_y)
    }

    /// Bounding box covered by the whole matrix.
    pub fn matrix_bbox(&self, crs: CrsCode) -> BoundingBox {
        let (span_x, span_y) = self.tile_span(crs);
        let (left, top) = self.top_left_corner;
        BoundingBox::new(
            left,
            top - span_y * self.matrix_height as f64,
            left + span_x * self.matrix_width as f64,
            top,
        )
    }

    /// Tiles overlapping `bbox` (given in the matrix CRS), clamped to the matrix.
    ///
    /// Returns `None` when the bbox lies entirely outside the matrix.
    pub fn tile_range(&self, crs: CrsCode, bbox: &BoundingBox) -> Option<TileRange> {
        if self.matrix_width == 0 || self.matrix_height == 0 {
            return None;
        }
        if !self.matrix_bbox(crs).intersects(bbox) {
            return None;
        }

        let (span_x, span_y) = self.tile_span(crs);
        let (left, top) = self.top_left_corner;

        let max_col = (self.matrix_width - 1) as i64;
        let max_row = (self.matrix_height - 1) as i64;
        let clamp = |v: f64, hi: i64| (v as i64).clamp(0, hi) as u32;

        // A small epsilon keeps an edge that lands exactly on a tile boundary
        // from pulling in the neighbouring tile.
        let eps = 1e-9;
        Some(TileRange {
            min_col: clamp(((bbox.min_x - left) / span_x + eps).floor(), max_col),
            max_col: clamp(((bbox.max_x - left) / span_x - eps).ceil() - 1.0, max_col),
            min_row: clamp(((top - bbox.max_y) / span_y + eps).floor(), max_row),
            max_row: clamp(((top - bbox.min_y) / span_y - eps).ceil() - 1.0, max_row),
        })
    }
}

/// Per-matrix limits advertised by a layer's TileMatrixSetLink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMatrixLimits {
    pub tile_matrix: String,
    pub min_row: u32,
    pub max_row: u32,
    pub min_col: u32,
    pub max_col: u32,
}

/// An inclusive rectangle of tile indices within one tile matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    pub min_col: u32,
    pub max_col: u32,
    pub min_row: u32,
    pub max_row: u32,
}

impl TileRange {
    pub fn cols(&self) -> u32 {
        self.max_col - self.min_col + 1
    }

    pub fn rows(&self) -> u32 {
        self.max_row - self.min_row + 1
    }

    /// Number of tiles in the range.
    pub fn len(&self) -> usize {
        self.cols() as usize * self.rows() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate (col, row) pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.min_row..=self.max_row)
            .flat_map(move |row| (self.min_col..=self.max_col).map(move |col| (col, row)))
    }

    /// Restrict the range to a layer's advertised limits.
    pub fn clamp_to(&self, limits: &TileMatrixLimits) -> Option<TileRange> {
        let clamped = TileRange {
            min_col: self.min_col.max(limits.min_col),
            max_col: self.max_col.min(limits.max_col),
            min_row: self.min_row.max(limits.min_row),
            max_row: self.max_row.min(limits.max_row),
        };
        if clamped.min_col > clamped.max_col || clamped.min_row > clamped.max_row {
            None
        } else {
            Some(clamped)
        }
    }

    /// Bounding box covered by every tile of the range.
    pub fn bbox(&self, matrix: &TileMatrix, crs: CrsCode) -> BoundingBox {
        let top_left = matrix.tile_bbox(crs, self.min_col, self.min_row);
        let bottom_right = matrix.tile_bbox(crs, self.max_col, self.max_row);
        BoundingBox::new(
            top_left.min_x,
            bottom_right.min_y,
            bottom_right.max_x,
            top_left.max_y,
        )
    }
}

/// A complete tile matrix set definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrixSet {
    /// Identifier for the tile matrix set
    pub identifier: String,

    /// Coordinate reference system
    pub crs: CrsCode,

    /// Well-known scale set URI (optional)
    pub well_known_scale_set: Option<String>,

    /// Individual tile matrices (zoom levels)
    pub tile_matrices: Vec<TileMatrix>,
}

impl TileMatrixSet {
    /// Get a tile matrix by identifier.
    pub fn get_matrix(&self, identifier: &str) -> Option<&TileMatrix> {
        self.tile_matrices
            .iter()
            .find(|m| m.identifier == identifier)
    }

    /// Pick the coarsest matrix whose resolution is at least as fine as `target`
    /// (CRS units per pixel). Falls back to the finest matrix available.
    pub fn matrix_for_resolution(&self, target: f64) -> Option<&TileMatrix> {
        let crs = self.crs;
        let mut by_res: Vec<&TileMatrix> = self.tile_matrices.iter().collect();
        // coarse -> fine
        by_res.sort_by(|a, b| b.resolution(crs).total_cmp(&a.resolution(crs)));

        by_res
            .iter()
            .find(|m| m.resolution(crs) <= target * (1.0 + 1e-6))
            .or_else(|| by_res.last())
            .copied()
    }
}

/// Standard Web Mercator (GoogleMapsCompatible) tile matrix set.
pub fn web_mercator_tile_matrix_set(max_zoom: u32) -> TileMatrixSet {
    let max_extent = 20037508.342789244;

    let tile_matrices: Vec<TileMatrix> = (0..=max_zoom)
        .map(|z| {
            let n = 2u32.pow(z);
            TileMatrix {
                identifier: z.to_string(),
                scale_denominator: 559082264.0287178 / (n as f64),
                top_left_corner: (-max_extent, max_extent),
                tile_width: 256,
                tile_height: 256,
                matrix_width: n,
                matrix_height: n,
            }
        })
        .collect();

    TileMatrixSet {
        identifier: "GoogleMapsCompatible".to_string(),
        crs: CrsCode::Epsg3857,
        well_known_scale_set: Some(
            "urn:ogc:def:wkss:OGC:1.0:GoogleMapsCompatible".to_string(),
        ),
        tile_matrices,
    }
}

/// Standard geographic tile matrix set (2 columns by 1 row at level 0).
pub fn world_crs84_quad_tile_matrix_set(max_zoom: u32) -> TileMatrixSet {
    let tile_matrices: Vec<TileMatrix> = (0..=max_zoom)
        .map(|z| {
            let n_rows = 2u32.pow(z);
            TileMatrix {
                identifier: z.to_string(),
                scale_denominator: 279541132.0143589 / (n_rows as f64),
                top_left_corner: (-180.0, 90.0),
                tile_width: 256,
                tile_height: 256,
                matrix_width: n_rows * 2,
                matrix_height: n_rows,
            }
        })
        .collect();

    TileMatrixSet {
        identifier: "WorldCRS84Quad".to_string(),
        crs: CrsCode::Epsg4326,
        well_known_scale_set: Some("urn:ogc:def:wkss:OGC:1.0:GoogleCRS84Quad".to_string()),
        tile_matrices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_mercator_level_zero_covers_world() {
        let tms = web_mercator_tile_matrix_set(4);
        let m0 = tms.get_matrix("0").unwrap();
        let bbox = m0.tile_bbox(tms.crs, 0, 0);

        let max_extent = 20037508.342789244;
        assert!((bbox.min_x - (-max_extent)).abs() < 1.0);
        assert!((bbox.max_x - max_extent).abs() < 1.0);
        assert!((bbox.min_y - (-max_extent)).abs() < 1.0);
    }

    #[test]
    fn test_crs84_quad_tile_bounds() {
        let tms = world_crs84_quad_tile_matrix_set(3);
        let m0 = tms.get_matrix("0").unwrap();

        let west = m0.tile_bbox(tms.crs, 0, 0);
        assert!((west.min_x - (-180.0)).abs() < 1e-6);
        assert!((west.max_x - 0.0).abs() < 1e-6);
        assert!((west.min_y - (-90.0)).abs() < 1e-6);
        assert!((west.max_y - 90.0).abs() < 1e-6);

        let m1 = tms.get_matrix("1").unwrap();
        let sw = m1.tile_bbox(tms.crs, 1, 1);
        assert!((sw.min_x - (-90.0)).abs() < 1e-6);
        assert!((sw.max_x - 0.0).abs() < 1e-6);
        assert!((sw.max_y - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_tile_range_global() {
        let tms = world_crs84_quad_tile_matrix_set(3);
        let m2 = tms.get_matrix("2").unwrap();
        let range = m2.tile_range(tms.crs, &BoundingBox::global()).unwrap();

        assert_eq!(range.min_col, 0);
        assert_eq!(range.max_col, 7);
        assert_eq!(range.min_row, 0);
        assert_eq!(range.max_row, 3);
        assert_eq!(range.len(), 32);
    }

    #[test]
    fn test_tile_range_partial_and_outside() {
        let tms = world_crs84_quad_tile_matrix_set(3);
        let m1 = tms.get_matrix("1").unwrap();

        // Europe-ish: lon 0..45, lat 30..60 → column 2, row 0
        let range = m1
            .tile_range(tms.crs, &BoundingBox::new(0.0, 30.0, 45.0, 60.0))
            .unwrap();
        assert_eq!((range.min_col, range.max_col), (2, 2));
        assert_eq!((range.min_row, range.max_row), (0, 0));

        assert!(m1
            .tile_range(tms.crs, &BoundingBox::new(200.0, 0.0, 210.0, 10.0))
            .is_none());
    }

    #[test]
    fn test_tile_range_iteration_order() {
        let range = TileRange {
            min_col: 1,
            max_col: 2,
            min_row: 5,
            max_row: 6,
        };
        let tiles: Vec<_> = range.iter().collect();
        assert_eq!(tiles, vec![(1, 5), (2, 5), (1, 6), (2, 6)]);
    }

    #[test]
    fn test_clamp_to_limits() {
        let range = TileRange {
            min_col: 0,
            max_col: 7,
            min_row: 0,
            max_row: 3,
        };
        let limits = TileMatrixLimits {
            tile_matrix: "2".to_string(),
            min_row: 1,
            max_row: 2,
            min_col: 3,
            max_col: 10,
        };
        let clamped = range.clamp_to(&limits).unwrap();
        assert_eq!(clamped.min_col, 3);
        assert_eq!(clamped.max_col, 7);
        assert_eq!(clamped.min_row, 1);
        assert_eq!(clamped.max_row, 2);

        let disjoint = TileMatrixLimits {
            tile_matrix: "2".to_string(),
            min_row: 10,
            max_row: 12,
            min_col: 0,
            max_col: 1,
        };
        assert!(range.clamp_to(&disjoint).is_none());
    }

    #[test]
    fn test_matrix_for_resolution() {
        let tms = world_crs84_quad_tile_matrix_set(5);

        // Level 2 resolution = 180 / (4 * 256) deg per pixel
        let level2 = 180.0 / 1024.0;
        let chosen = tms.matrix_for_resolution(level2).unwrap();
        assert_eq!(chosen.identifier, "2");

        // Slightly coarser target still needs level 2
        let chosen = tms.matrix_for_resolution(level2 * 1.5).unwrap();
        assert_eq!(chosen.identifier, "2");

        // Finer than anything available → finest matrix
        let chosen = tms.matrix_for_resolution(1e-9).unwrap();
        assert_eq!(chosen.identifier, "5");
    }
}
