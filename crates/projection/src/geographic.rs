//! Plate Carrée (equirectangular) projection.
//!
//! Projected coordinates are degrees: x is longitude relative to the central
//! meridian, y is latitude. With a central longitude of 0 this is exactly
//! EPSG:4326 in lon/lat order.

use wmts_common::{BoundingBox, CrsCode};

use crate::Projection;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlateCarree {
    /// Central meridian in degrees
    pub central_longitude: f64,
}

impl PlateCarree {
    pub fn new(central_longitude: f64) -> Self {
        Self {
            central_longitude: wrap_longitude(central_longitude),
        }
    }
}

/// Wrap a longitude into [-180, 180], leaving both endpoints untouched.
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the sign of the input at the seam
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

impl Projection for PlateCarree {
    fn crs(&self) -> CrsCode {
        CrsCode::Epsg4326
    }

    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        Some((wrap_longitude(lon - self.central_longitude), lat))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
            return None;
        }
        Some((wrap_longitude(x + self.central_longitude), y))
    }

    fn domain(&self) -> BoundingBox {
        BoundingBox::global()
    }
}
