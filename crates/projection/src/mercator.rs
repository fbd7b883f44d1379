//! Spherical Web Mercator projection (EPSG:3857).

use std::f64::consts::PI;

use wmts_common::{BoundingBox, CrsCode};

use crate::Projection;

/// Earth radius used by EPSG:3857 (WGS84 semi-major axis)
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the projected square world ends.
pub const MAX_LATITUDE: f64 = 85.05112877980659;

/// Half the width of the projected world in meters.
pub const MAX_EXTENT: f64 = 20037508.342789244;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn crs(&self) -> CrsCode {
        CrsCode::Epsg3857
    }

    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        // Poles are clamped so global extents stay representable
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let lon = lon.clamp(-180.0, 180.0);

        let x = EARTH_RADIUS * lon.to_radians();
        let y = EARTH_RADIUS * ((PI / 4.0) + (lat.to_radians() / 2.0)).tan().ln();
        Some((x, y))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let limit = MAX_EXTENT * (1.0 + 1e-12);
        if !(-limit..=limit).contains(&x) || !(-limit..=limit).contains(&y) {
            return None;
        }
        let lon = (x / EARTH_RADIUS).to_degrees().clamp(-180.0, 180.0);
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Some((lon, lat))
    }

    fn domain(&self) -> BoundingBox {
        BoundingBox::new(-MAX_EXTENT, -MAX_EXTENT, MAX_EXTENT, MAX_EXTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, assert_coords_approx_eq};

    #[test]
    fn test_origin() {
        let (x, y) = WebMercator.project(0.0, 0.0).unwrap();
        assert_coords_approx_eq!((x, y), (0.0, 0.0), 1e-9);
    }

    #[test]
    fn test_world_corners() {
        let (x, y) = WebMercator.project(180.0, MAX_LATITUDE).unwrap();
        assert_approx_eq!(x, MAX_EXTENT, 1e-3);
        assert_approx_eq!(y, MAX_EXTENT, 1e-3);

        let (lon, lat) = WebMercator.unproject(-MAX_EXTENT, -MAX_EXTENT).unwrap();
        assert_coords_approx_eq!((lon, lat), (-180.0, -MAX_LATITUDE), 1e-9);
    }

    #[test]
    fn test_pole_is_clamped() {
        let (_, y) = WebMercator.project(0.0, 90.0).unwrap();
        assert_approx_eq!(y, MAX_EXTENT, 1e-3);
    }

    #[test]
    fn test_known_city() {
        // New York City
        let (x, y) = WebMercator.project(-74.0060, 40.7128).unwrap();
        assert_approx_eq!(x, -8238310.24, 1.0);
        assert_approx_eq!(y, 4970071.58, 1.0);

        let (lon, lat) = WebMercator.unproject(x, y).unwrap();
        assert_coords_approx_eq!((lon, lat), (-74.0060, 40.7128), 1e-9);
    }

    #[test]
    fn test_unproject_outside_world() {
        assert!(WebMercator.unproject(MAX_EXTENT * 2.0, 0.0).is_none());
    }
}
