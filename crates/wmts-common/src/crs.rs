//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BoundingBox;

/// CRS codes the viewer can project to and from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    LatLon,
}

/// A parsed CRS identifier together with the axis order it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCrs {
    pub code: CrsCode,
    pub axis_order: AxisOrder,
}

impl CrsCode {
    /// Parse a CRS identifier as it appears in WMTS capabilities or on the command line.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326", "epsg:3857", "EPSG:900913"
    /// - "CRS:84" (EPSG:4326 with lon/lat axis order)
    /// - "urn:ogc:def:crs:EPSG::4326", "urn:ogc:def:crs:EPSG:6.18:3:3857"
    /// - "urn:ogc:def:crs:OGC:1.3:CRS84"
    /// - "http://www.opengis.net/def/crs/EPSG/0/4326"
    pub fn parse(s: &str) -> Result<ParsedCrs, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        let (code_str, authority_is_epsg) = if let Some(rest) = normalized.strip_prefix("URN:OGC:DEF:CRS:") {
            // urn:ogc:def:crs:{authority}:{version}:{code}
            let authority = rest.split(':').next().unwrap_or_default();
            let code = rest.rsplit(':').next().unwrap_or_default();
            (code.to_string(), authority == "EPSG")
        } else if normalized.starts_with("HTTP://WWW.OPENGIS.NET/DEF/CRS/") {
            let mut parts = normalized.trim_end_matches('/').rsplit('/');
            let code = parts.next().unwrap_or_default();
            let _version = parts.next();
            let authority = parts.next().unwrap_or_default();
            (code.to_string(), authority == "EPSG")
        } else if let Some(code) = normalized.strip_prefix("EPSG:") {
            // Plain "EPSG:n" keeps the traditional x/y order.
            return Self::from_epsg_code(code)
                .map(|code| ParsedCrs {
                    code,
                    axis_order: AxisOrder::XY,
                })
                .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()));
        } else if normalized == "CRS:84" {
            return Ok(ParsedCrs {
                code: CrsCode::Epsg4326,
                axis_order: AxisOrder::XY,
            });
        } else {
            return Err(CrsParseError::UnsupportedCrs(s.to_string()));
        };

        if !authority_is_epsg {
            return match code_str.as_str() {
                "CRS84" => Ok(ParsedCrs {
                    code: CrsCode::Epsg4326,
                    axis_order: AxisOrder::XY,
                }),
                _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
            };
        }

        let code = Self::from_epsg_code(&code_str)
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        // URN and URL forms follow the authority's axis order.
        Ok(ParsedCrs {
            code,
            axis_order: if code.is_geographic() {
                AxisOrder::LatLon
            } else {
                AxisOrder::XY
            },
        })
    }

    /// Parse and keep only the code.
    pub fn from_code(s: &str) -> Result<Self, CrsParseError> {
        Self::parse(s).map(|p| p.code)
    }

    fn from_epsg_code(code: &str) -> Option<Self> {
        match code {
            "4326" => Some(CrsCode::Epsg4326),
            "3857" | "900913" | "3785" => Some(CrsCode::Epsg3857),
            _ => None,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
        }
    }

    /// Meters per CRS unit, used to turn OGC scale denominators into resolutions.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            // Equatorial circumference / 360, as fixed by the WMTS standard.
            CrsCode::Epsg4326 => 111319.49079327358,
            CrsCode::Epsg3857 => 1.0,
        }
    }

    /// Get the valid bounds for this CRS.
    pub fn valid_bounds(&self) -> BoundingBox {
        match self {
            CrsCode::Epsg4326 => BoundingBox::global(),
            CrsCode::Epsg3857 => {
                // Web Mercator bounds (approx ±85.06° latitude)
                let max_extent = 20037508.342789244;
                BoundingBox::new(-max_extent, -max_extent, max_extent, max_extent)
            }
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

impl From<CrsParseError> for crate::WmtsError {
    fn from(err: CrsParseError) -> Self {
        match err {
            CrsParseError::UnsupportedCrs(s) => crate::WmtsError::UnsupportedCrs(s),
        }
    }
}
