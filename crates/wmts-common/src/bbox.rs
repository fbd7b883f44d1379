//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::WmtsError;

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The whole globe in longitude/latitude degrees.
    pub fn global() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Parse an extent string: "minx,miny,maxx,maxy"
    pub fn from_csv(s: &str) -> Result<Self, BboxParseError> {
        let bbox = Self::parse_values(s)?;
        if !bbox.is_valid() {
            return Err(BboxParseError::Inverted(s.to_string()));
        }
        Ok(bbox)
    }

    /// Parse a lon/lat extent "min_lon,min_lat,max_lon,max_lat".
    ///
    /// `min_lon > max_lon` is accepted and denotes an extent crossing the
    /// antimeridian, e.g. "170,-20,-170,20".
    pub fn from_lon_lat_csv(s: &str) -> Result<Self, BboxParseError> {
        let bbox = Self::parse_values(s)?;
        let finite = [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || bbox.min_x == bbox.max_x || bbox.min_y >= bbox.max_y {
            return Err(BboxParseError::Inverted(s.to_string()));
        }
        Ok(bbox)
    }

    fn parse_values(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        Ok(Self {
            min_x: parse(parts[0])?,
            min_y: parse(parts[1])?,
            max_x: parse(parts[2])?,
            max_y: parse(parts[3])?,
        })
    }

    /// Parse an OWS corner pair ("x y") into a coordinate tuple.
    pub fn parse_corner(s: &str) -> Option<(f64, f64)> {
        let mut it = s.split_whitespace().map(|v| v.parse::<f64>());
        match (it.next(), it.next(), it.next()) {
            (Some(Ok(a)), Some(Ok(b)), None) => Some((a, b)),
            _ => None,
        }
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width() / self.height()
    }

    /// True when min < max on both axes and all values are finite.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }

    /// For lon/lat extents: true when the box wraps past 180 degrees.
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_x > self.max_x
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Smallest bbox enclosing a set of points, or `None` when no point is finite.
    pub fn enclosing<I>(points: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut acc: Option<BoundingBox> = None;
        for (x, y) in points {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            acc = Some(match acc {
                None => BoundingBox::new(x, y, x, y),
                Some(b) => BoundingBox::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
            });
        }
        acc
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid extent format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in extent: {0}")]
    InvalidNumber(String),

    #[error("Extent has min >= max: {0}")]
    Inverted(String),
}

impl From<BboxParseError> for WmtsError {
    fn from(err: BboxParseError) -> Self {
        WmtsError::InvalidBbox(err.to_string())
    }
}
