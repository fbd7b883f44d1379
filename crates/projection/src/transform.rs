//! The projection trait and CRS-to-CRS transformations built on it.

use std::fmt;
use std::str::FromStr;

use wmts_common::{BoundingBox, CrsCode};

use crate::{PlateCarree, WebMercator};

/// A forward/inverse map projection between lon/lat degrees and CRS units.
pub trait Projection: Send + Sync + fmt::Debug {
    /// CRS whose coordinates `project` produces.
    fn crs(&self) -> CrsCode;

    /// Geographic (lon, lat) in degrees to projected (x, y).
    ///
    /// Returns `None` for points the projection cannot represent.
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;

    /// Projected (x, y) to geographic (lon, lat) in degrees.
    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// Full valid extent in projected units.
    fn domain(&self) -> BoundingBox;

    /// Horizontal period in projected units; the x distance one trip
    /// around the globe covers. Used to detect antimeridian jumps.
    fn x_period(&self) -> f64 {
        self.domain().width()
    }
}

/// The projections selectable for a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    PlateCarree,
    WebMercator,
}

impl ProjectionKind {
    pub fn build(self, central_longitude: f64) -> Box<dyn Projection> {
        match self {
            ProjectionKind::PlateCarree => Box::new(PlateCarree::new(central_longitude)),
            ProjectionKind::WebMercator => Box::new(WebMercator),
        }
    }
}

impl FromStr for ProjectionKind {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "plate-carree" | "platecarree" | "equirectangular" | "epsg:4326" => {
                Ok(ProjectionKind::PlateCarree)
            }
            "web-mercator" | "webmercator" | "mercator" | "epsg:3857" => {
                Ok(ProjectionKind::WebMercator)
            }
            _ => Err(ProjectionError::UnknownProjection(s.to_string())),
        }
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionKind::PlateCarree => write!(f, "plate-carree"),
            ProjectionKind::WebMercator => write!(f, "web-mercator"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Unknown projection: {0} (expected plate-carree or web-mercator)")]
    UnknownProjection(String),

    #[error("Extent cannot be represented in {0}")]
    OutOfDomain(CrsCode),

    #[error("Extent {0:?} straddles the map edge; choose a central longitude inside it")]
    StraddlesSeam(BoundingBox),
}

impl From<ProjectionError> for wmts_common::WmtsError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::StraddlesSeam(_) => wmts_common::WmtsError::InvalidBbox(err.to_string()),
            _ => wmts_common::WmtsError::ProjectionError(err.to_string()),
        }
    }
}

/// Default projection for a CRS (Plate Carrée is centred on Greenwich).
pub fn projection_for(crs: CrsCode) -> Box<dyn Projection> {
    match crs {
        CrsCode::Epsg4326 => Box::new(PlateCarree::default()),
        CrsCode::Epsg3857 => Box::new(WebMercator),
    }
}

/// Transform one point between projections via lon/lat.
pub fn transform_point(
    from: &dyn Projection,
    to: &dyn Projection,
    x: f64,
    y: f64,
) -> Option<(f64, f64)> {
    let (lon, lat) = from.unproject(x, y)?;
    to.project(lon, lat)
}

/// Transform a bounding box, densifying each edge with `samples` points so
/// curved edges are bounded correctly. Points that fail to project are
/// skipped; the result is clipped to the target domain.
pub fn transform_bbox(
    from: &dyn Projection,
    to: &dyn Projection,
    bbox: &BoundingBox,
    samples: usize,
) -> Result<BoundingBox, ProjectionError> {
    let n = samples.max(2);
    let step = |i: usize| i as f64 / (n - 1) as f64;

    let mut points = Vec::with_capacity(n * n);
    // Sample the interior as well as the edges: a box spanning a pole or
    // the central meridian can reach its extreme inside.
    for i in 0..n {
        for j in 0..n {
            let x = bbox.min_x + step(i) * bbox.width();
            let y = bbox.min_y + step(j) * bbox.height();
            if let Some(p) = transform_point(from, to, x, y) {
                points.push(p);
            }
        }
    }

    BoundingBox::enclosing(points)
        .and_then(|b| b.intersection(&to.domain()))
        .filter(BoundingBox::is_valid)
        .ok_or(ProjectionError::OutOfDomain(to.crs()))
}

/// Project a lon/lat extent onto `to`, keeping x continuous from `min_lon`
/// eastwards. An extent with `min_lon > max_lon` crosses the antimeridian.
///
/// The result must fit inside the projection's domain in one piece; an
/// extent that would be split by the map edge is rejected instead of being
/// widened to the whole globe.
pub fn project_lon_lat_extent(
    to: &dyn Projection,
    geo: &BoundingBox,
    samples: usize,
) -> Result<BoundingBox, ProjectionError> {
    let n = samples.max(2);
    let step = |i: usize| i as f64 / (n - 1) as f64;
    let mut lon_span = geo.max_x - geo.min_x;
    if lon_span <= 0.0 {
        lon_span += 360.0;
    }

    let domain = to.domain();
    let period = to.x_period();
    let mut points = Vec::with_capacity(n * n);
    for j in 0..n {
        let lat = geo.min_y + step(j) * geo.height();
        let mut prev: Option<f64> = None;
        for i in 0..n {
            let lon = geo.min_x + step(i) * lon_span;
            let Some((mut x, y)) = to.project(lon, lat) else {
                continue;
            };
            if let Some(p) = prev {
                x += ((p - x) / period).round() * period;
            }
            prev = Some(x);
            points.push((x, y));
        }
    }

    let mut bbox = BoundingBox::enclosing(points).ok_or(ProjectionError::OutOfDomain(to.crs()))?;

    let eps = period * 1e-9;
    if bbox.width() >= period - eps {
        bbox.min_x = domain.min_x;
        bbox.max_x = domain.max_x;
    } else if bbox.max_x > domain.max_x + eps {
        bbox.min_x -= period;
        bbox.max_x -= period;
    } else if bbox.min_x < domain.min_x - eps {
        bbox.min_x += period;
        bbox.max_x += period;
    }
    if bbox.min_x < domain.min_x - eps || bbox.max_x > domain.max_x + eps {
        return Err(ProjectionError::StraddlesSeam(*geo));
    }

    bbox.intersection(&domain)
        .filter(BoundingBox::is_valid)
        .ok_or(ProjectionError::OutOfDomain(to.crs()))
}
