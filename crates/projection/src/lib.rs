//! Map projections for the WMTS viewer.
//!
//! Implements the two projections WMTS services commonly publish tiles in,
//! spherical forms only, without external projection libraries.

pub mod geographic;
pub mod mercator;
pub mod transform;

pub use geographic::PlateCarree;
pub use mercator::WebMercator;
pub use transform::{
    project_lon_lat_extent, projection_for, transform_bbox, transform_point, Projection,
    ProjectionError, ProjectionKind,
};
