//! Common types shared across the WMTS map viewer crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod tile;

pub use bbox::BoundingBox;
pub use crs::{AxisOrder, CrsCode};
pub use error::{WmtsError, WmtsResult};
pub use tile::{TileMatrix, TileMatrixLimits, TileMatrixSet, TileRange};
