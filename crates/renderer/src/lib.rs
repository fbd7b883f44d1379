//! Raster composition for WMTS map figures.
//!
//! - Tile decoding and mosaicking
//! - Reprojection of a mosaic into the figure projection
//! - Coastline stroking
//! - PNG encoding

pub mod coastline;
pub mod error;
pub mod png;
pub mod raster;
pub mod warp;

pub use coastline::{draw_lines, parse_color, CoastlineStyle, LonLatLine};
pub use error::{RenderError, RenderResult};
pub use raster::{Mosaic, Raster};
pub use warp::warp;
