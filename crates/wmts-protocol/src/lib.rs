//! OGC WMTS 1.0.0 client-side protocol support.
//!
//! Supports:
//! - Parsing GetCapabilities documents (layers, styles, formats, dimensions,
//!   tile matrix sets and their limits, ResourceURL templates)
//! - Building GetTile requests for both KVP and RESTful bindings
//! - Recognising OWS exception reports

pub mod capabilities;
pub mod exception;
pub mod gettile;

pub use capabilities::{
    Capabilities, Dimension, Layer, OperationEndpoint, RequestEncoding, ResourceUrl, Style,
    TileMatrixSetLink,
};
pub use exception::{parse_exception_report, ServiceException};
pub use gettile::{capabilities_url, GetTileRequest, TileUrlBuilder};
