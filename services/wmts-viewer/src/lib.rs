//! WMTS map viewer.
//!
//! Connects to a WMTS service, prints the layers it offers, renders one
//! layer in a chosen projection with a coastline overlay, and opens the
//! resulting PNG.

pub mod app;
pub mod client;
pub mod coastlines;
pub mod config;
pub mod display;
pub mod listing;
pub mod logging;
pub mod map;

pub use app::{run, RunSummary};
pub use client::{ClientConfig, TileSource, WmtsClient};
pub use coastlines::CoastlineSource;
pub use config::{Args, ViewerConfig, DEFAULT_LAYER, DEFAULT_SERVICE_URL};
pub use listing::layer_listing;
pub use map::{LayerOptions, LayerReport, MapFigure};
