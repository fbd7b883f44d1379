//! The end-to-end viewer run: list layers, render the selected one with
//! coastlines, save and show.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::client::{TileSource, WmtsClient};
use crate::config::ViewerConfig;
use crate::display;
use crate::listing::layer_listing;
use crate::map::{LayerOptions, LayerReport, MapFigure};

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub listing: String,
    pub layer: Option<LayerReport>,
    /// Coastline segments drawn, `None` when the overlay was off or failed
    pub coastline_segments: Option<usize>,
    pub output: Option<PathBuf>,
}

/// Run the viewer, writing the layer listing to `out`.
pub async fn run<W: Write>(config: &ViewerConfig, out: &mut W) -> Result<RunSummary> {
    let client = WmtsClient::connect(&config.url, config.client.clone())
        .await
        .with_context(|| format!("Failed to load capabilities from {}", config.url))?;

    let listing = layer_listing(client.capabilities());
    writeln!(out, "{}", listing).context("Failed to write layer listing")?;

    if config.list_only {
        return Ok(RunSummary {
            listing,
            layer: None,
            coastline_segments: None,
            output: None,
        });
    }

    client
        .capabilities()
        .layer(&config.layer)
        .with_context(|| format!("Layer {} is not offered by {}", config.layer, config.url))?;

    let projection = config.projection.build(config.central_longitude);
    let mut figure = MapFigure::new(projection, config.extent, config.width)
        .context("Failed to create map figure")?;

    let options = LayerOptions {
        time: config.time.clone(),
        max_concurrent_tiles: config.max_concurrent_tiles,
    };
    let report = figure
        .add_wmts(&client, client.capabilities(), &config.layer, &options)
        .await
        .with_context(|| format!("Failed to draw layer {}", config.layer))?;

    if report.tiles_failed > 0 {
        warn!(
            failed = report.tiles_failed,
            requested = report.tiles_requested,
            "Some tiles could not be fetched"
        );
    }

    let coastline_segments = match &config.coastlines {
        Some(source) => {
            let fetcher: &dyn TileSource = &client;
            match figure
                .coastlines(source, fetcher, &config.cache_dir, &config.coastline_style)
                .await
            {
                Ok(n) => Some(n),
                Err(e) => {
                    warn!(error = %e, source = %source, "Coastlines unavailable, continuing without them");
                    None
                }
            }
        }
        None => None,
    };

    figure
        .save(&config.output)
        .with_context(|| format!("Failed to save figure to {}", config.output.display()))?;

    if config.show {
        if let Err(e) = display::show(&config.output) {
            warn!(error = %e, "Could not open figure; it is saved at {}", config.output.display());
        }
    }

    info!(
        layer = %report.layer,
        tile_matrix = %report.tile_matrix,
        output = %config.output.display(),
        "Done"
    );

    Ok(RunSummary {
        listing,
        layer: Some(report),
        coastline_segments,
        output: Some(config.output.clone()),
    })
}
