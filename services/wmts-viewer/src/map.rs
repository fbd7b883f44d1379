//! Map figure composition: WMTS imagery warped into a projection with
//! overlays drawn on top.

use std::collections::BTreeMap;
use std::path::Path;

use futures::stream::{self, StreamExt};
use projection::{project_lon_lat_extent, projection_for, transform_bbox, Projection};
use renderer::{draw_lines, warp, CoastlineStyle, LonLatLine, Mosaic, Raster};
use tracing::{debug, info, instrument, warn};
use wmts_common::{BoundingBox, TileMatrix, TileMatrixSet, TileRange, WmtsError, WmtsResult};
use wmts_protocol::{Capabilities, GetTileRequest, Layer, TileUrlBuilder};

use crate::client::TileSource;
use crate::coastlines::{self, CoastlineSource};

/// Figure background behind the imagery.
pub const BACKGROUND: [u8; 4] = [255, 255, 255, 255];

/// Formats tried in order before falling back to the first advertised.
pub const FORMAT_PREFERENCE: &[&str] = &["image/jpeg", "image/png"];

/// Samples per edge when transforming extents between projections.
const EXTENT_SAMPLES: usize = 21;

/// Refuse to fetch more tiles than this for one layer.
pub const MAX_TILES: usize = 4096;

/// Options for adding a WMTS layer.
#[derive(Debug, Clone)]
pub struct LayerOptions {
    /// Overrides the layer's default `Time` dimension
    pub time: Option<String>,
    pub max_concurrent_tiles: usize,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            time: None,
            max_concurrent_tiles: 4,
        }
    }
}

/// Everything needed to fetch one layer's tiles for a figure.
#[derive(Debug, Clone)]
pub struct TilePlan {
    pub tile_matrix_set: TileMatrixSet,
    pub matrix: TileMatrix,
    pub range: TileRange,
    pub request: GetTileRequest,
    pub urls: TileUrlBuilder,
}

/// Outcome of drawing a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerReport {
    pub layer: String,
    pub tile_matrix_set: String,
    pub tile_matrix: String,
    pub tiles_requested: usize,
    pub tiles_failed: usize,
}

pub struct MapFigure {
    projection: Box<dyn Projection>,
    extent: BoundingBox,
    raster: Raster,
}

impl MapFigure {
    /// A blank figure `width` pixels wide.
    ///
    /// `geographic_extent` is in lon/lat degrees; `None` shows the
    /// projection's whole domain. `min_lon > max_lon` crosses the
    /// antimeridian, which needs a central longitude inside the extent. The height follows the extent's aspect
    /// ratio in projected units.
    pub fn new(
        projection: Box<dyn Projection>,
        geographic_extent: Option<BoundingBox>,
        width: u32,
    ) -> WmtsResult<Self> {
        if width == 0 {
            return Err(WmtsError::InvalidParameter {
                param: "width".to_string(),
                message: "must be positive".to_string(),
            });
        }

        let extent = match geographic_extent {
            None => projection.domain(),
            Some(geo) => {
                let finite = [geo.min_x, geo.min_y, geo.max_x, geo.max_y]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite || geo.min_x == geo.max_x || geo.min_y >= geo.max_y {
                    return Err(WmtsError::InvalidBbox(format!("{:?}", geo)));
                }
                project_lon_lat_extent(projection.as_ref(), &geo, EXTENT_SAMPLES)?
            }
        };

        let height = (width as f64 / extent.aspect_ratio()).round().max(1.0) as u32;
        let raster = Raster::filled(width, height, BACKGROUND)?;

        debug!(width, height, crs = %projection.crs(), ?extent, "Created figure");

        Ok(Self {
            projection,
            extent,
            raster,
        })
    }

    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    /// Figure extent in projected units.
    pub fn extent(&self) -> BoundingBox {
        self.extent
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Work out which tiles of `layer_name` cover the figure.
    pub fn plan_layer(
        &self,
        caps: &Capabilities,
        layer_name: &str,
        options: &LayerOptions,
        service_url: &str,
    ) -> WmtsResult<TilePlan> {
        let layer = caps.layer(layer_name)?;
        let (tms, link_limits) = choose_tile_matrix_set(caps, layer, self.projection.crs())?;

        let src = projection_for(tms.crs);
        let src_extent = transform_bbox(self.projection(), src.as_ref(), &self.extent, EXTENT_SAMPLES)?;

        // Source units per figure pixel, measured across the figure
        let target = src_extent.width() / self.width() as f64;
        let matrix = tms
            .matrix_for_resolution(target)
            .ok_or_else(|| WmtsError::TileMatrixNotFound(tms.identifier.clone()))?
            .clone();

        let outside = || {
            WmtsError::InvalidBbox(format!(
                "figure extent does not overlap layer {} in matrix {}",
                layer_name, matrix.identifier
            ))
        };
        let mut range = matrix.tile_range(tms.crs, &src_extent).ok_or_else(outside)?;
        if let Some(limits) = link_limits.get(&matrix.identifier) {
            range = range.clamp_to(limits).ok_or_else(outside)?;
        }
        if range.len() > MAX_TILES {
            return Err(WmtsError::InvalidParameter {
                param: "width".to_string(),
                message: format!("{} tiles needed, limit is {}", range.len(), MAX_TILES),
            });
        }

        let format = layer
            .preferred_format(FORMAT_PREFERENCE)
            .ok_or_else(|| WmtsError::MissingParameter(format!("Format for layer {}", layer_name)))?
            .to_string();

        let request = GetTileRequest {
            layer: layer.identifier.clone(),
            style: layer.default_style().to_string(),
            format: format.clone(),
            tile_matrix_set: tms.identifier.clone(),
            tile_matrix: matrix.identifier.clone(),
            tile_row: range.min_row,
            tile_col: range.min_col,
            dimensions: dimension_values(layer, options.time.as_deref()),
        };
        let urls = TileUrlBuilder::for_layer(caps, layer, &format, service_url);

        Ok(TilePlan {
            tile_matrix_set: tms,
            matrix,
            range,
            request,
            urls,
        })
    }

    /// Fetch, mosaic and warp a WMTS layer onto the figure.
    ///
    /// Individual tile failures are logged and leave a transparent hole;
    /// the call fails only if every tile fails.
    #[instrument(skip(self, source, caps, options))]
    pub async fn add_wmts(
        &mut self,
        source: &dyn TileSource,
        caps: &Capabilities,
        layer_name: &str,
        options: &LayerOptions,
    ) -> WmtsResult<LayerReport> {
        let plan = self.plan_layer(caps, layer_name, options, source.service_url())?;
        let crs = plan.tile_matrix_set.crs;

        info!(
            layer = %layer_name,
            tile_matrix_set = %plan.tile_matrix_set.identifier,
            tile_matrix = %plan.matrix.identifier,
            tiles = plan.range.len(),
            format = %plan.request.format,
            rest = plan.urls.is_rest(),
            "Fetching tiles"
        );

        let plan_ref = &plan;
        let results: Vec<((u32, u32), WmtsResult<Raster>)> = stream::iter(plan.range.iter())
            .map(|(col, row)| async move {
                let result = fetch_tile(source, plan_ref, col, row).await;
                ((col, row), result)
            })
            .buffer_unordered(options.max_concurrent_tiles.max(1))
            .collect()
            .await;

        let mut mosaic = Mosaic::new(plan.range, &plan.matrix, crs)?;
        let mut first_error = None;
        let mut failed = 0;
        for ((col, row), result) in results {
            match result {
                Ok(tile) => mosaic.insert(col, row, &tile),
                Err(e) => {
                    warn!(col, row, error = %e, "Tile failed");
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        if failed == plan.range.len() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let src = projection_for(crs);
        let layer_raster = warp(
            &mosaic,
            src.as_ref(),
            self.projection(),
            &self.extent,
            self.width(),
            self.height(),
        )?;
        self.raster.composite_over(&layer_raster)?;

        Ok(LayerReport {
            layer: layer_name.to_string(),
            tile_matrix_set: plan.tile_matrix_set.identifier.clone(),
            tile_matrix: plan.matrix.identifier.clone(),
            tiles_requested: plan.range.len(),
            tiles_failed: failed,
        })
    }

    /// Load coastlines from `source` and stroke them over the figure.
    pub async fn coastlines(
        &mut self,
        source: &CoastlineSource,
        fetcher: &dyn TileSource,
        cache_dir: &Path,
        style: &CoastlineStyle,
    ) -> WmtsResult<usize> {
        let lines = coastlines::load(source, fetcher, cache_dir).await?;
        self.draw_lines(&lines, style)
    }

    /// Stroke lon/lat polylines over the figure.
    pub fn draw_lines(&mut self, lines: &[LonLatLine], style: &CoastlineStyle) -> WmtsResult<usize> {
        let projection = self.projection.as_ref();
        Ok(draw_lines(&mut self.raster, lines, projection, &self.extent, style)?)
    }

    /// Write the figure as PNG.
    pub fn save(&self, path: &Path) -> WmtsResult<()> {
        renderer::png::save(&self.raster, path)?;
        info!(path = %path.display(), width = self.width(), height = self.height(), "Saved figure");
        Ok(())
    }
}

async fn fetch_tile(source: &dyn TileSource, plan: &TilePlan, col: u32, row: u32) -> WmtsResult<Raster> {
    let url = plan.urls.url(&plan.request.at(col, row))?;
    let bytes = source.fetch_bytes(&url).await?;
    Ok(Raster::from_encoded(&bytes)?)
}

/// Pick the layer's tile matrix set, preferring one in the figure's CRS.
/// Returns the set (restricted to the matrices its limits name, if any)
/// and the limits keyed by matrix identifier.
fn choose_tile_matrix_set(
    caps: &Capabilities,
    layer: &Layer,
    figure_crs: wmts_common::CrsCode,
) -> WmtsResult<(TileMatrixSet, BTreeMap<String, wmts_common::TileMatrixLimits>)> {
    let candidates: Vec<_> = layer
        .tile_matrix_set_links
        .iter()
        .filter_map(|link| caps.tile_matrix_set(&link.tile_matrix_set).ok().map(|tms| (link, tms)))
        .collect();

    let (link, tms) = candidates
        .iter()
        .find(|(_, tms)| tms.crs == figure_crs)
        .or_else(|| candidates.first())
        .ok_or_else(|| {
            let ids: Vec<&str> = layer
                .tile_matrix_set_links
                .iter()
                .map(|l| l.tile_matrix_set.as_str())
                .collect();
            WmtsError::TileMatrixSetNotFound(format!(
                "no supported tile matrix set for layer {} (links: {})",
                layer.identifier,
                ids.join(", ")
            ))
        })?;

    let limits: BTreeMap<_, _> = link
        .limits
        .iter()
        .map(|l| (l.tile_matrix.clone(), l.clone()))
        .collect();

    let mut tms = (*tms).clone();
    if !limits.is_empty() {
        tms.tile_matrices.retain(|m| limits.contains_key(&m.identifier));
    }
    if tms.tile_matrices.is_empty() {
        return Err(WmtsError::TileMatrixNotFound(tms.identifier));
    }

    Ok((tms, limits))
}

/// Values for every dimension of the layer: the configured time for
/// `Time`, otherwise the advertised default (or first value).
fn dimension_values(layer: &Layer, time: Option<&str>) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for dim in &layer.dimensions {
        let value = match time {
            Some(t) if dim.identifier.eq_ignore_ascii_case("time") => Some(t.to_string()),
            _ => dim.default.clone().or_else(|| dim.values.first().cloned()),
        };
        match value {
            Some(v) => {
                values.insert(dim.identifier.clone(), v);
            }
            None => warn!(dimension = %dim.identifier, "Dimension has no default, omitting"),
        }
    }
    values
}
