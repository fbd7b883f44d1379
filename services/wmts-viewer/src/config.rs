//! Viewer configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables and command-line flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, SecondsFormat, Utc};
use clap::Parser;
use projection::ProjectionKind;
use renderer::{parse_color, CoastlineStyle};
use serde::Deserialize;
use thiserror::Error;
use wmts_common::BoundingBox;

use crate::client::ClientConfig;
use crate::coastlines::{CoastlineSource, NATURAL_EARTH_110M_COASTLINE};

/// NASA GIBS, geographic (EPSG:4326) best-available imagery.
pub const DEFAULT_SERVICE_URL: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg4326/best/wmts.cgi";

pub const DEFAULT_LAYER: &str = "MODIS_Terra_CorrectedReflectance_TrueColor";

pub const DEFAULT_WIDTH: u32 = 1024;

pub const DEFAULT_OUTPUT: &str = "wmts_map.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Command-line arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "wmts-viewer")]
#[command(about = "List a WMTS service's layers and render one on a map with coastlines")]
pub struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "WMTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// WMTS service URL
    #[arg(long, env = "WMTS_URL")]
    pub url: Option<String>,

    /// Layer identifier to render
    #[arg(short, long, env = "WMTS_LAYER")]
    pub layer: Option<String>,

    /// Map projection (plate-carree or web-mercator)
    #[arg(long, env = "WMTS_PROJECTION")]
    pub projection: Option<String>,

    /// Central longitude for Plate Carrée
    #[arg(long, allow_hyphen_values = true)]
    pub central_longitude: Option<f64>,

    /// Map extent in degrees: min_lon,min_lat,max_lon,max_lat
    #[arg(long, env = "WMTS_EXTENT", allow_hyphen_values = true)]
    pub extent: Option<String>,

    /// Figure width in pixels
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Output PNG path
    #[arg(short, long, env = "WMTS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Coastline GeoJSON path or URL, or "none"
    #[arg(long, env = "WMTS_COASTLINES")]
    pub coastlines: Option<String>,

    /// Coastline color (#rrggbb, #rrggbbaa or a basic name)
    #[arg(long)]
    pub coastline_color: Option<String>,

    /// Coastline width in pixels
    #[arg(long)]
    pub coastline_width: Option<f32>,

    /// Directory for downloaded coastline data
    #[arg(long, env = "WMTS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Time dimension value: YYYY-MM-DD, RFC 3339, "today", "yesterday" or "default"
    #[arg(long, env = "WMTS_TIME")]
    pub time: Option<String>,

    /// Maximum concurrent tile requests
    #[arg(long)]
    pub max_concurrent_tiles: Option<usize>,

    /// Maximum retry attempts per request
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Save the figure without opening a viewer
    #[arg(long)]
    pub no_show: bool,

    /// Print the layer listing and exit
    #[arg(long)]
    pub list_only: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

/// The YAML configuration file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub layer: Option<String>,
    pub projection: Option<String>,
    pub central_longitude: Option<f64>,
    /// [min_lon, min_lat, max_lon, max_lat]
    pub extent: Option<[f64; 4]>,
    pub width: Option<u32>,
    pub output: Option<PathBuf>,
    pub coastlines: Option<String>,
    pub coastline_color: Option<String>,
    pub coastline_width: Option<f32>,
    pub cache_dir: Option<PathBuf>,
    pub time: Option<String>,
    pub max_concurrent_tiles: Option<usize>,
    pub max_retries: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub show: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub url: String,
    pub layer: String,
    pub projection: ProjectionKind,
    pub central_longitude: f64,
    /// Geographic extent; `None` shows the whole projection domain
    pub extent: Option<BoundingBox>,
    pub width: u32,
    pub output: PathBuf,
    /// `None` disables the overlay
    pub coastlines: Option<CoastlineSource>,
    pub coastline_style: CoastlineStyle,
    pub cache_dir: PathBuf,
    pub time: Option<String>,
    pub max_concurrent_tiles: usize,
    pub client: ClientConfig,
    pub show: bool,
    pub list_only: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVICE_URL.to_string(),
            layer: DEFAULT_LAYER.to_string(),
            projection: ProjectionKind::PlateCarree,
            central_longitude: 0.0,
            extent: None,
            width: DEFAULT_WIDTH,
            output: PathBuf::from(DEFAULT_OUTPUT),
            coastlines: Some(CoastlineSource::Url(NATURAL_EARTH_110M_COASTLINE.to_string())),
            coastline_style: CoastlineStyle::default(),
            cache_dir: default_cache_dir(),
            time: None,
            max_concurrent_tiles: 4,
            client: ClientConfig::default(),
            show: true,
            list_only: false,
        }
    }
}

pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("wmts-viewer")
}

impl ViewerConfig {
    /// Resolve from parsed arguments, reading `--config` if given.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Command-line/env values win over file values, which win over defaults.
    pub fn merge(args: &Args, file: FileConfig) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(url) = args.url.clone().or(file.url) {
            cfg.url = url;
        }
        if let Some(layer) = args.layer.clone().or(file.layer) {
            cfg.layer = layer;
        }
        if let Some(p) = args.projection.clone().or(file.projection) {
            cfg.projection = ProjectionKind::from_str(&p).map_err(|e| ConfigError::Invalid {
                field: "projection",
                message: e.to_string(),
            })?;
        }
        if let Some(lon) = args.central_longitude.or(file.central_longitude) {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::Invalid {
                    field: "central_longitude",
                    message: format!("{} is outside [-180, 180]", lon),
                });
            }
            cfg.central_longitude = lon;
        }

        cfg.extent = match (&args.extent, file.extent) {
            (Some(s), _) => Some(parse_extent(s)?),
            (None, Some([a, b, c, d])) => Some(parse_extent(&format!("{},{},{},{}", a, b, c, d))?),
            (None, None) => None,
        };

        if let Some(width) = args.width.or(file.width) {
            if width == 0 || width > 16384 {
                return Err(ConfigError::Invalid {
                    field: "width",
                    message: format!("{} is outside 1..=16384", width),
                });
            }
            cfg.width = width;
        }
        if let Some(output) = args.output.clone().or(file.output) {
            cfg.output = output;
        }

        if let Some(c) = args.coastlines.clone().or(file.coastlines) {
            cfg.coastlines = if c.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(c.parse().map_err(|e: wmts_common::WmtsError| ConfigError::Invalid {
                    field: "coastlines",
                    message: e.to_string(),
                })?)
            };
        }
        if let Some(color) = args.coastline_color.clone().or(file.coastline_color) {
            cfg.coastline_style.color = parse_color(&color).map_err(|e| ConfigError::Invalid {
                field: "coastline_color",
                message: e.to_string(),
            })?;
        }
        if let Some(w) = args.coastline_width.or(file.coastline_width) {
            if !(w > 0.0 && w.is_finite()) {
                return Err(ConfigError::Invalid {
                    field: "coastline_width",
                    message: format!("{} must be positive", w),
                });
            }
            cfg.coastline_style.width = w;
        }
        if let Some(dir) = args.cache_dir.clone().or(file.cache_dir) {
            cfg.cache_dir = dir;
        }

        if let Some(t) = args.time.clone().or(file.time) {
            cfg.time = resolve_time(&t, Utc::now())?;
        }

        if let Some(n) = args.max_concurrent_tiles.or(file.max_concurrent_tiles) {
            if n == 0 {
                return Err(ConfigError::Invalid {
                    field: "max_concurrent_tiles",
                    message: "must be at least 1".to_string(),
                });
            }
            cfg.max_concurrent_tiles = n;
        }
        if let Some(r) = args.max_retries.or(file.max_retries) {
            cfg.client.max_retries = r;
        }
        if let Some(secs) = args.timeout_secs.or(file.timeout_secs) {
            cfg.client.request_timeout = Duration::from_secs(secs.max(1));
        }

        cfg.show = !args.no_show && file.show.unwrap_or(true);
        cfg.list_only = args.list_only;

        Ok(cfg)
    }
}

/// Parse "min_lon,min_lat,max_lon,max_lat" and check it is a real area on
/// the globe. `min_lon > max_lon` is an extent crossing the antimeridian.
pub fn parse_extent(s: &str) -> Result<BoundingBox, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        field: "extent",
        message,
    };
    let bbox = BoundingBox::from_lon_lat_csv(s).map_err(|e| invalid(e.to_string()))?;
    if !BoundingBox::global().contains_point(bbox.min_x, bbox.min_y)
        || !BoundingBox::global().contains_point(bbox.max_x, bbox.max_y)
    {
        return Err(invalid(format!("{} is outside -180,-90,180,90", s)));
    }
    Ok(bbox)
}

/// Normalise a time option. `default` means "use the layer's default".
pub fn resolve_time(s: &str, now: DateTime<Utc>) -> Result<Option<String>, ConfigError> {
    let s = s.trim();
    let today = now.date_naive();
    match s.to_ascii_lowercase().as_str() {
        "" | "default" => return Ok(None),
        "today" => return Ok(Some(today.format("%Y-%m-%d").to_string())),
        "yesterday" => {
            let day = today - ChronoDuration::days(1);
            return Ok(Some(day.format("%Y-%m-%d").to_string()));
        }
        _ => {}
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Some(date.format("%Y-%m-%d").to_string()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(
            dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
    }
    Err(ConfigError::Invalid {
        field: "time",
        message: format!("'{}' is not a date (YYYY-MM-DD) or RFC 3339 time", s),
    })
}
