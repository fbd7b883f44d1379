//! Coastline vectors from Natural Earth GeoJSON.
//!
//! Sources are either a local file or a URL. Downloads are cached under the
//! cache directory keyed by the URL's file name, so later runs work offline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use renderer::LonLatLine;
use serde_json::Value;
use tracing::{debug, info, warn};
use wmts_common::{WmtsError, WmtsResult};

use crate::client::TileSource;

/// Natural Earth 1:110m coastlines.
pub const NATURAL_EARTH_110M_COASTLINE: &str =
    "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_110m_coastline.geojson";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoastlineSource {
    Path(PathBuf),
    Url(String),
}

impl FromStr for CoastlineSource {
    type Err = WmtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(WmtsError::InvalidParameter {
                param: "coastlines".to_string(),
                message: "empty source".to_string(),
            });
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(CoastlineSource::Url(s.to_string()))
        } else {
            Ok(CoastlineSource::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for CoastlineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoastlineSource::Path(p) => write!(f, "{}", p.display()),
            CoastlineSource::Url(u) => write!(f, "{}", u),
        }
    }
}

/// Cache file for a URL: its last path segment, made filesystem-safe.
pub fn cache_path(cache_dir: &Path, url: &str) -> PathBuf {
    let name = url
        .split(['?', '#'])
        .next()
        .and_then(|u| u.rsplit('/').find(|seg| !seg.is_empty()))
        .unwrap_or("coastlines.geojson");
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cache_dir.join(safe)
}

/// Load coastline polylines from `source`, downloading through `fetcher`
/// and caching in `cache_dir` when it is a URL.
pub async fn load(
    source: &CoastlineSource,
    fetcher: &dyn TileSource,
    cache_dir: &Path,
) -> WmtsResult<Vec<LonLatLine>> {
    let text = match source {
        CoastlineSource::Path(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            WmtsError::InvalidParameter {
                param: "coastlines".to_string(),
                message: format!("{}: {}", path.display(), e),
            }
        })?,
        CoastlineSource::Url(url) => {
            let cached = cache_path(cache_dir, url);
            match tokio::fs::read_to_string(&cached).await {
                Ok(text) => {
                    debug!(path = %cached.display(), "Using cached coastlines");
                    text
                }
                Err(_) => {
                    info!(url = %url, "Downloading coastlines");
                    let body = fetcher.fetch_bytes(url).await?;
                    let text = String::from_utf8(body.to_vec())
                        .map_err(|e| WmtsError::DecodeError(format!("coastline GeoJSON: {}", e)))?;
                    // Only cache what parses
                    parse_geojson(&text)?;
                    if let Err(e) = write_cache(&cached, &text).await {
                        warn!(error = %e, path = %cached.display(), "Failed to cache coastlines");
                    }
                    text
                }
            }
        }
    };

    let lines = parse_geojson(&text)?;
    info!(source = %source, lines = lines.len(), "Loaded coastlines");
    Ok(lines)
}

async fn write_cache(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let partial = path.with_extension("partial");
    tokio::fs::write(&partial, text).await?;
    tokio::fs::rename(&partial, path).await
}

/// Extract every line from a GeoJSON document.
///
/// Accepts a FeatureCollection, a Feature or a bare geometry. LineStrings
/// and MultiLineStrings are taken as-is; polygon rings become closed lines.
/// Points and null geometries are ignored.
pub fn parse_geojson(text: &str) -> WmtsResult<Vec<LonLatLine>> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| WmtsError::DecodeError(format!("coastline GeoJSON: {}", e)))?;
    let mut lines = Vec::new();
    collect_object(&doc, &mut lines)?;
    Ok(lines)
}

fn collect_object(obj: &Value, lines: &mut Vec<LonLatLine>) -> WmtsResult<()> {
    match obj.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let features = obj
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| geojson_error("FeatureCollection without features"))?;
            for feature in features {
                collect_object(feature, lines)?;
            }
        }
        Some("Feature") => match obj.get("geometry") {
            None | Some(Value::Null) => {}
            Some(geometry) => collect_object(geometry, lines)?,
        },
        Some("GeometryCollection") => {
            if let Some(geometries) = obj.get("geometries").and_then(Value::as_array) {
                for g in geometries {
                    collect_object(g, lines)?;
                }
            }
        }
        Some("LineString") => lines.push(line(coordinates(obj)?)?),
        Some("MultiLineString") | Some("Polygon") => {
            for part in array(coordinates(obj)?)? {
                lines.push(line(part)?);
            }
        }
        Some("MultiPolygon") => {
            for polygon in array(coordinates(obj)?)? {
                for ring in array(polygon)? {
                    lines.push(line(ring)?);
                }
            }
        }
        Some("Point") | Some("MultiPoint") => {}
        Some(other) => return Err(geojson_error(&format!("unsupported type '{}'", other))),
        None => return Err(geojson_error("object without type")),
    }
    Ok(())
}

fn coordinates(obj: &Value) -> WmtsResult<&Value> {
    obj.get("coordinates")
        .ok_or_else(|| geojson_error("geometry without coordinates"))
}

fn array(v: &Value) -> WmtsResult<&Vec<Value>> {
    v.as_array().ok_or_else(|| geojson_error("expected an array"))
}

fn line(v: &Value) -> WmtsResult<LonLatLine> {
    array(v)?
        .iter()
        .map(|pos| {
            let pos = array(pos)?;
            match (
                pos.first().and_then(Value::as_f64),
                pos.get(1).and_then(Value::as_f64),
            ) {
                (Some(lon), Some(lat)) => Ok((lon, lat)),
                _ => Err(geojson_error("position is not [lon, lat]")),
            }
        })
        .collect()
}

fn geojson_error(msg: &str) -> WmtsError {
    WmtsError::DecodeError(format!("coastline GeoJSON: {}", msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::coastlines;

    #[test]
    fn test_source_from_str() {
        assert_eq!(
            "https://example.com/c.geojson".parse::<CoastlineSource>().unwrap(),
            CoastlineSource::Url("https://example.com/c.geojson".to_string())
        );
        assert_eq!(
            "data/coast.geojson".parse::<CoastlineSource>().unwrap(),
            CoastlineSource::Path(PathBuf::from("data/coast.geojson"))
        );
        assert!("  ".parse::<CoastlineSource>().is_err());
    }

    #[test]
    fn test_cache_path() {
        let dir = Path::new("/cache");
        assert_eq!(
            cache_path(dir, NATURAL_EARTH_110M_COASTLINE),
            PathBuf::from("/cache/ne_110m_coastline.geojson")
        );
        assert_eq!(
            cache_path(dir, "http://h/a b.json?x=1"),
            PathBuf::from("/cache/a_b.json")
        );
        assert_eq!(
            cache_path(dir, "http://h/"),
            PathBuf::from("/cache/h")
        );
    }

    #[test]
    fn test_parse_lines() {
        let lines = parse_geojson(coastlines::LINES).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![(-90.0, 0.0), (0.0, 0.0), (90.0, 0.0)]);
    }

    #[test]
    fn test_parse_mixed_geometries() {
        let lines = parse_geojson(coastlines::MIXED).unwrap();
        // Two from the MultiLineString, one polygon ring; null geometry skipped
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].first(), lines[2].last());
    }

    #[test]
    fn test_parse_bare_geometry_with_altitude() {
        let lines =
            parse_geojson(r#"{"type":"LineString","coordinates":[[1,2,100],[3,4,100]]}"#).unwrap();
        assert_eq!(lines, vec![vec![(1.0, 2.0), (3.0, 4.0)]]);
    }

    struct Offline;

    #[async_trait::async_trait]
    impl TileSource for Offline {
        fn service_url(&self) -> &str {
            "http://offline.invalid/wmts"
        }

        async fn fetch_bytes(&self, url: &str) -> WmtsResult<bytes::Bytes> {
            Err(WmtsError::HttpError(format!("offline: {}", url)))
        }
    }

    #[test]
    fn test_cached_download_needs_no_network() {
        let dir = test_utils::temp_test_dir();
        let url = "https://example.com/geojson/coast.geojson";
        std::fs::write(cache_path(dir.path(), url), coastlines::LINES).unwrap();

        let lines = tokio_test::block_on(load(
            &CoastlineSource::Url(url.to_string()),
            &Offline,
            dir.path(),
        ))
        .unwrap();
        assert_eq!(lines.len(), 2);

        let err = tokio_test::block_on(load(
            &CoastlineSource::Url("https://example.com/other.geojson".to_string()),
            &Offline,
            dir.path(),
        ))
        .unwrap_err();
        assert!(matches!(err, WmtsError::HttpError(_)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_geojson("not json").is_err());
        assert!(parse_geojson(r#"{"type":"Topology"}"#).is_err());
        assert!(parse_geojson(r#"{"type":"LineString","coordinates":[["a","b"]]}"#).is_err());
    }
}
