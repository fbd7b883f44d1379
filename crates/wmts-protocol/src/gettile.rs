//! GetTile request construction for the KVP and RESTful bindings.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;
use wmts_common::{WmtsError, WmtsResult};

use crate::capabilities::{Capabilities, Layer};

/// Characters escaped when a value is substituted into a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Build the KVP GetCapabilities URL for a service endpoint.
pub fn capabilities_url(service_url: &str) -> WmtsResult<String> {
    let mut url = parse_url(service_url)?;
    url.query_pairs_mut()
        .append_pair("SERVICE", "WMTS")
        .append_pair("REQUEST", "GetCapabilities")
        .append_pair("VERSION", "1.0.0");
    Ok(url.into())
}

fn parse_url(s: &str) -> WmtsResult<Url> {
    Url::parse(s).map_err(|e| WmtsError::InvalidParameter {
        param: "url".to_string(),
        message: format!("{}: {}", s, e),
    })
}

/// GetTile request parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GetTileRequest {
    /// Layer identifier
    pub layer: String,

    /// Style identifier
    pub style: String,

    /// Output format (e.g., "image/png")
    pub format: String,

    /// TileMatrixSet identifier
    pub tile_matrix_set: String,

    /// TileMatrix identifier
    pub tile_matrix: String,

    /// Tile row
    pub tile_row: u32,

    /// Tile column
    pub tile_col: u32,

    /// Dimension values keyed by dimension identifier (e.g. "Time")
    pub dimensions: BTreeMap<String, String>,
}

impl GetTileRequest {
    /// Same request for a different tile.
    pub fn at(&self, tile_col: u32, tile_row: u32) -> Self {
        Self {
            tile_col,
            tile_row,
            ..self.clone()
        }
    }

    /// KVP GetTile URL against `base`, which may already carry a query string.
    pub fn kvp_url(&self, base: &str) -> WmtsResult<String> {
        let mut url = parse_url(base)?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("SERVICE", "WMTS")
                .append_pair("REQUEST", "GetTile")
                .append_pair("VERSION", "1.0.0")
                .append_pair("LAYER", &self.layer)
                .append_pair("STYLE", &self.style)
                .append_pair("FORMAT", &self.format)
                .append_pair("TILEMATRIXSET", &self.tile_matrix_set)
                .append_pair("TILEMATRIX", &self.tile_matrix)
                .append_pair("TILEROW", &self.tile_row.to_string())
                .append_pair("TILECOL", &self.tile_col.to_string());
            for (key, value) in &self.dimensions {
                q.append_pair(&key.to_uppercase(), value);
            }
        }
        Ok(url.into())
    }

    /// Expand a RESTful ResourceURL template.
    ///
    /// Values are percent-encoded as path segments. Placeholder names match
    /// case-insensitively; a placeholder that is neither a standard tile
    /// variable nor a known dimension is an error.
    pub fn rest_url(&self, template: &str) -> WmtsResult<String> {
        let mut out = String::with_capacity(template.len() + 32);
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| WmtsError::InvalidParameter {
                param: "ResourceURL".to_string(),
                message: format!("unterminated placeholder in '{}'", template),
            })?;
            let name = &after[..close];
            let value = self.placeholder_value(name)?;
            out.extend(utf8_percent_encode(&value, PATH_SEGMENT));
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }

    fn placeholder_value(&self, name: &str) -> WmtsResult<String> {
        let value = match name.to_ascii_lowercase().as_str() {
            "layer" => self.layer.clone(),
            "style" => self.style.clone(),
            "tilematrixset" => self.tile_matrix_set.clone(),
            "tilematrix" => self.tile_matrix.clone(),
            "tilerow" => self.tile_row.to_string(),
            "tilecol" => self.tile_col.to_string(),
            _ => self
                .dimensions
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| WmtsError::MissingParameter(name.to_string()))?,
        };
        Ok(value)
    }
}

/// Resolves GetTile URLs for one layer, preferring the RESTful binding.
#[derive(Debug, Clone)]
pub struct TileUrlBuilder {
    rest_template: Option<String>,
    kvp_endpoint: String,
}

impl TileUrlBuilder {
    /// Choose the binding for `layer` in `format`.
    ///
    /// RESTful is used when the layer advertises a tile ResourceURL for the
    /// format. Otherwise KVP goes to the advertised GetTile endpoint, or to
    /// `service_url` if the capabilities carry no OperationsMetadata.
    pub fn for_layer(caps: &Capabilities, layer: &Layer, format: &str, service_url: &str) -> Self {
        Self {
            rest_template: layer.tile_template(format).map(str::to_string),
            kvp_endpoint: caps
                .kvp_tile_endpoint()
                .unwrap_or(service_url)
                .to_string(),
        }
    }

    /// Force KVP requests even if a template exists.
    pub fn kvp_only(mut self) -> Self {
        self.rest_template = None;
        self
    }

    pub fn is_rest(&self) -> bool {
        self.rest_template.is_some()
    }

    pub fn url(&self, request: &GetTileRequest) -> WmtsResult<String> {
        match &self.rest_template {
            Some(template) => request.rest_url(template),
            None => request.kvp_url(&self.kvp_endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GetTileRequest {
        let mut dimensions = BTreeMap::new();
        dimensions.insert("Time".to_string(), "2024-01-15".to_string());
        GetTileRequest {
            layer: "MODIS_Terra_CorrectedReflectance_TrueColor".to_string(),
            style: "default".to_string(),
            format: "image/jpeg".to_string(),
            tile_matrix_set: "250m".to_string(),
            tile_matrix: "2".to_string(),
            tile_row: 1,
            tile_col: 3,
            dimensions,
        }
    }

    #[test]
    fn test_capabilities_url() {
        let url = capabilities_url("https://example.com/wmts.cgi").unwrap();
        assert_eq!(
            url,
            "https://example.com/wmts.cgi?SERVICE=WMTS&REQUEST=GetCapabilities&VERSION=1.0.0"
        );
    }

    #[test]
    fn test_capabilities_url_keeps_existing_query() {
        let url = capabilities_url("https://example.com/wmts?token=abc").unwrap();
        assert!(url.starts_with("https://example.com/wmts?token=abc&SERVICE=WMTS"));
    }

    #[test]
    fn test_kvp_url() {
        let url = request().kvp_url("https://example.com/wmts.cgi").unwrap();
        assert!(url.contains("REQUEST=GetTile"));
        assert!(url.contains("LAYER=MODIS_Terra_CorrectedReflectance_TrueColor"));
        assert!(url.contains("FORMAT=image%2Fjpeg"));
        assert!(url.contains("TILEMATRIX=2"));
        assert!(url.contains("TILEROW=1"));
        assert!(url.contains("TILECOL=3"));
        assert!(url.contains("TIME=2024-01-15"));
    }

    #[test]
    fn test_rest_url() {
        let template = "https://example.com/wmts/{Layer}/default/{Time}/{TileMatrixSet}/{TileMatrix}/{TileRow}/{TileCol}.jpg";
        let url = request().rest_url(template).unwrap();
        assert_eq!(
            url,
            "https://example.com/wmts/MODIS_Terra_CorrectedReflectance_TrueColor/default/2024-01-15/250m/2/1/3.jpg"
        );
    }

    #[test]
    fn test_rest_url_escapes_values() {
        let mut req = request();
        req.style = "true color".to_string();
        req.dimensions
            .insert("Time".to_string(), "2024-01-15T00:00:00Z/P1D?#".to_string());
        let url = req
            .rest_url("https://example.com/{Layer}/{Style}/{Time}/{TileCol}.jpg")
            .unwrap();
        assert_eq!(
            url,
            "https://example.com/MODIS_Terra_CorrectedReflectance_TrueColor/true%20color/2024-01-15T00:00:00Z%2FP1D%3F%23/3.jpg"
        );
    }

    #[test]
    fn test_rest_url_unknown_placeholder() {
        let err = request()
            .rest_url("https://example.com/{Elevation}/{TileCol}.png")
            .unwrap_err();
        assert!(matches!(err, WmtsError::MissingParameter(ref p) if p == "Elevation"));
    }

    #[test]
    fn test_rest_url_unterminated() {
        assert!(request().rest_url("https://example.com/{TileCol").is_err());
    }

    #[test]
    fn test_at_changes_only_position() {
        let moved = request().at(7, 5);
        assert_eq!(moved.tile_col, 7);
        assert_eq!(moved.tile_row, 5);
        assert_eq!(moved.layer, request().layer);
    }
}
