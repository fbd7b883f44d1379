//! WMTS GetCapabilities document model and parser.
//!
//! The parser walks the document with quick-xml's streaming reader and keeps
//! a stack of element local names, so namespace prefixes (`ows:`, `wmts:`)
//! never matter. Only the parts of the document a tile client needs are
//! retained.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use tracing::{debug, warn};

use wmts_common::crs::AxisOrder;
use wmts_common::{
    BoundingBox, CrsCode, TileMatrix, TileMatrixLimits, TileMatrixSet, WmtsError, WmtsResult,
};

use crate::exception::parse_exception_report;

/// Request encodings advertised for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestEncoding {
    Kvp,
    Rest,
    Soap,
}

impl RequestEncoding {
    fn from_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "KVP" => Some(RequestEncoding::Kvp),
            "REST" | "RESTFUL" => Some(RequestEncoding::Rest),
            "SOAP" => Some(RequestEncoding::Soap),
            _ => None,
        }
    }
}

/// An HTTP GET endpoint for an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationEndpoint {
    pub href: String,
    /// Encodings constrained on this endpoint. Empty means unconstrained.
    pub encodings: Vec<RequestEncoding>,
}

impl OperationEndpoint {
    pub fn supports(&self, encoding: RequestEncoding) -> bool {
        self.encodings.is_empty() || self.encodings.contains(&encoding)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub identifier: String,
    pub title: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub identifier: String,
    pub default: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceUrl {
    pub format: String,
    pub resource_type: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileMatrixSetLink {
    pub tile_matrix_set: String,
    pub limits: Vec<TileMatrixLimits>,
}

impl TileMatrixSetLink {
    pub fn limits_for(&self, tile_matrix: &str) -> Option<&TileMatrixLimits> {
        self.limits.iter().find(|l| l.tile_matrix == tile_matrix)
    }
}

/// A layer advertised in the Contents section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layer {
    pub identifier: String,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub wgs84_bounding_box: Option<BoundingBox>,
    pub styles: Vec<Style>,
    pub formats: Vec<String>,
    pub tile_matrix_set_links: Vec<TileMatrixSetLink>,
    pub dimensions: Vec<Dimension>,
    pub resource_urls: Vec<ResourceUrl>,
}

impl Layer {
    /// The style flagged as default, else the first one, else "default".
    pub fn default_style(&self) -> &str {
        self.styles
            .iter()
            .find(|s| s.is_default)
            .or_else(|| self.styles.first())
            .map(|s| s.identifier.as_str())
            .unwrap_or("default")
    }

    /// Pick an image format, preferring the given MIME types in order.
    pub fn preferred_format(&self, preferences: &[&str]) -> Option<&str> {
        preferences
            .iter()
            .find_map(|p| self.formats.iter().find(|f| f.eq_ignore_ascii_case(p)))
            .or_else(|| self.formats.first())
            .map(String::as_str)
    }

    /// RESTful tile template for the given format.
    pub fn tile_template(&self, format: &str) -> Option<&str> {
        self.resource_urls
            .iter()
            .find(|r| r.resource_type == "tile" && r.format.eq_ignore_ascii_case(format))
            .map(|r| r.template.as_str())
    }

    pub fn link_for(&self, tile_matrix_set: &str) -> Option<&TileMatrixSetLink> {
        self.tile_matrix_set_links
            .iter()
            .find(|l| l.tile_matrix_set == tile_matrix_set)
    }
}

/// A parsed WMTS capabilities document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Capabilities {
    pub version: Option<String>,
    pub service_title: Option<String>,
    pub get_capabilities: Vec<OperationEndpoint>,
    pub get_tile: Vec<OperationEndpoint>,
    contents: BTreeMap<String, Layer>,
    tile_matrix_sets: BTreeMap<String, TileMatrixSet>,
}

impl Capabilities {
    /// Parse a capabilities document.
    ///
    /// An `ows:ExceptionReport` is returned as [`WmtsError::ServiceException`].
    pub fn parse(xml: &str) -> WmtsResult<Self> {
        if let Some(ex) = parse_exception_report(xml) {
            return Err(ex.into());
        }
        CapabilitiesParser::default().run(xml)
    }

    /// Layers keyed by identifier.
    pub fn contents(&self) -> &BTreeMap<String, Layer> {
        &self.contents
    }

    /// Layer identifiers in alphabetical order.
    pub fn layer_names(&self) -> Vec<&str> {
        // BTreeMap keys are already sorted
        self.contents.keys().map(String::as_str).collect()
    }

    pub fn layer(&self, identifier: &str) -> WmtsResult<&Layer> {
        self.contents
            .get(identifier)
            .ok_or_else(|| WmtsError::LayerNotFound(identifier.to_string()))
    }

    pub fn tile_matrix_sets(&self) -> &BTreeMap<String, TileMatrixSet> {
        &self.tile_matrix_sets
    }

    pub fn tile_matrix_set(&self, identifier: &str) -> WmtsResult<&TileMatrixSet> {
        self.tile_matrix_sets
            .get(identifier)
            .ok_or_else(|| WmtsError::TileMatrixSetNotFound(identifier.to_string()))
    }

    /// First GetTile endpoint that accepts KVP requests.
    pub fn kvp_tile_endpoint(&self) -> Option<&str> {
        self.get_tile
            .iter()
            .find(|e| e.supports(RequestEncoding::Kvp))
            .map(|e| e.href.as_str())
    }
}

// =============================================================================
// Parser
// =============================================================================

#[derive(Default)]
struct TileMatrixSetBuilder {
    identifier: String,
    crs: Option<String>,
    well_known_scale_set: Option<String>,
    matrices: Vec<TileMatrixBuilder>,
}

#[derive(Default)]
struct TileMatrixBuilder {
    identifier: String,
    scale_denominator: Option<f64>,
    top_left_corner: Option<(f64, f64)>,
    tile_width: Option<u32>,
    tile_height: Option<u32>,
    matrix_width: Option<u32>,
    matrix_height: Option<u32>,
}

impl TileMatrixBuilder {
    fn build(self, axis_order: AxisOrder) -> Option<TileMatrix> {
        let (a, b) = self.top_left_corner?;
        let top_left_corner = match axis_order {
            AxisOrder::XY => (a, b),
            AxisOrder::LatLon => (b, a),
        };
        Some(TileMatrix {
            identifier: self.identifier,
            scale_denominator: self.scale_denominator?,
            top_left_corner,
            tile_width: self.tile_width?,
            tile_height: self.tile_height?,
            matrix_width: self.matrix_width?,
            matrix_height: self.matrix_height?,
        })
    }
}

#[derive(Default)]
struct LimitsBuilder {
    tile_matrix: String,
    min_row: Option<u32>,
    max_row: Option<u32>,
    min_col: Option<u32>,
    max_col: Option<u32>,
}

#[derive(Default)]
struct CapabilitiesParser {
    caps: Capabilities,
    seen_root: bool,
    stack: Vec<String>,
    text: String,
    operation: Option<String>,
    endpoint: Option<OperationEndpoint>,
    layer: Option<Layer>,
    bbox_lower: Option<(f64, f64)>,
    bbox_upper: Option<(f64, f64)>,
    style: Option<Style>,
    dimension: Option<Dimension>,
    link: Option<TileMatrixSetLink>,
    limits: Option<LimitsBuilder>,
    tms: Option<TileMatrixSetBuilder>,
    matrix: Option<TileMatrixBuilder>,
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn parse_num<T: std::str::FromStr>(field: &str, value: &str) -> WmtsResult<T> {
    value.trim().parse::<T>().map_err(|_| {
        WmtsError::XmlError(format!("invalid {} value '{}'", field, value.trim()))
    })
}

impl CapabilitiesParser {
    fn run(mut self, xml: &str) -> WmtsResult<Capabilities> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = local_name(&e);
                    self.start(&name, &e)?;
                    self.stack.push(name);
                    self.text.clear();
                }
                Ok(Event::Empty(e)) => {
                    let name = local_name(&e);
                    self.start(&name, &e)?;
                    self.stack.push(name.clone());
                    self.text.clear();
                    self.end(&name)?;
                    self.stack.pop();
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| WmtsError::XmlError(e.to_string()))?;
                    self.text.push_str(&text);
                }
                Ok(Event::CData(c)) => {
                    self.text
                        .push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    self.end(&name)?;
                    self.stack.pop();
                    self.text.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(WmtsError::XmlError(format!(
                        "XML parsing error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if !self.seen_root {
            return Err(WmtsError::XmlError("document has no root element".to_string()));
        }

        debug!(
            layers = self.caps.contents.len(),
            tile_matrix_sets = self.caps.tile_matrix_sets.len(),
            "parsed capabilities"
        );

        Ok(self.caps)
    }

    /// Name of the element enclosing the one currently being opened or closed.
    fn parent(&self) -> Option<&str> {
        let len = self.stack.len();
        if len >= 2 {
            Some(self.stack[len - 2].as_str())
        } else {
            None
        }
    }

    fn start(&mut self, name: &str, e: &BytesStart<'_>) -> WmtsResult<()> {
        // The element being opened is not on the stack yet, so its parent is the top.
        let parent = self.stack.last().map(String::as_str);

        if self.stack.is_empty() {
            if name != "Capabilities" {
                return Err(WmtsError::XmlError(format!(
                    "unexpected root element <{}>",
                    name
                )));
            }
            self.seen_root = true;
            self.caps.version = attribute(e, b"version");
            return Ok(());
        }

        match (name, parent) {
            ("Operation", _) => self.operation = attribute(e, b"name"),
            ("Get", _) if self.operation.is_some() => {
                if let Some(href) = attribute(e, b"href") {
                    self.endpoint = Some(OperationEndpoint {
                        href,
                        encodings: Vec::new(),
                    });
                }
            }
            ("Layer", Some("Contents")) => self.layer = Some(Layer::default()),
            ("Style", Some("Layer")) => {
                let is_default = attribute(e, b"isDefault")
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                self.style = Some(Style {
                    identifier: String::new(),
                    title: None,
                    is_default,
                });
            }
            ("Dimension", Some("Layer")) => {
                self.dimension = Some(Dimension {
                    identifier: String::new(),
                    default: None,
                    values: Vec::new(),
                })
            }
            ("TileMatrixSetLink", Some("Layer")) => {
                self.link = Some(TileMatrixSetLink {
                    tile_matrix_set: String::new(),
                    limits: Vec::new(),
                })
            }
            ("TileMatrixLimits", _) if self.link.is_some() => {
                self.limits = Some(LimitsBuilder::default())
            }
            ("ResourceURL", Some("Layer")) => {
                if let (Some(layer), Some(template)) = (self.layer.as_mut(), attribute(e, b"template")) {
                    layer.resource_urls.push(ResourceUrl {
                        format: attribute(e, b"format").unwrap_or_default(),
                        resource_type: attribute(e, b"resourceType").unwrap_or_else(|| "tile".to_string()),
                        template,
                    });
                }
            }
            ("TileMatrixSet", Some("Contents")) => {
                self.tms = Some(TileMatrixSetBuilder::default())
            }
            ("TileMatrix", Some("TileMatrixSet")) if self.tms.is_some() => {
                self.matrix = Some(TileMatrixBuilder::default())
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &str) -> WmtsResult<()> {
        let text = self.text.trim().to_string();
        let parent = self.parent().map(str::to_string);
        let parent = parent.as_deref();

        match (name, parent) {
            // --- ServiceIdentification / OperationsMetadata ---
            ("Title", Some("ServiceIdentification")) => self.caps.service_title = Some(text),
            ("Value", Some("AllowedValues")) => {
                if let (Some(endpoint), Some(enc)) =
                    (self.endpoint.as_mut(), RequestEncoding::from_value(&text))
                {
                    endpoint.encodings.push(enc);
                }
            }
            ("Get", _) => {
                if let (Some(endpoint), Some(op)) = (self.endpoint.take(), self.operation.as_deref()) {
                    match op {
                        "GetTile" => self.caps.get_tile.push(endpoint),
                        "GetCapabilities" => self.caps.get_capabilities.push(endpoint),
                        _ => {}
                    }
                }
            }
            ("Operation", _) => self.operation = None,

            // --- Layer ---
            ("Identifier", Some("Layer")) => {
                if let Some(layer) = self.layer.as_mut() {
                    layer.identifier = text;
                }
            }
            ("Title", Some("Layer")) => {
                if let Some(layer) = self.layer.as_mut() {
                    layer.title = Some(text);
                }
            }
            ("Abstract", Some("Layer")) => {
                if let Some(layer) = self.layer.as_mut() {
                    layer.abstract_text = Some(text);
                }
            }
            ("Format", Some("Layer")) => {
                if let Some(layer) = self.layer.as_mut() {
                    layer.formats.push(text);
                }
            }
            ("LowerCorner", Some("WGS84BoundingBox")) => self.bbox_lower = BoundingBox::parse_corner(&text),
            ("UpperCorner", Some("WGS84BoundingBox")) => self.bbox_upper = BoundingBox::parse_corner(&text),
            ("WGS84BoundingBox", Some("Layer")) => {
                if let (Some(layer), Some(lo), Some(hi)) =
                    (self.layer.as_mut(), self.bbox_lower.take(), self.bbox_upper.take())
                {
                    layer.wgs84_bounding_box = Some(BoundingBox::new(lo.0, lo.1, hi.0, hi.1));
                }
            }
            ("Layer", Some("Contents")) => {
                if let Some(layer) = self.layer.take() {
                    if layer.identifier.is_empty() {
                        warn!("skipping layer without identifier");
                    } else {
                        self.caps.contents.insert(layer.identifier.clone(), layer);
                    }
                }
            }

            // --- Style ---
            ("Identifier", Some("Style")) => {
                if let Some(style) = self.style.as_mut() {
                    style.identifier = text;
                }
            }
            ("Title", Some("Style")) => {
                if let Some(style) = self.style.as_mut() {
                    style.title = Some(text);
                }
            }
            ("Style", Some("Layer")) => {
                if let (Some(style), Some(layer)) = (self.style.take(), self.layer.as_mut()) {
                    layer.styles.push(style);
                }
            }

            // --- Dimension ---
            ("Identifier", Some("Dimension")) => {
                if let Some(dim) = self.dimension.as_mut() {
                    dim.identifier = text;
                }
            }
            ("Default", Some("Dimension")) => {
                if let Some(dim) = self.dimension.as_mut() {
                    dim.default = Some(text);
                }
            }
            ("Value", Some("Dimension")) => {
                if let Some(dim) = self.dimension.as_mut() {
                    dim.values.push(text);
                }
            }
            ("Dimension", Some("Layer")) => {
                if let (Some(dim), Some(layer)) = (self.dimension.take(), self.layer.as_mut()) {
                    layer.dimensions.push(dim);
                }
            }

            // --- TileMatrixSetLink ---
            ("TileMatrixSet", Some("TileMatrixSetLink")) => {
                if let Some(link) = self.link.as_mut() {
                    link.tile_matrix_set = text;
                }
            }
            ("TileMatrix", Some("TileMatrixLimits")) => {
                if let Some(limits) = self.limits.as_mut() {
                    limits.tile_matrix = text;
                }
            }
            ("MinTileRow", Some("TileMatrixLimits")) => {
                if let Some(limits) = self.limits.as_mut() {
                    limits.min_row = Some(parse_num("MinTileRow", &text)?);
                }
            }
            ("MaxTileRow", Some("TileMatrixLimits")) => {
                if let Some(limits) = self.limits.as_mut() {
                    limits.max_row = Some(parse_num("MaxTileRow", &text)?);
                }
            }
            ("MinTileCol", Some("TileMatrixLimits")) => {
                if let Some(limits) = self.limits.as_mut() {
                    limits.min_col = Some(parse_num("MinTileCol", &text)?);
                }
            }
            ("MaxTileCol", Some("TileMatrixLimits")) => {
                if let Some(limits) = self.limits.as_mut() {
                    limits.max_col = Some(parse_num("MaxTileCol", &text)?);
                }
            }
            ("TileMatrixLimits", _) => {
                if let (Some(l), Some(link)) = (self.limits.take(), self.link.as_mut()) {
                    match (l.min_row, l.max_row, l.min_col, l.max_col) {
                        (Some(min_row), Some(max_row), Some(min_col), Some(max_col)) => {
                            link.limits.push(TileMatrixLimits {
                                tile_matrix: l.tile_matrix,
                                min_row,
                                max_row,
                                min_col,
                                max_col,
                            })
                        }
                        _ => warn!(tile_matrix = %l.tile_matrix, "ignoring incomplete TileMatrixLimits"),
                    }
                }
            }
            ("TileMatrixSetLink", Some("Layer")) => {
                if let (Some(link), Some(layer)) = (self.link.take(), self.layer.as_mut()) {
                    layer.tile_matrix_set_links.push(link);
                }
            }

            // --- TileMatrixSet / TileMatrix ---
            ("Identifier", Some("TileMatrix")) => {
                if let Some(m) = self.matrix.as_mut() {
                    m.identifier = text;
                }
            }
            ("ScaleDenominator", Some("TileMatrix")) => {
                if let Some(m) = self.matrix.as_mut() {
                    m.scale_denominator = Some(parse_num("ScaleDenominator", &text)?);
                }
            }
            ("TopLeftCorner", Some("TileMatrix")) => {
                if let Some(m) = self.matrix.as_mut() {
                    m.top_left_corner = Some(BoundingBox::parse_corner(&text).ok_or_else(|| {
                        WmtsError::XmlError(format!("invalid TopLeftCorner '{}'", text))
                    })?);
                }
            }
            ("TileWidth", Some("TileMatrix")) => {
                if let Some(m) = self.matrix.as_mut() {
                    m.tile_width = Some(parse_num("TileWidth", &text)?);
                }
            }
            ("TileHeight", Some("TileMatrix")) => {
                if let Some(m) = self.matrix.as_mut() {
                    m.tile_height = Some(parse_num("TileHeight", &text)?);
                }
            }
            ("MatrixWidth", Some("TileMatrix")) => {
                if let Some(m) = self.matrix.as_mut() {
                    m.matrix_width = Some(parse_num("MatrixWidth", &text)?);
                }
            }
            ("MatrixHeight", Some("TileMatrix")) => {
                if let Some(m) = self.matrix.as_mut() {
                    m.matrix_height = Some(parse_num("MatrixHeight", &text)?);
                }
            }
            ("TileMatrix", Some("TileMatrixSet")) => {
                if let (Some(m), Some(tms)) = (self.matrix.take(), self.tms.as_mut()) {
                    tms.matrices.push(m);
                }
            }
            ("Identifier", Some("TileMatrixSet")) => {
                if let Some(tms) = self.tms.as_mut() {
                    tms.identifier = text;
                }
            }
            ("SupportedCRS", Some("TileMatrixSet")) => {
                if let Some(tms) = self.tms.as_mut() {
                    tms.crs = Some(text);
                }
            }
            ("WellKnownScaleSet", Some("TileMatrixSet")) => {
                if let Some(tms) = self.tms.as_mut() {
                    tms.well_known_scale_set = Some(text);
                }
            }
            ("TileMatrixSet", Some("Contents")) => {
                if let Some(builder) = self.tms.take() {
                    self.finish_tile_matrix_set(builder);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_tile_matrix_set(&mut self, builder: TileMatrixSetBuilder) {
        let Some(crs_str) = builder.crs.as_deref() else {
            warn!(tile_matrix_set = %builder.identifier, "TileMatrixSet without SupportedCRS");
            return;
        };
        let parsed = match CrsCode::parse(crs_str) {
            Ok(parsed) => parsed,
            Err(_) => {
                debug!(
                    tile_matrix_set = %builder.identifier,
                    crs = %crs_str,
                    "skipping TileMatrixSet in unsupported CRS"
                );
                return;
            }
        };

        let mut tile_matrices = Vec::with_capacity(builder.matrices.len());
        for m in builder.matrices {
            let id = m.identifier.clone();
            match m.build(parsed.axis_order) {
                Some(matrix) => tile_matrices.push(matrix),
                None => warn!(
                    tile_matrix_set = %builder.identifier,
                    tile_matrix = %id,
                    "skipping incomplete TileMatrix"
                ),
            }
        }

        self.caps.tile_matrix_sets.insert(
            builder.identifier.clone(),
            TileMatrixSet {
                identifier: builder.identifier,
                crs: parsed.code,
                well_known_scale_set: builder.well_known_scale_set,
                tile_matrices,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Capabilities xmlns="http://www.opengis.net/wmts/1.0" xmlns:ows="http://www.opengis.net/ows/1.1" version="1.0.0">
  <Contents>
    <Layer><ows:Identifier>A</ows:Identifier></Layer>
    <Layer><ows:Identifier>C</ows:Identifier></Layer>
    <Layer><ows:Identifier>B</ows:Identifier></Layer>
  </Contents>
</Capabilities>"#;

    #[test]
    fn test_layer_names_sorted() {
        let caps = Capabilities::parse(MINIMAL).unwrap();
        assert_eq!(caps.version.as_deref(), Some("1.0.0"));
        assert_eq!(caps.layer_names(), vec!["A", "B", "C"]);
        assert_eq!(caps.layer_names().join("\n"), "A\nB\nC");
    }

    #[test]
    fn test_missing_layer() {
        let caps = Capabilities::parse(MINIMAL).unwrap();
        assert!(caps.layer("A").is_ok());
        assert!(matches!(
            caps.layer("MODIS_Terra_CorrectedReflectance_TrueColor"),
            Err(WmtsError::LayerNotFound(_))
        ));
    }

    #[test]
    fn test_wrong_root_element() {
        let err = Capabilities::parse("<WMS_Capabilities/>").unwrap_err();
        assert!(matches!(err, WmtsError::XmlError(_)));
    }

    #[test]
    fn test_exception_report_surfaces() {
        let xml = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1">
  <ows:Exception exceptionCode="OperationNotSupported"><ows:ExceptionText>nope</ows:ExceptionText></ows:Exception>
</ows:ExceptionReport>"#;
        let err = Capabilities::parse(xml).unwrap_err();
        assert!(matches!(err, WmtsError::ServiceException { ref code, .. } if code == "OperationNotSupported"));
    }

    #[test]
    fn test_latlon_axis_order_is_normalised() {
        let xml = r#"<Capabilities xmlns:ows="http://www.opengis.net/ows/1.1" version="1.0.0">
  <Contents>
    <TileMatrixSet>
      <ows:Identifier>EPSG4326</ows:Identifier>
      <ows:SupportedCRS>urn:ogc:def:crs:EPSG::4326</ows:SupportedCRS>
      <TileMatrix>
        <ows:Identifier>0</ows:Identifier>
        <ScaleDenominator>279541132.0143589</ScaleDenominator>
        <TopLeftCorner>90 -180</TopLeftCorner>
        <TileWidth>256</TileWidth>
        <TileHeight>256</TileHeight>
        <MatrixWidth>2</MatrixWidth>
        <MatrixHeight>1</MatrixHeight>
      </TileMatrix>
    </TileMatrixSet>
  </Contents>
</Capabilities>"#;
        let caps = Capabilities::parse(xml).unwrap();
        let tms = caps.tile_matrix_set("EPSG4326").unwrap();
        assert_eq!(tms.crs, CrsCode::Epsg4326);
        assert_eq!(tms.tile_matrices[0].top_left_corner, (-180.0, 90.0));
    }

    #[test]
    fn test_invalid_number_is_error() {
        let xml = r#"<Capabilities><Contents><TileMatrixSet>
  <Identifier>x</Identifier><SupportedCRS>EPSG:3857</SupportedCRS>
  <TileMatrix><Identifier>0</Identifier><TileWidth>wide</TileWidth></TileMatrix>
</TileMatrixSet></Contents></Capabilities>"#;
        let err = Capabilities::parse(xml).unwrap_err();
        assert!(err.to_string().contains("TileWidth"));
    }
}
