//! Common test fixtures for WMTS viewer tests.
//!
//! The centrepiece is [`CapabilitiesFixture`], which renders a WMTS 1.0.0
//! capabilities document from a handful of layer and tile matrix set
//! descriptions so tests never depend on a live service.

use wmts_common::tile::{web_mercator_tile_matrix_set, world_crs84_quad_tile_matrix_set};
use wmts_common::{BoundingBox, CrsCode, TileMatrixLimits, TileMatrixSet};

/// Layer identifiers used across tests.
pub mod layers {
    /// The layer the viewer selects by default
    pub const MODIS_TRUE_COLOR: &str = "MODIS_Terra_CorrectedReflectance_TrueColor";

    /// A second imagery layer
    pub const VIIRS_TRUE_COLOR: &str = "VIIRS_SNPP_CorrectedReflectance_TrueColor";

    /// A reference layer published only in Web Mercator
    pub const BLUE_MARBLE: &str = "BlueMarble_ShadedRelief";
}

/// Common bounding box definitions for testing.
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Europe bounding box
    pub const EUROPE: (f64, f64, f64, f64) = (-15.0, 35.0, 45.0, 72.0);

    /// Crosses antimeridian (Pacific-centric)
    pub const PACIFIC: (f64, f64, f64, f64) = (160.0, -50.0, -140.0, 50.0);
}

/// Coastline GeoJSON snippets shaped like Natural Earth's coastline files.
pub mod coastlines {
    /// Two LineString features: an equator-hugging line and a line crossing
    /// the antimeridian.
    pub const LINES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "featurecla": "Coastline", "scalerank": 0 },
      "geometry": { "type": "LineString", "coordinates": [[-90.0, 0.0], [0.0, 0.0], [90.0, 0.0]] }
    },
    {
      "type": "Feature",
      "properties": { "featurecla": "Coastline", "scalerank": 0 },
      "geometry": { "type": "LineString", "coordinates": [[170.0, 10.0], [-170.0, 10.0]] }
    }
  ]
}"#;

    /// A MultiLineString, a Polygon and a null geometry.
    pub const MIXED: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {},
      "geometry": {
        "type": "MultiLineString",
        "coordinates": [[[0.0, 50.0], [10.0, 50.0]], [[0.0, -50.0], [10.0, -50.0]]]
      }
    },
    {
      "type": "Feature",
      "properties": {},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[20.0, 20.0], [30.0, 20.0], [30.0, 30.0], [20.0, 20.0]]]
      }
    },
    { "type": "Feature", "properties": {}, "geometry": null }
  ]
}"#;
}

/// Tile matrix set description for a fixture document.
#[derive(Debug, Clone)]
pub struct FixtureTileMatrixSet {
    pub set: TileMatrixSet,
    /// Literal SupportedCRS text
    pub supported_crs: String,
    /// Write TopLeftCorner as "lat lon" (for URN geographic CRSs)
    pub lat_lon_corners: bool,
}

impl FixtureTileMatrixSet {
    /// WorldCRS84Quad-like set in EPSG:4326 with latitude-first corners.
    pub fn geographic(identifier: &str, max_zoom: u32) -> Self {
        let mut set = world_crs84_quad_tile_matrix_set(max_zoom);
        set.identifier = identifier.to_string();
        Self {
            set,
            supported_crs: "urn:ogc:def:crs:EPSG::4326".to_string(),
            lat_lon_corners: true,
        }
    }

    /// GoogleMapsCompatible set in EPSG:3857.
    pub fn web_mercator(identifier: &str, max_zoom: u32) -> Self {
        let mut set = web_mercator_tile_matrix_set(max_zoom);
        set.identifier = identifier.to_string();
        Self {
            set,
            supported_crs: "urn:ogc:def:crs:EPSG:6.18:3:3857".to_string(),
            lat_lon_corners: false,
        }
    }
}

/// Layer description for a fixture document.
#[derive(Debug, Clone)]
pub struct FixtureLayer {
    pub identifier: String,
    pub title: String,
    pub bounding_box: BoundingBox,
    pub styles: Vec<(String, bool)>,
    pub formats: Vec<String>,
    pub tile_matrix_set_links: Vec<(String, Vec<TileMatrixLimits>)>,
    /// (identifier, default, values)
    pub dimensions: Vec<(String, String, Vec<String>)>,
    /// (format, template)
    pub resource_urls: Vec<(String, String)>,
}

impl FixtureLayer {
    /// A global JPEG layer with a default style linked to `tile_matrix_set`.
    pub fn new(identifier: &str, tile_matrix_set: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            title: identifier.replace('_', " "),
            bounding_box: BoundingBox::global(),
            styles: vec![("default".to_string(), true)],
            formats: vec!["image/jpeg".to_string()],
            tile_matrix_set_links: vec![(tile_matrix_set.to_string(), Vec::new())],
            dimensions: Vec::new(),
            resource_urls: Vec::new(),
        }
    }

    pub fn with_formats(mut self, formats: &[&str]) -> Self {
        self.formats = formats.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_time(mut self, default: &str, values: &[&str]) -> Self {
        self.dimensions.push((
            "Time".to_string(),
            default.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    pub fn with_resource_url(mut self, format: &str, template: &str) -> Self {
        self.resource_urls
            .push((format.to_string(), template.to_string()));
        self
    }

    pub fn with_limits(mut self, limits: Vec<TileMatrixLimits>) -> Self {
        if let Some(link) = self.tile_matrix_set_links.first_mut() {
            link.1 = limits;
        }
        self
    }
}

/// Generates a WMTS capabilities XML document.
#[derive(Debug, Clone)]
pub struct CapabilitiesFixture {
    pub service_title: String,
    /// When set, OperationsMetadata advertises KVP GetTile at this URL
    pub service_url: Option<String>,
    pub layers: Vec<FixtureLayer>,
    pub tile_matrix_sets: Vec<FixtureTileMatrixSet>,
}

impl CapabilitiesFixture {
    pub fn new() -> Self {
        Self {
            service_title: "Fixture WMTS".to_string(),
            service_url: None,
            layers: Vec::new(),
            tile_matrix_sets: Vec::new(),
        }
    }

    /// A document shaped like a GIBS geographic endpoint: two imagery
    /// layers in a latitude-first EPSG:4326 set plus one Web Mercator layer.
    pub fn gibs_like() -> Self {
        Self::new()
            .with_tile_matrix_set(FixtureTileMatrixSet::geographic("250m", 3))
            .with_tile_matrix_set(FixtureTileMatrixSet::web_mercator("GoogleMapsCompatible_Level3", 3))
            .with_layer(
                FixtureLayer::new(layers::MODIS_TRUE_COLOR, "250m")
                    .with_time("2024-01-15", &["2000-02-24/2024-01-15/P1D"]),
            )
            .with_layer(FixtureLayer::new(layers::VIIRS_TRUE_COLOR, "250m"))
            .with_layer(
                FixtureLayer::new(layers::BLUE_MARBLE, "GoogleMapsCompatible_Level3")
                    .with_formats(&["image/png"]),
            )
    }

    pub fn with_service_url(mut self, url: &str) -> Self {
        self.service_url = Some(url.to_string());
        self
    }

    pub fn with_layer(mut self, layer: FixtureLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_tile_matrix_set(mut self, tms: FixtureTileMatrixSet) -> Self {
        self.tile_matrix_sets.push(tms);
        self
    }

    /// Render the document.
    pub fn build(&self) -> String {
        let mut xml = String::new();

        xml.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Capabilities xmlns="http://www.opengis.net/wmts/1.0"
    xmlns:ows="http://www.opengis.net/ows/1.1"
    xmlns:xlink="http://www.w3.org/1999/xlink"
    version="1.0.0">
"#,
        );

        xml.push_str(&format!(
            r#"  <ows:ServiceIdentification>
    <ows:Title>{}</ows:Title>
    <ows:ServiceType>OGC WMTS</ows:ServiceType>
    <ows:ServiceTypeVersion>1.0.0</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>
"#,
            self.service_title
        ));

        if let Some(url) = &self.service_url {
            xml.push_str(&format!(
                r#"  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities">
      <ows:DCP><ows:HTTP>
        <ows:Get xlink:href="{0}?">
          <ows:Constraint name="GetEncoding">
            <ows:AllowedValues><ows:Value>KVP</ows:Value></ows:AllowedValues>
          </ows:Constraint>
        </ows:Get>
      </ows:HTTP></ows:DCP>
    </ows:Operation>
    <ows:Operation name="GetTile">
      <ows:DCP><ows:HTTP>
        <ows:Get xlink:href="{0}?">
          <ows:Constraint name="GetEncoding">
            <ows:AllowedValues><ows:Value>KVP</ows:Value></ows:AllowedValues>
          </ows:Constraint>
        </ows:Get>
      </ows:HTTP></ows:DCP>
    </ows:Operation>
  </ows:OperationsMetadata>
"#,
                url
            ));
        }

        xml.push_str("  <Contents>\n");

        for layer in &self.layers {
            xml.push_str(&format!(
                r#"    <Layer>
      <ows:Title>{}</ows:Title>
      <ows:WGS84BoundingBox crs="urn:ogc:def:crs:OGC:2:84">
        <ows:LowerCorner>{} {}</ows:LowerCorner>
        <ows:UpperCorner>{} {}</ows:UpperCorner>
      </ows:WGS84BoundingBox>
      <ows:Identifier>{}</ows:Identifier>
"#,
                layer.title,
                layer.bounding_box.min_x,
                layer.bounding_box.min_y,
                layer.bounding_box.max_x,
                layer.bounding_box.max_y,
                layer.identifier
            ));

            for (identifier, is_default) in &layer.styles {
                xml.push_str(&format!(
                    r#"      <Style isDefault="{}">
        <ows:Title>{}</ows:Title>
        <ows:Identifier>{}</ows:Identifier>
      </Style>
"#,
                    is_default, identifier, identifier
                ));
            }

            for format in &layer.formats {
                xml.push_str(&format!("      <Format>{}</Format>\n", format));
            }

            for (identifier, default, values) in &layer.dimensions {
                xml.push_str(&format!(
                    "      <Dimension>\n        <ows:Identifier>{}</ows:Identifier>\n        <ows:UOM>ISO8601</ows:UOM>\n        <Default>{}</Default>\n        <Current>false</Current>\n",
                    identifier, default
                ));
                for value in values {
                    xml.push_str(&format!("        <Value>{}</Value>\n", value));
                }
                xml.push_str("      </Dimension>\n");
            }

            for (tms, limits) in &layer.tile_matrix_set_links {
                xml.push_str(&format!(
                    "      <TileMatrixSetLink>\n        <TileMatrixSet>{}</TileMatrixSet>\n",
                    tms
                ));
                if !limits.is_empty() {
                    xml.push_str("        <TileMatrixSetLimits>\n");
                    for l in limits {
                        xml.push_str(&format!(
                            r#"          <TileMatrixLimits>
            <TileMatrix>{}</TileMatrix>
            <MinTileRow>{}</MinTileRow>
            <MaxTileRow>{}</MaxTileRow>
            <MinTileCol>{}</MinTileCol>
            <MaxTileCol>{}</MaxTileCol>
          </TileMatrixLimits>
"#,
                            l.tile_matrix, l.min_row, l.max_row, l.min_col, l.max_col
                        ));
                    }
                    xml.push_str("        </TileMatrixSetLimits>\n");
                }
                xml.push_str("      </TileMatrixSetLink>\n");
            }

            for (format, template) in &layer.resource_urls {
                xml.push_str(&format!(
                    "      <ResourceURL format=\"{}\" resourceType=\"tile\" template=\"{}\"/>\n",
                    format, template
                ));
            }

            xml.push_str("    </Layer>\n");
        }

        for fixture in &self.tile_matrix_sets {
            let tms = &fixture.set;
            xml.push_str(&format!(
                "    <TileMatrixSet>\n      <ows:Identifier>{}</ows:Identifier>\n      <ows:SupportedCRS>{}</ows:SupportedCRS>\n",
                tms.identifier, fixture.supported_crs
            ));

            if let Some(ref wkss) = tms.well_known_scale_set {
                xml.push_str(&format!(
                    "      <WellKnownScaleSet>{}</WellKnownScaleSet>\n",
                    wkss
                ));
            }

            for matrix in &tms.tile_matrices {
                let (x, y) = matrix.top_left_corner;
                let corner = if fixture.lat_lon_corners && tms.crs == CrsCode::Epsg4326 {
                    format!("{} {}", y, x)
                } else {
                    format!("{} {}", x, y)
                };
                xml.push_str(&format!(
                    r#"      <TileMatrix>
        <ows:Identifier>{}</ows:Identifier>
        <ScaleDenominator>{}</ScaleDenominator>
        <TopLeftCorner>{}</TopLeftCorner>
        <TileWidth>{}</TileWidth>
        <TileHeight>{}</TileHeight>
        <MatrixWidth>{}</MatrixWidth>
        <MatrixHeight>{}</MatrixHeight>
      </TileMatrix>
"#,
                    matrix.identifier,
                    matrix.scale_denominator,
                    corner,
                    matrix.tile_width,
                    matrix.tile_height,
                    matrix.matrix_width,
                    matrix.matrix_height
                ));
            }

            xml.push_str("    </TileMatrixSet>\n");
        }

        xml.push_str("  </Contents>\n");
        xml.push_str("</Capabilities>\n");

        xml
    }
}

impl Default for CapabilitiesFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Capabilities with exactly the given layer identifiers and no tile matrix sets.
pub fn capabilities_with_layers(names: &[&str]) -> String {
    names
        .iter()
        .fold(CapabilitiesFixture::new(), |fixture, name| {
            fixture.with_layer(FixtureLayer::new(name, "unused"))
        })
        .build()
}

/// An OWS exception report body.
pub fn exception_report(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="1.0.0">
  <ows:Exception exceptionCode="{}">
    <ows:ExceptionText>{}</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#,
        code, message
    )
}
