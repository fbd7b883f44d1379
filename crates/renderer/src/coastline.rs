//! Vector overlay stroking (coastlines) using tiny-skia.

use projection::Projection;
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::debug;
use wmts_common::BoundingBox;

use crate::error::{RenderError, RenderResult};
use crate::raster::Raster;

/// A polyline of (lon, lat) vertices in degrees.
pub type LonLatLine = Vec<(f64, f64)>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoastlineStyle {
    pub color: [u8; 4],
    /// Line width in pixels
    pub width: f32,
}

impl Default for CoastlineStyle {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            width: 1.0,
        }
    }
}

/// Parse `#rrggbb`, `#rrggbbaa` or a handful of named colors.
pub fn parse_color(s: &str) -> RenderResult<[u8; 4]> {
    let trimmed = s.trim();
    let named = match trimmed.to_ascii_lowercase().as_str() {
        "black" => Some([0, 0, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        "red" => Some([255, 0, 0, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        _ => None,
    };
    if let Some(rgba) = named {
        return Ok(rgba);
    }

    let invalid = || RenderError::InvalidColor(s.to_string());
    let hex = trimmed.strip_prefix('#').ok_or_else(invalid)?;
    if !matches!(hex.len(), 6 | 8) {
        return Err(invalid());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
    Ok([byte(0)?, byte(2)?, byte(4)?, alpha])
}

/// Project a lon/lat polyline into pixel space for a figure covering
/// `extent`, splitting wherever consecutive vertices jump across the
/// projection's horizontal seam or fail to project.
pub fn project_line(
    line: &[(f64, f64)],
    proj: &dyn Projection,
    extent: &BoundingBox,
    width: u32,
    height: u32,
) -> Vec<Vec<(f32, f32)>> {
    let sx = width as f64 / extent.width();
    let sy = height as f64 / extent.height();
    let half_period = proj.x_period() / 2.0;

    let mut parts = Vec::new();
    let mut current: Vec<(f32, f32)> = Vec::new();
    let mut last_x: Option<f64> = None;

    for &(lon, lat) in line {
        let Some((x, y)) = proj.project(lon, lat) else {
            if current.len() > 1 {
                parts.push(std::mem::take(&mut current));
            }
            current.clear();
            last_x = None;
            continue;
        };

        if let Some(prev) = last_x {
            if (x - prev).abs() > half_period {
                if current.len() > 1 {
                    parts.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }

        let px = ((x - extent.min_x) * sx) as f32;
        let py = ((extent.max_y - y) * sy) as f32;
        current.push((px, py));
        last_x = Some(x);
    }

    if current.len() > 1 {
        parts.push(current);
    }
    parts
}

/// Stroke lon/lat polylines onto `raster`. Returns the number of
/// projected segments drawn.
pub fn draw_lines(
    raster: &mut Raster,
    lines: &[LonLatLine],
    proj: &dyn Projection,
    extent: &BoundingBox,
    style: &CoastlineStyle,
) -> RenderResult<usize> {
    let (width, height) = (raster.width(), raster.height());
    let mut pixmap =
        Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })?;

    let mut paint = Paint::default();
    let [r, g, b, a] = style.color;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: style.width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let mut drawn = 0;
    for line in lines {
        for part in project_line(line, proj, extent, width, height) {
            let mut pb = PathBuilder::new();
            pb.move_to(part[0].0, part[0].1);
            for &(x, y) in &part[1..] {
                pb.line_to(x, y);
            }
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                drawn += 1;
            }
        }
    }

    debug!(lines = lines.len(), segments = drawn, "Stroked overlay lines");

    // tiny-skia stores premultiplied pixels; convert back before blending
    for (i, px) in pixmap.pixels().iter().enumerate() {
        if px.alpha() == 0 {
            continue;
        }
        let c = px.demultiply();
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        raster.blend(x, y, [c.red(), c.green(), c.blue(), c.alpha()]);
    }

    Ok(drawn)
}
