//! Vector, tabular and raster export of a rendered chart.

use crate::error::{ChartError, Result};
use ledgerflow_core::ProcessedGraph;
use ledgerflow_render::SvgSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Svg,
    Csv,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Csv => "csv",
            Self::Png => "png",
        }
    }

    /// Whether this build can produce the format.
    pub fn is_available(self) -> bool {
        match self {
            Self::Png => cfg!(feature = "raster"),
            Self::Svg | Self::Csv => true,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "csv" => Ok(Self::Csv),
            "png" => Ok(Self::Png),
            other => Err(ChartError::export(format!("unknown export format `{other}`"))),
        }
    }
}

/// Self-contained SVG document of the surface's current state.
pub fn svg_document(surface: &SvgSurface, background: Option<&str>) -> String {
    surface.to_svg_with_background(background)
}

/// Metadata as `#` comment lines, then a nodes table, a blank line and a links table.
pub fn csv_document(graph: &ProcessedGraph) -> Result<String> {
    let mut out = String::new();
    let meta = &graph.metadata;
    let fields = [
        ("title", meta.title.as_deref()),
        ("company", meta.company.as_deref()),
        ("period", meta.period.as_deref()),
        ("currency", meta.currency.as_deref()),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            out.push_str(&format!("# {name}: {}\n", value.replace(['\r', '\n'], " ")));
        }
    }
    out.push_str(&format!("# unit: {}\n", meta.unit.as_str()));
    out.push_str(&format!("# statementType: {}\n", graph.statement_type.as_str()));

    let mut nodes = csv::Writer::from_writer(Vec::new());
    nodes
        .write_record([
            "id",
            "depth",
            "value",
            "category",
            "inflow",
            "outflow",
            "percentageOfRevenue",
            "marginType",
        ])
        .map_err(csv_error)?;
    for layer in &graph.layers {
        for &i in layer {
            let n = &graph.nodes[i];
            nodes
                .write_record([
                    n.id.clone(),
                    n.depth.to_string(),
                    n.value.to_string(),
                    n.category.clone(),
                    n.inflow.to_string(),
                    n.outflow.to_string(),
                    format!("{:.2}", n.metrics.percentage_of_revenue),
                    n.metrics.margin_type.label().to_string(),
                ])
                .map_err(csv_error)?;
        }
    }
    out.push_str(&finish(nodes)?);
    out.push('\n');

    let mut links = csv::Writer::from_writer(Vec::new());
    links
        .write_record(["source", "target", "value", "type"])
        .map_err(csv_error)?;
    for l in &graph.links {
        links
            .write_record([
                l.source_id.as_str(),
                l.target_id.as_str(),
                l.value.to_string().as_str(),
                l.kind.as_str(),
            ])
            .map_err(csv_error)?;
    }
    out.push_str(&finish(links)?);
    Ok(out)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ChartError::export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ChartError::export(e.to_string()))
}

fn csv_error(e: csv::Error) -> ChartError {
    ChartError::export(e.to_string())
}

#[cfg(feature = "raster")]
pub use raster::{RasterError, svg_to_png};

#[cfg(feature = "raster")]
mod raster {
    #[derive(Debug, thiserror::Error)]
    pub enum RasterError {
        #[error("failed to parse SVG")]
        SvgParse,
        #[error("failed to allocate pixmap for raster rendering")]
        PixmapAlloc,
        #[error("failed to encode PNG")]
        PngEncode,
    }

    /// Rasterizes at `scale` over an optional solid background.
    pub fn svg_to_png(svg: &str, scale: f32, background: Option<&str>) -> Result<Vec<u8>, RasterError> {
        let mut opt = usvg::Options::default();
        opt.fontdb_mut().load_system_fonts();
        opt.font_family = "Arial".to_string();
        let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;

        let size = tree.size();
        let width_px = (size.width() * scale).ceil().max(1.0) as u32;
        let height_px = (size.height() * scale).ceil().max(1.0) as u32;
        let mut pixmap =
            tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;
        if let Some(color) = background.and_then(parse_color) {
            pixmap.fill(color);
        }
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        );
        pixmap.encode_png().map_err(|_| RasterError::PngEncode)
    }

    fn parse_color(text: &str) -> Option<tiny_skia::Color> {
        let s = text.trim().to_ascii_lowercase();
        match s.as_str() {
            "transparent" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 0)),
            "white" => return Some(tiny_skia::Color::WHITE),
            "black" => return Some(tiny_skia::Color::BLACK),
            _ => {}
        }
        let hex = s.strip_prefix('#')?.as_bytes();
        let nibble = |c: u8| (c as char).to_digit(16).map(|v| v as u8);
        let pair = |i: usize| Some((nibble(*hex.get(i)?)? << 4) | nibble(*hex.get(i + 1)?)?);
        let single = |i: usize| nibble(*hex.get(i)?).map(|v| (v << 4) | v);
        let (r, g, b, a) = match hex.len() {
            3 => (single(0)?, single(1)?, single(2)?, 255),
            4 => (single(0)?, single(1)?, single(2)?, single(3)?),
            6 => (pair(0)?, pair(2)?, pair(4)?, 255),
            8 => (pair(0)?, pair(2)?, pair(4)?, pair(6)?),
            _ => return None,
        };
        Some(tiny_skia::Color::from_rgba8(r, g, b, a))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn png_signature_and_scaled_size() {
            let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="8" viewBox="0 0 10 8"><rect width="10" height="8" fill="black"/></svg>"#;
            let bytes = svg_to_png(svg, 2.0, Some("#fff")).unwrap();
            assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
            let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
            let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
            assert_eq!((width, height), (20, 16));
        }

        #[test]
        fn colors_parse_like_css_hex() {
            assert_eq!(
                parse_color("#ff000080"),
                Some(tiny_skia::Color::from_rgba8(255, 0, 0, 128))
            );
            assert_eq!(parse_color("#0f0"), Some(tiny_skia::Color::from_rgba8(0, 255, 0, 255)));
            assert_eq!(parse_color("chartreuse"), None);
        }
    }
}
