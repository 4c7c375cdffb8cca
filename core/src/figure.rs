//! The before/after comparison figure and the function that builds it.

use std::path::Path;

use anyhow::Result;
use plotters::style::RGBColor;

use crate::{
    colormap::{relative_luminance, LinearColormap, Normalize},
    config::{DisplayConfig, FigureConfig},
    raster,
    table::BiasTable,
    viewer::Viewer,
};

/// Luminance above which annotations switch from white to black ink.
const DARK_INK_LUMINANCE: f64 = 0.408;

/// One annotated heat map: a table, its title and the normalization its
/// colours are computed with.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapPanel {
    title: String,
    table: BiasTable,
    norm: Normalize,
    center: f64,
}

impl HeatmapPanel {
    pub fn new(title: impl Into<String>, table: BiasTable, norm: Normalize, center: f64) -> Self {
        Self {
            title: title.into(),
            table,
            norm,
            center,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn table(&self) -> &BiasTable {
        &self.table
    }

    pub fn norm(&self) -> Normalize {
        self.norm
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    /// Fill colour of a cell; `None` for missing values or out-of-range indices.
    pub fn cell_color(&self, colormap: &LinearColormap, row: usize, column: usize) -> Option<RGBColor> {
        let value = self.table.get(row, column).filter(|v| !v.is_nan())?;
        Some(colormap.color(self.norm.apply(value)))
    }

    /// Text drawn on a cell and the ink to draw it in.
    pub fn annotation(
        &self,
        colormap: &LinearColormap,
        row: usize,
        column: usize,
    ) -> Option<(String, RGBColor)> {
        let value = self.table.get(row, column).filter(|v| !v.is_nan())?;
        let fill = colormap.color(self.norm.apply(value));
        let ink = if relative_luminance(fill) > DARK_INK_LUMINANCE {
            RGBColor(0, 0, 0)
        } else {
            RGBColor(255, 255, 255)
        };
        Some((format_annotation(value), ink))
    }
}

/// A two-panel figure owned by the caller. Nothing about it is shared with
/// other figures.
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    config: FigureConfig,
    colormap: LinearColormap,
    left: HeatmapPanel,
    right: HeatmapPanel,
}

impl Figure {
    pub fn new(
        config: FigureConfig,
        colormap: LinearColormap,
        left: HeatmapPanel,
        right: HeatmapPanel,
    ) -> Self {
        Self {
            config,
            colormap,
            left,
            right,
        }
    }

    pub fn config(&self) -> &FigureConfig {
        &self.config
    }

    pub fn colormap(&self) -> &LinearColormap {
        &self.colormap
    }

    /// Panel in the first column, holding the "before" table.
    pub fn left(&self) -> &HeatmapPanel {
        &self.left
    }

    /// Panel in the second column, holding the "after" table.
    pub fn right(&self) -> &HeatmapPanel {
        &self.right
    }

    pub fn panels(&self) -> [&HeatmapPanel; 2] {
        [&self.left, &self.right]
    }

    /// Rasterize and write the figure as a PNG tagged with the configured DPI.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image = raster::rasterize(self)?;
        raster::write_png(path, &image, self.config.dpi)
    }
}

/// Render `before` and `after` side by side with the default figure geometry.
///
/// See [`render_comparison_with`].
pub fn render_comparison(
    before: &BiasTable,
    after: &BiasTable,
    display: &DisplayConfig,
    filename: Option<&Path>,
    viewer: &mut dyn Viewer,
) -> Result<Figure> {
    render_comparison_with(&FigureConfig::default(), before, after, display, filename, viewer)
}

/// Build the comparison figure, write it to `filename` when given, then hand
/// it to `viewer`.
///
/// The "before" panel saturates at the table's own maximum rather than
/// `display.vmax`; the "after" panel uses `display.vmax` as passed. The
/// "before" panel is titled with `titles.right` and the "after" panel with
/// `titles.left`.
pub fn render_comparison_with(
    figure_config: &FigureConfig,
    before: &BiasTable,
    after: &BiasTable,
    display: &DisplayConfig,
    filename: Option<&Path>,
    viewer: &mut dyn Viewer,
) -> Result<Figure> {
    let colormap = LinearColormap::red_to_green();
    let (vmin, vmax) = (display.vmin, display.vmax);
    let norm = Normalize::new(vmin, vmax);
    if norm.is_degenerate() {
        tracing::debug!(vmin, vmax, "colour range is empty or inverted");
    }

    let before_max = before.max_value().unwrap_or(vmax);
    tracing::debug!(before_max, vmax, "panel colour bounds");

    let left = HeatmapPanel::new(
        display.titles.right.clone(),
        before.clone(),
        norm.with_vmax(before_max),
        display.center,
    );
    let right = HeatmapPanel::new(
        display.titles.left.clone(),
        after.clone(),
        norm,
        display.center,
    );
    let figure = Figure::new(figure_config.clone(), colormap, left, right);

    if let Some(path) = filename {
        figure.save_png(path)?;
        tracing::info!(path = %path.display(), dpi = figure_config.dpi, "wrote comparison figure");
    }
    viewer.show(&figure)?;

    Ok(figure)
}

/// Format a value with two significant digits in general notation: fixed
/// point for moderate magnitudes, exponent form otherwise.
pub fn format_annotation(value: f64) -> String {
    const PRECISION: i32 = 2;

    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .map(|(m, e)| (m.to_string(), e.parse::<i32>().unwrap_or(0)))
        .unwrap_or((scientific.clone(), 0));

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_zeros(&mantissa), sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, value))
    }
}

fn strip_zeros(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_formats_like_general_two_digits() {
        assert_eq!(format_annotation(0.8), "0.8");
        assert_eq!(format_annotation(0.756), "0.76");
        assert_eq!(format_annotation(1.0), "1");
        assert_eq!(format_annotation(1.234), "1.2");
        assert_eq!(format_annotation(12.3), "12");
        assert_eq!(format_annotation(123.0), "1.2e+02");
        assert_eq!(format_annotation(0.00012), "0.00012");
        assert_eq!(format_annotation(0.000012), "1.2e-05");
        assert_eq!(format_annotation(-0.25), "-0.25");
        assert_eq!(format_annotation(0.0), "0");
        assert_eq!(format_annotation(0.999), "1");
    }

    fn table(values: Vec<Vec<f64>>) -> BiasTable {
        let rows = (0..values.len()).map(|i| format!("r{i}")).collect();
        let columns = (0..values.first().map_or(0, Vec::len))
            .map(|i| format!("c{i}"))
            .collect();
        BiasTable::new(rows, columns, values).unwrap()
    }

    #[test]
    fn missing_cells_have_no_colour_or_annotation() {
        let panel = HeatmapPanel::new(
            "t",
            table(vec![vec![0.5, f64::NAN]]),
            Normalize::new(0.2, 0.8),
            0.0,
        );
        let cmap = LinearColormap::red_to_green();
        assert!(panel.cell_color(&cmap, 0, 0).is_some());
        assert!(panel.cell_color(&cmap, 0, 1).is_none());
        assert!(panel.annotation(&cmap, 0, 1).is_none());
        assert!(panel.cell_color(&cmap, 4, 0).is_none());
    }

    #[test]
    fn saturated_ends_use_white_ink() {
        let panel = HeatmapPanel::new(
            "t",
            table(vec![vec![0.0, 1.0]]),
            Normalize::new(0.2, 0.8),
            0.0,
        );
        let cmap = LinearColormap::red_to_green();
        let (text, ink) = panel.annotation(&cmap, 0, 0).unwrap();
        assert_eq!(text, "0");
        assert_eq!(ink, RGBColor(255, 255, 255));
        let (text, _) = panel.annotation(&cmap, 0, 1).unwrap();
        assert_eq!(text, "1");
    }
}
