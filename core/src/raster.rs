use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};

use crate::{
    colormap::Normalize,
    figure::{format_annotation, Figure, HeatmapPanel},
    fonts::ensure_font,
};

const INCHES_PER_METER: f64 = 39.370_078_740_157_48;
const COLORBAR_TICKS: usize = 5;
/// Rough advance width of a glyph relative to the font's pixel size.
const GLYPH_WIDTH_RATIO: f64 = 0.6;
/// Largest figure, in pixels, that will be rasterized.
pub const MAX_PIXELS: usize = 100_000_000;

/// Byte length of an RGB buffer for a `width` x `height` image.
fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|&pixels| pixels <= MAX_PIXELS)
        .map(|pixels| pixels * 3)
        .ok_or_else(|| {
            anyhow!(
                "figure of {width}x{height} pixels exceeds the {MAX_PIXELS} pixel limit; \
                 lower the figure's dpi or size"
            )
        })
}

/// An 8-bit RGB pixel buffer, row-major with no padding.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ])
    }
}

/// Pixel rectangle, inclusive of `x0`/`y0`, exclusive of `x1`/`y1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    pub fn center(&self) -> (i32, i32) {
        ((self.x0 + self.x1) / 2, (self.y0 + self.y1) / 2)
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}

/// Where one panel's pieces land in the figure.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelLayout {
    pub title_anchor: (i32, i32),
    pub grid: PixelRect,
    pub colorbar: PixelRect,
    rows: usize,
    columns: usize,
}

impl PanelLayout {
    pub fn cell(&self, row: usize, column: usize) -> PixelRect {
        let span = |start: i32, len: i32, count: usize, i: usize| {
            start + (len as f64 * i as f64 / count.max(1) as f64).round() as i32
        };
        PixelRect {
            x0: span(self.grid.x0, self.grid.width(), self.columns, column),
            x1: span(self.grid.x0, self.grid.width(), self.columns, column + 1),
            y0: span(self.grid.y0, self.grid.height(), self.rows, row),
            y1: span(self.grid.y0, self.grid.height(), self.rows, row + 1),
        }
    }
}

fn text_width(text: &str, pixels: f64) -> f64 {
    text.chars().count() as f64 * pixels * GLYPH_WIDTH_RATIO
}

fn colorbar_labels(norm: Normalize) -> Vec<(f64, String)> {
    (0..COLORBAR_TICKS)
        .map(|i| {
            let fraction = i as f64 / (COLORBAR_TICKS - 1) as f64;
            let value = norm.vmin + (norm.vmax - norm.vmin) * fraction;
            (fraction, format_annotation(value))
        })
        .collect()
}

/// Compute the layout of both panels. The first column holds the left panel.
pub fn layout(figure: &Figure) -> [PanelLayout; 2] {
    let (width, height) = figure.config().pixel_size();
    let half = width as i32 / 2;
    let [left, right] = figure.panels();
    [
        panel_layout(figure, left, 0, half, height as i32),
        panel_layout(figure, right, half, width as i32 - half, height as i32),
    ]
}

fn panel_layout(
    figure: &Figure,
    panel: &HeatmapPanel,
    origin_x: i32,
    width: i32,
    height: i32,
) -> PanelLayout {
    let config = figure.config();
    let title_px = config.points_to_pixels(config.title_points);
    let label_px = config.points_to_pixels(config.annotation_points);
    let pad = (width as f64 * 0.04).max(2.0);

    let row_label_width = panel
        .table()
        .rows()
        .iter()
        .map(|label| text_width(label, label_px))
        .fold(0.0, f64::max);
    let tick_label_width = colorbar_labels(panel.norm())
        .iter()
        .map(|(_, label)| text_width(label, label_px))
        .fold(0.0, f64::max);
    let colorbar_width = (width as f64 * 0.05).max(2.0);

    let top = pad + title_px * 1.8;
    let bottom = height as f64 - pad - label_px * 1.8;
    let grid_left = origin_x as f64 + pad + row_label_width + label_px * 0.5;
    let colorbar_right = (origin_x + width) as f64 - pad - tick_label_width - label_px * 0.5;
    let colorbar_left = colorbar_right - colorbar_width;
    let grid_right = (colorbar_left - pad).max(grid_left + 1.0);
    let bottom = bottom.max(top + 1.0);

    let (rows, columns) = panel.table().shape();
    PanelLayout {
        title_anchor: (origin_x + width / 2, (pad + title_px * 0.9) as i32),
        grid: PixelRect {
            x0: grid_left as i32,
            y0: top as i32,
            x1: grid_right as i32,
            y1: bottom as i32,
        },
        colorbar: PixelRect {
            x0: colorbar_left as i32,
            y0: top as i32,
            x1: colorbar_right as i32,
            y1: bottom as i32,
        },
        rows,
        columns,
    }
}

/// Draw the figure into an in-memory RGB buffer.
pub fn rasterize(figure: &Figure) -> Result<RgbImage> {
    let config = figure.config();
    let (width, height) = config.pixel_size();
    let mut pixels = vec![0u8; rgb_len(width, height)?];
    let family = ensure_font(&config.font_path)?;

    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let layouts = layout(figure);
        for (panel, panel_layout) in figure.panels().into_iter().zip(&layouts) {
            draw_panel(&root, figure, panel, panel_layout, &family)?;
        }
        root.present()?;
    }

    tracing::debug!(width, height, "rasterized figure");
    Ok(RgbImage {
        width,
        height,
        pixels,
    })
}

fn draw_panel(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    figure: &Figure,
    panel: &HeatmapPanel,
    layout: &PanelLayout,
    family: &str,
) -> Result<()> {
    let config = figure.config();
    let colormap = figure.colormap();
    let title_px = config.points_to_pixels(config.title_points);
    let label_px = config.points_to_pixels(config.annotation_points);
    let centered = Pos::new(HPos::Center, VPos::Center);

    root.draw(&Text::new(
        panel.title().to_string(),
        layout.title_anchor,
        (family, title_px)
            .into_font()
            .color(&BLACK)
            .pos(centered),
    ))?;

    let (rows, columns) = panel.table().shape();
    for row in 0..rows {
        for column in 0..columns {
            let cell = layout.cell(row, column);
            if let Some(fill) = panel.cell_color(colormap, row, column) {
                root.draw(&Rectangle::new(
                    [(cell.x0, cell.y0), (cell.x1 - 1, cell.y1 - 1)],
                    fill.filled(),
                ))?;
            }
            if let Some((text, ink)) = panel.annotation(colormap, row, column) {
                root.draw(&Text::new(
                    text,
                    cell.center(),
                    (family, label_px).into_font().color(&ink).pos(centered),
                ))?;
            }
        }
    }

    let right_aligned = Pos::new(HPos::Right, VPos::Center);
    for (row, label) in panel.table().rows().iter().enumerate() {
        let cell = layout.cell(row, 0);
        root.draw(&Text::new(
            label.clone(),
            (layout.grid.x0 - (label_px * 0.3) as i32, cell.center().1),
            (family, label_px)
                .into_font()
                .color(&BLACK)
                .pos(right_aligned),
        ))?;
    }
    let hanging = Pos::new(HPos::Center, VPos::Top);
    for (column, label) in panel.table().columns().iter().enumerate() {
        let cell = layout.cell(0, column);
        root.draw(&Text::new(
            label.clone(),
            (cell.center().0, layout.grid.y1 + (label_px * 0.3) as i32),
            (family, label_px).into_font().color(&BLACK).pos(hanging),
        ))?;
    }

    draw_colorbar(root, figure, panel, layout, family, label_px)
}

fn draw_colorbar(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    figure: &Figure,
    panel: &HeatmapPanel,
    layout: &PanelLayout,
    family: &str,
    label_px: f64,
) -> Result<()> {
    let bar = layout.colorbar;
    let span = (bar.height() - 1).max(1) as f64;
    for y in bar.y0..bar.y1 {
        let fraction = 1.0 - (y - bar.y0) as f64 / span;
        let color = figure.colormap().color(fraction);
        root.draw(&Rectangle::new([(bar.x0, y), (bar.x1 - 1, y)], color.filled()))?;
    }
    root.draw(&Rectangle::new(
        [(bar.x0, bar.y0), (bar.x1 - 1, bar.y1 - 1)],
        BLACK.stroke_width(1),
    ))?;

    let left_aligned = Pos::new(HPos::Left, VPos::Center);
    for (fraction, label) in colorbar_labels(panel.norm()) {
        let y = bar.y1 - 1 - (fraction * span).round() as i32;
        root.draw(&PathElement::new(
            vec![(bar.x1, y), (bar.x1 + (label_px * 0.2) as i32, y)],
            BLACK.stroke_width(1),
        ))?;
        root.draw(&Text::new(
            label,
            (bar.x1 + (label_px * 0.4) as i32, y),
            (family, label_px)
                .into_font()
                .color(&BLACK)
                .pos(left_aligned),
        ))?;
    }
    Ok(())
}

/// Encode `image` as PNG, recording `dpi` in the `pHYs` chunk.
pub fn encode_png(image: &RgbImage, dpi: u32) -> Result<Vec<u8>> {
    let expected_len = rgb_len(image.width, image.height)?;
    if image.pixels.len() != expected_len {
        return Err(anyhow!(
            "pixel buffer length {} does not match RGB image size {}x{}",
            image.pixels.len(),
            image.width,
            image.height
        ));
    }

    let pixels_per_meter = (dpi as f64 * INCHES_PER_METER).round() as u32;
    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, image.width, image.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: pixels_per_meter,
            yppu: pixels_per_meter,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder
            .write_header()
            .context("failed to write PNG header")?;
        writer
            .write_image_data(&image.pixels)
            .context("failed to encode PNG data")?;
        writer.finish().context("failed to finish PNG stream")?;
    }
    Ok(buffer)
}

pub fn write_png(path: &Path, image: &RgbImage, dpi: u32) -> Result<()> {
    let bytes = encode_png(image, dpi)?;
    fs::write(path, bytes)
        .with_context(|| format!("failed to write PNG to {}", path.display()))
}

/// Encode `image` as a PNG data URL for embedding in markdown.
pub fn png_data_url(image: &RgbImage, dpi: u32) -> Result<String> {
    let bytes = encode_png(image, dpi)?;
    let base64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:image/png;base64,{base64}"))
}
