use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use biasmap_core::{
    raster, render_comparison, render_comparison_with, BiasTable, DisplayConfig, Figure,
    FigureConfig, LogViewer, Viewer,
};

struct RecordingViewer {
    expected_file: Option<PathBuf>,
    shown: usize,
    file_present: Vec<bool>,
}

impl RecordingViewer {
    fn new(expected_file: Option<&Path>) -> Self {
        Self {
            expected_file: expected_file.map(Path::to_path_buf),
            shown: 0,
            file_present: Vec::new(),
        }
    }
}

impl Viewer for RecordingViewer {
    fn show(&mut self, _figure: &Figure) -> Result<()> {
        self.shown += 1;
        if let Some(path) = &self.expected_file {
            self.file_present.push(path.exists());
        }
        Ok(())
    }
}

fn table(values: Vec<Vec<f64>>) -> BiasTable {
    let rows = (0..values.len()).map(|i| format!("race={i}")).collect();
    let columns = (0..values[0].len()).map(|i| format!("sex={i}")).collect();
    BiasTable::new(rows, columns, values).unwrap()
}

fn before() -> BiasTable {
    table(vec![vec![0.35, 0.62], vec![0.91, 0.48]])
}

fn after() -> BiasTable {
    table(vec![vec![0.74, 0.83], vec![0.97, 0.79]])
}

fn small_figure() -> FigureConfig {
    FigureConfig {
        dpi: 60,
        ..FigureConfig::default()
    }
}

#[test]
fn left_panel_saturates_at_before_maximum() {
    let display = DisplayConfig::default();
    let figure = render_comparison(&before(), &after(), &display, None, &mut LogViewer).unwrap();

    assert_eq!(figure.left().norm().vmax, 0.91);
    assert_eq!(figure.left().norm().vmin, 0.2);
    assert_eq!(figure.right().norm().vmax, 0.8);
    assert_eq!(figure.right().norm().vmin, 0.2);
    assert_eq!(figure.left().center(), 0.0);
}

#[test]
fn title_keys_keep_their_panel_assignment() {
    let mut display = DisplayConfig::default();
    display.titles.right = "unmitigated".into();
    display.titles.left = "reweighed".into();

    let figure = render_comparison(&before(), &after(), &display, None, &mut LogViewer).unwrap();

    assert_eq!(figure.left().title(), "unmitigated");
    assert_eq!(figure.left().table(), &before());
    assert_eq!(figure.right().title(), "reweighed");
    assert_eq!(figure.right().table(), &after());
}

#[test]
fn identical_tables_match_when_bounds_agree() {
    let shared = before();
    let display = DisplayConfig {
        vmax: shared.max_value().unwrap(),
        ..DisplayConfig::default()
    };
    let figure = render_comparison(&shared, &shared, &display, None, &mut LogViewer).unwrap();
    let cmap = figure.colormap();

    for row in 0..2 {
        for column in 0..2 {
            assert_eq!(
                figure.left().cell_color(cmap, row, column),
                figure.right().cell_color(cmap, row, column)
            );
        }
    }
}

#[test]
fn writes_png_at_configured_dpi_before_showing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    let mut viewer = RecordingViewer::new(Some(path.as_path()));

    render_comparison(
        &before(),
        &after(),
        &DisplayConfig::default(),
        Some(path.as_path()),
        &mut viewer,
    )
    .unwrap();

    assert_eq!(viewer.file_present, vec![true]);

    let reader = png::Decoder::new(fs::File::open(&path).unwrap())
        .read_info()
        .unwrap();
    let info = reader.info();
    assert_eq!((info.width, info.height), (1920, 1440));
    let dims = info.pixel_dims.unwrap();
    assert_eq!(dims.xppu, 11811);
    assert_eq!(dims.unit, png::Unit::Meter);
}

#[test]
fn cells_are_painted_with_their_panel_colour() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cells.png");
    let config = small_figure();

    let figure = render_comparison_with(
        &config,
        &before(),
        &after(),
        &DisplayConfig::default(),
        Some(path.as_path()),
        &mut LogViewer,
    )
    .unwrap();

    let decoded = image::open(&path).unwrap().to_rgb8();
    let layouts = raster::layout(&figure);
    for (panel, layout) in figure.panels().into_iter().zip(&layouts) {
        for row in 0..2 {
            for column in 0..2 {
                let cell = layout.cell(row, column);
                let expected = panel.cell_color(figure.colormap(), row, column).unwrap();
                let pixel = decoded.get_pixel((cell.x0 + 2) as u32, (cell.y0 + 2) as u32);
                assert_eq!(
                    pixel.0,
                    [expected.0, expected.1, expected.2],
                    "panel {:?} cell ({row}, {column})",
                    panel.title()
                );
            }
        }
    }
}

#[test]
fn degenerate_ranges_render_without_error() {
    let dir = tempfile::tempdir().unwrap();
    for (i, (vmin, vmax)) in [(0.5, 0.5), (0.9, 0.1)].into_iter().enumerate() {
        let path = dir.path().join(format!("degenerate-{i}.png"));
        let display = DisplayConfig {
            vmin,
            vmax,
            ..DisplayConfig::default()
        };
        let figure = render_comparison_with(
            &small_figure(),
            &before(),
            &after(),
            &display,
            Some(path.as_path()),
            &mut LogViewer,
        )
        .unwrap();
        assert!(path.exists());
        assert!(figure.right().norm().is_degenerate());
    }
}

#[test]
fn mismatched_and_sparse_tables_render_independently() {
    let wide = table(vec![vec![0.3, f64::NAN, 0.7]]);
    let tall = table(vec![vec![0.5], vec![0.6], vec![0.9]]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mismatched.png");

    let figure = render_comparison_with(
        &small_figure(),
        &wide,
        &tall,
        &DisplayConfig::default(),
        Some(path.as_path()),
        &mut LogViewer,
    )
    .unwrap();

    assert_eq!(figure.left().table().shape(), (1, 3));
    assert_eq!(figure.right().table().shape(), (3, 1));
    assert_eq!(figure.left().norm().vmax, 0.7);
}

#[test]
fn repeated_renders_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.png");
    let second = dir.path().join("second.png");

    for path in [&first, &second] {
        render_comparison_with(
            &small_figure(),
            &before(),
            &after(),
            &DisplayConfig::default(),
            Some(path.as_path()),
            &mut LogViewer,
        )
        .unwrap();
    }

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn unwritable_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir/out.png");
    let mut viewer = RecordingViewer::new(None);

    let err = render_comparison_with(
        &small_figure(),
        &before(),
        &after(),
        &DisplayConfig::default(),
        Some(path.as_path()),
        &mut viewer,
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("failed to write PNG"));
    assert_eq!(viewer.shown, 0);
}

#[test]
fn empty_before_table_falls_back_to_configured_vmax() {
    let empty = BiasTable::from_records(&[]);
    let figure = render_comparison_with(
        &small_figure(),
        &empty,
        &after(),
        &DisplayConfig::default(),
        None,
        &mut LogViewer,
    )
    .unwrap();

    assert_eq!(figure.left().norm().vmax, 0.8);
    assert!(raster::rasterize(&figure).is_ok());
}
