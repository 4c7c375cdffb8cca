use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::{
    figure::Figure,
    raster,
    report::{ensure_report_file, update_sections, ReportSection, DEFAULT_REPORT_TEMPLATE},
    summary::TableSummary,
};

/// Destination a finished figure is shown on.
pub trait Viewer {
    fn show(&mut self, figure: &Figure) -> Result<()>;
}

/// Logs a per-panel summary instead of drawing anything.
#[derive(Clone, Debug, Default)]
pub struct LogViewer;

impl Viewer for LogViewer {
    fn show(&mut self, figure: &Figure) -> Result<()> {
        for (position, panel) in ["left", "right"].into_iter().zip(figure.panels()) {
            let summary = TableSummary::of(panel.table(), panel.norm());
            let (rows, columns) = panel.table().shape();
            tracing::info!(
                position,
                title = panel.title(),
                rows,
                columns,
                vmin = panel.norm().vmin,
                vmax = panel.norm().vmax,
                min = ?summary.min,
                max = ?summary.max,
                clipped_low = summary.below_range,
                clipped_high = summary.above_range,
                "heat map panel"
            );
        }
        Ok(())
    }
}

/// Embeds the figure into a markdown notebook section as a PNG data URL.
#[derive(Clone, Debug)]
pub struct NotebookViewer {
    path: PathBuf,
    section: String,
}

impl NotebookViewer {
    pub fn new(path: impl Into<PathBuf>, section: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            section: section.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Viewer for NotebookViewer {
    fn show(&mut self, figure: &Figure) -> Result<()> {
        ensure_report_file(&self.path, DEFAULT_REPORT_TEMPLATE)?;

        let image = raster::rasterize(figure)?;
        let url = raster::png_data_url(&image, figure.config().dpi)?;
        let [left, right] = figure.panels();
        let alt = format!("{} vs {}", left.title(), right.title());
        update_sections(
            &self.path,
            &[ReportSection::new(&self.section, format!("![{alt}]({url})"))],
        )?;

        tracing::info!(notebook = %self.path.display(), section = %self.section, "updated notebook figure");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DisplayConfig, figure::render_comparison, table::BiasTable};

    fn table() -> BiasTable {
        BiasTable::new(
            vec!["a".into(), "b".into()],
            vec!["x".into(), "y".into()],
            vec![vec![0.3, 0.6], vec![0.9, 0.1]],
        )
        .unwrap()
    }

    #[test]
    fn log_viewer_accepts_any_figure() {
        let mut viewer = LogViewer;
        let figure = render_comparison(
            &table(),
            &table(),
            &DisplayConfig::default(),
            None,
            &mut viewer,
        )
        .unwrap();
        assert!(viewer.show(&figure).is_ok());
    }

    #[test]
    fn notebook_viewer_embeds_png() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = dir.path().join("notes/report.md");
        let mut viewer = NotebookViewer::new(&notebook, "figure");

        render_comparison(
            &table(),
            &table(),
            &DisplayConfig::default(),
            None,
            &mut viewer,
        )
        .unwrap();

        let content = std::fs::read_to_string(&notebook).unwrap();
        assert!(content.contains("![before vs after](data:image/png;base64,"));
        assert!(content.contains("<!-- SECTION:figure end -->"));
    }
}
