pub mod colormap;
pub mod config;
pub mod figure;
pub mod fonts;
pub mod raster;
pub mod report;
pub mod summary;
pub mod synthetic;
pub mod table;
pub mod viewer;

pub use colormap::{LinearColormap, Normalize};
pub use config::{load_or_init, DisplayConfig, FigureConfig, PanelTitles};
pub use figure::{render_comparison, render_comparison_with, Figure, HeatmapPanel};
pub use report::{ensure_report_file, update_sections, ReportSection, DEFAULT_REPORT_TEMPLATE};
pub use summary::TableSummary;
pub use synthetic::synthetic_pair;
pub use table::{load_table, BiasRecord, BiasTable};
pub use viewer::{LogViewer, NotebookViewer, Viewer};
