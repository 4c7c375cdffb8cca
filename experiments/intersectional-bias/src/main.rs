use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use biasmap_core::{
    ensure_report_file, load_or_init, load_table, render_comparison_with, synthetic_pair,
    update_sections, BiasTable, DisplayConfig, Figure, FigureConfig, LogViewer, NotebookViewer,
    ReportSection, TableSummary, Viewer, DEFAULT_REPORT_TEMPLATE,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const DEMO_ROWS: [&str; 3] = ["race=0", "race=1", "race=2"];
const DEMO_COLUMNS: [&str; 2] = ["sex=0", "sex=1"];

/// Compare intersectional bias before and after mitigation as two heat maps.
#[derive(Parser, Debug)]
#[command(name = "biasmap-compare", version)]
struct Cli {
    /// Bias table before mitigation (JSON, split orientation)
    #[arg(long, requires = "after", conflicts_with = "demo")]
    before: Option<PathBuf>,

    /// Bias table after mitigation (JSON, split orientation)
    #[arg(long, requires = "before", conflicts_with = "demo")]
    after: Option<PathBuf>,

    /// Use a seeded synthetic table pair instead of input files
    #[arg(long, value_name = "SEED")]
    demo: Option<u64>,

    /// Write the figure to this PNG file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file; created with defaults when missing
    #[arg(short, long, default_value = "biasmap.json")]
    config: PathBuf,

    /// Markdown notebook to embed the figure in (logs a summary when omitted)
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Settings {
    display: DisplayConfig,
    figure: FigureConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings: Settings = load_or_init(&cli.config, Settings::default)?;
    let (before, after) = load_inputs(&cli)?;
    tracing::info!(
        before = ?before.shape(),
        after = ?after.shape(),
        "comparing bias tables"
    );

    let mut viewer: Box<dyn Viewer> = match &cli.report {
        Some(path) => {
            ensure_report_file(path, DEFAULT_REPORT_TEMPLATE)?;
            Box::new(NotebookViewer::new(path, "figure"))
        }
        None => Box::new(LogViewer),
    };

    let figure = render_comparison_with(
        &settings.figure,
        &before,
        &after,
        &settings.display,
        cli.output.as_deref(),
        viewer.as_mut(),
    )?;

    if let Some(path) = &cli.report {
        write_report(path, &settings, &figure)?;
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn load_inputs(cli: &Cli) -> Result<(BiasTable, BiasTable)> {
    match (&cli.before, &cli.after, cli.demo) {
        (Some(before), Some(after), _) => Ok((load_table(before)?, load_table(after)?)),
        (None, None, Some(seed)) => {
            tracing::info!(seed, "using synthetic demo tables");
            synthetic_pair(&DEMO_ROWS, &DEMO_COLUMNS, seed)
        }
        _ => Err(anyhow!("pass --before and --after, or --demo SEED")),
    }
}

fn write_report(path: &Path, settings: &Settings, figure: &Figure) -> Result<()> {
    let sections = [
        ReportSection::new("configuration", render_configuration_section(settings)),
        ReportSection::new("summary", render_summary_section(figure)),
    ];
    update_sections(path, &sections)
}

fn render_configuration_section(settings: &Settings) -> String {
    let display = &settings.display;
    let figure = &settings.figure;
    format!(
        "- vmin: {}\n- vmax: {}\n- center: {}\n- Title (right key, before panel): {}\n- Title (left key, after panel): {}\n- Size: {} x {} in at {} DPI\n",
        display.vmin,
        display.vmax,
        display.center,
        display.titles.right,
        display.titles.left,
        figure.width_inches,
        figure.height_inches,
        figure.dpi
    )
}

fn render_summary_section(figure: &Figure) -> String {
    let mut output = String::new();
    let _ = writeln!(
        &mut output,
        "| Panel | Title | Shape | Colour range | Min | Max | Mean | Below range | Above range |"
    );
    let _ = writeln!(&mut output, "| --- | --- | --- | --- | --- | --- | --- | --- | --- |");

    for (position, panel) in ["left", "right"].into_iter().zip(figure.panels()) {
        let summary = TableSummary::of(panel.table(), panel.norm());
        let (rows, columns) = panel.table().shape();
        let _ = writeln!(
            &mut output,
            "| {} | {} | {}x{} | {:.2} to {:.2} | {} | {} | {} | {} | {} |",
            position,
            panel.title(),
            rows,
            columns,
            panel.norm().vmin,
            panel.norm().vmax,
            format_stat(summary.min),
            format_stat(summary.max),
            format_stat(summary.mean),
            summary.below_range,
            summary.above_range
        );
    }

    output
}

fn format_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}
