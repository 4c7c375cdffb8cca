use serde::{Deserialize, Serialize};

use crate::{colormap::Normalize, table::BiasTable};

/// Descriptive statistics of one panel, relative to its colour range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub cells: usize,
    pub finite: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Cells drawn at the low end because they fall below `vmin`.
    pub below_range: usize,
    /// Cells drawn at the high end because they exceed `vmax`.
    pub above_range: usize,
}

impl TableSummary {
    pub fn of(table: &BiasTable, norm: Normalize) -> Self {
        let finite: Vec<f64> = table
            .values()
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        let mean = if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        };

        Self {
            cells: table.values().len(),
            finite: finite.len(),
            min: table.min_value(),
            max: table.max_value(),
            mean,
            below_range: finite.iter().filter(|&&v| v < norm.vmin).count(),
            above_range: finite.iter().filter(|&&v| v > norm.vmax).count(),
        }
    }
}
