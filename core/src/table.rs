use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// A labelled matrix of fairness scores, one cell per pair of group categories.
///
/// Values are stored row-major. Missing combinations are `NaN`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SplitTable", into = "SplitTable")]
pub struct BiasTable {
    rows: Vec<String>,
    columns: Vec<String>,
    values: Vec<f64>,
}

/// Wire shape matching pandas' `orient="split"` JSON.
#[derive(Serialize, Deserialize)]
struct SplitTable {
    index: Vec<String>,
    columns: Vec<String>,
    data: Vec<Vec<Option<f64>>>,
}

/// One long-format observation: the score for a (row group, column group) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiasRecord {
    pub row: String,
    pub column: String,
    pub value: f64,
}

impl BiasTable {
    pub fn new(
        rows: Vec<String>,
        columns: Vec<String>,
        data: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if data.len() != rows.len() {
            bail!(
                "table has {} row labels but {} data rows",
                rows.len(),
                data.len()
            );
        }

        let mut values = Vec::with_capacity(rows.len() * columns.len());
        for (label, row) in rows.iter().zip(&data) {
            if row.len() != columns.len() {
                bail!(
                    "row {:?} has {} values but the table has {} columns",
                    label,
                    row.len(),
                    columns.len()
                );
            }
            values.extend_from_slice(row);
        }

        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    /// Pivot long-format records into a table. Labels keep first-seen order;
    /// a repeated pair keeps its last value.
    pub fn from_records(records: &[BiasRecord]) -> Self {
        let mut rows: Vec<String> = Vec::new();
        let mut columns: Vec<String> = Vec::new();
        let mut row_index = HashMap::new();
        let mut column_index = HashMap::new();

        for record in records {
            row_index.entry(record.row.clone()).or_insert_with(|| {
                rows.push(record.row.clone());
                rows.len() - 1
            });
            column_index.entry(record.column.clone()).or_insert_with(|| {
                columns.push(record.column.clone());
                columns.len() - 1
            });
        }

        let mut values = vec![f64::NAN; rows.len() * columns.len()];
        for record in records {
            let r = row_index[&record.row];
            let c = column_index[&record.column];
            values[r * columns.len() + c] = record.value;
        }

        Self {
            rows,
            columns,
            values,
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row >= self.rows.len() || column >= self.columns.len() {
            return None;
        }
        Some(self.values[row * self.columns.len() + column])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Largest non-`NaN` value, or `None` when there is none.
    pub fn max_value(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|value| !value.is_nan())
            .reduce(f64::max)
    }

    pub fn min_value(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|value| !value.is_nan())
            .reduce(f64::min)
    }
}

impl TryFrom<SplitTable> for BiasTable {
    type Error = anyhow::Error;

    fn try_from(split: SplitTable) -> Result<Self> {
        let data = split
            .data
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect();
        Self::new(split.index, split.columns, data)
    }
}

impl From<BiasTable> for SplitTable {
    fn from(table: BiasTable) -> Self {
        let width = table.columns.len();
        let data = (0..table.rows.len())
            .map(|r| {
                table.values[r * width..(r + 1) * width]
                    .iter()
                    .map(|&v| if v.is_nan() { None } else { Some(v) })
                    .collect()
            })
            .collect();

        Self {
            index: table.rows,
            columns: table.columns,
            data,
        }
    }
}

/// Read a table from a JSON file in split orientation.
pub fn load_table(path: &Path) -> Result<BiasTable> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read bias table from {}", path.display()))?;
    let table: BiasTable = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse bias table at {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        "loaded bias table"
    );
    Ok(table)
}
