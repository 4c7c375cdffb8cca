use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::table::BiasTable;

/// How far mitigation moves each "after" score toward parity (1.0).
const MITIGATION_STRENGTH: f64 = 0.6;

/// Deterministic before/after tables for demos and tests.
///
/// "Before" scores are drawn uniformly from [0.1, 1.0); each "after" score
/// moves the matching "before" score part of the way toward 1.0 with a
/// little noise.
pub fn synthetic_pair(
    rows: &[&str],
    columns: &[&str],
    seed: u64,
) -> Result<(BiasTable, BiasTable)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut before = Vec::with_capacity(rows.len());
    let mut after = Vec::with_capacity(rows.len());

    for _ in rows {
        let mut before_row = Vec::with_capacity(columns.len());
        let mut after_row = Vec::with_capacity(columns.len());
        for _ in columns {
            let raw = rng.gen_range(0.1..1.0);
            let noise = rng.gen_range(-0.05..0.05);
            let mitigated = raw + (1.0 - raw) * MITIGATION_STRENGTH + noise;
            before_row.push(round2(raw));
            after_row.push(round2(mitigated.clamp(0.0, 1.2)));
        }
        before.push(before_row);
        after.push(after_row);
    }

    let labels = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    Ok((
        BiasTable::new(labels(rows), labels(columns), before)?,
        BiasTable::new(labels(rows), labels(columns), after)?,
    ))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
