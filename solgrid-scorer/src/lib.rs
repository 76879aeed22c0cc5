//! Suitability scoring for solgrid feature tables.
//!
//! The scorer turns the assembled per-cell feature table into a ranked
//! surface in four steps:
//! 1. Min-max normalise each of the three role columns (benefit, impact,
//!    cost) onto `0.0..=1.0` using its observed minimum and maximum
//!    across cells with values. Degenerate columns (all missing, or
//!    constant) normalise to a neutral `0.5` everywhere, as do
//!    individual missing values.
//! 2. Invert the normalised impact column (`1 - n`): larger raw distance
//!    to a protected area means lower penalty.
//! 3. Combine: `score = benefit_w * energy_n - impact_w * impact_n -
//!    cost_w * connection_cost_n`.
//! 4. Min-max rescale the raw scores to `score_norm` in `0.0..=1.0`,
//!    with the same neutral fallback.
//!
//! Every cell always receives a `score_norm` in `0.0..=1.0`, whatever
//! mixture of present, missing, and not-implemented features it carries.
//!
//! # Examples
//!
//! ```
//! use solgrid_core::{Crs, Extent, FeatureColumn, FeatureTable, FeatureValue, Grid};
//! use solgrid_scorer::{ScoreConfig, score_table};
//!
//! let extent = Extent::new(0.0, 0.0, 10_000.0, 10_000.0)?;
//! let grid = Grid::build(&extent, 5_000.0, Crs::new(32724))?;
//! let mut solar = FeatureColumn::new("solar_irradiance".into());
//! for (index, cell) in grid.cells().iter().enumerate() {
//!     solar.insert(&cell.id, FeatureValue::Value(index as f64));
//! }
//! let table = FeatureTable::assemble(&grid, &["solar_irradiance"], vec![solar]);
//!
//! let scored = score_table(&table, &ScoreConfig::default());
//! assert!(scored.cells().iter().all(|c| (0.0..=1.0).contains(&c.score_norm)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

use solgrid_core::{FeatureTable, FeatureValue};

mod error;
mod types;

pub use error::ScoreError;
pub use types::{NEUTRAL, ColumnStats, ScoreConfig, ScoreWeights, ScoredCell, ScoredTable};

/// Normalise the named column to one value per table row, in row order.
///
/// A column the table does not carry behaves as all-missing and
/// normalises to the neutral midpoint.
#[must_use]
pub fn normalise_column(table: &FeatureTable, name: &str) -> Vec<f64> {
    let stats = ColumnStats::from_values(
        table
            .cell_ids()
            .iter()
            .map(|cell_id| table.value(name, cell_id)),
    );
    if stats.is_degenerate() {
        log::warn!("column {name} is degenerate; normalising to neutral {NEUTRAL}");
    }
    table
        .cell_ids()
        .iter()
        .map(|cell_id| stats.normalise(table.value(name, cell_id)))
        .collect()
}

/// Min-max rescale raw scores, with the neutral fallback for a constant
/// surface.
fn normalise_scores(scores: &[f64]) -> Vec<f64> {
    let stats = ColumnStats::from_values(scores.iter().copied().map(FeatureValue::Value));
    scores
        .iter()
        .map(|score| stats.normalise(FeatureValue::Value(*score)))
        .collect()
}

/// Score every cell of the feature table.
///
/// The config's column names select which features fill the benefit,
/// impact, and cost roles; its weights set the linear policy. Scoring is
/// total: it never fails, and re-running it on an unchanged table
/// reproduces identical output.
#[must_use]
pub fn score_table(table: &FeatureTable, config: &ScoreConfig) -> ScoredTable {
    let energy_n = normalise_column(table, &config.benefit_column);
    let impact_n: Vec<f64> = normalise_column(table, &config.impact_column)
        .into_iter()
        .map(|n| 1.0 - n)
        .collect();
    let cost_n = normalise_column(table, &config.cost_column);

    let weights = config.weights;
    let scores: Vec<f64> = energy_n
        .iter()
        .zip(&impact_n)
        .zip(&cost_n)
        .map(|((energy, impact), cost)| {
            weights.benefit * energy - weights.impact * impact - weights.cost * cost
        })
        .collect();
    let score_norm = normalise_scores(&scores);

    let cells = table
        .cell_ids()
        .iter()
        .enumerate()
        .map(|(row, cell_id)| ScoredCell {
            cell_id: cell_id.clone(),
            energy_n: energy_n.get(row).copied().unwrap_or(NEUTRAL),
            impact_n: impact_n.get(row).copied().unwrap_or(NEUTRAL),
            connection_cost_n: cost_n.get(row).copied().unwrap_or(NEUTRAL),
            score: scores.get(row).copied().unwrap_or(0.0),
            score_norm: score_norm.get(row).copied().unwrap_or(NEUTRAL),
        })
        .collect();
    ScoredTable::new(cells)
}

#[cfg(test)]
mod tests;
