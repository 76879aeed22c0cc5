//! Public configuration and output types for suitability scoring.
#![forbid(unsafe_code)]

use solgrid_core::FeatureValue;

use crate::error::ScoreError;

/// Neutral normalised value substituted for missing data and degenerate
/// columns.
pub const NEUTRAL: f64 = 0.5;

/// Fixed linear weights for the three scored feature roles.
///
/// The defaults encode the scoring policy: benefit dominates, the
/// impact and cost penalties temper it. The weights are policy
/// constants, not a fitted model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Weight applied to the normalised benefit column.
    pub benefit: f64,
    /// Weight applied to the inverted, normalised impact column.
    pub impact: f64,
    /// Weight applied to the normalised cost column.
    pub cost: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            benefit: 0.6,
            impact: 0.25,
            cost: 0.15,
        }
    }
}

impl ScoreWeights {
    /// Validate and construct a set of weights.
    ///
    /// # Errors
    /// Returns [`ScoreError::InvalidWeights`] when any weight is negative
    /// or non-finite, or when every weight is zero.
    pub fn new(benefit: f64, impact: f64, cost: f64) -> Result<Self, ScoreError> {
        let usable = |w: f64| w.is_finite() && w >= 0.0;
        if !usable(benefit) || !usable(impact) || !usable(cost) || benefit + impact + cost == 0.0 {
            return Err(ScoreError::InvalidWeights {
                benefit,
                impact,
                cost,
            });
        }
        Ok(Self {
            benefit,
            impact,
            cost,
        })
    }
}

/// Which feature columns fill the three scored roles, and with what
/// weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreConfig {
    /// Column scored as-is, larger is better.
    pub benefit_column: String,
    /// Distance column inverted after normalisation, larger raw
    /// distance is better.
    pub impact_column: String,
    /// Column scored as a penalty, larger is worse.
    pub cost_column: String,
    /// Role weights.
    pub weights: ScoreWeights,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            benefit_column: "solar_irradiance".to_owned(),
            impact_column: "dist_to_protected_km".to_owned(),
            cost_column: "connection_cost".to_owned(),
            weights: ScoreWeights::default(),
        }
    }
}

/// Observed statistics of one feature column, driving its min-max
/// normalisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    min: f64,
    max: f64,
    present: usize,
    total: usize,
}

impl ColumnStats {
    /// Accumulate statistics over a column's values.
    pub fn from_values(values: impl Iterator<Item = FeatureValue>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut present = 0_usize;
        let mut total = 0_usize;
        for value in values {
            total += 1;
            if let Some(v) = value.as_f64() {
                min = min.min(v);
                max = max.max(v);
                present += 1;
            }
        }
        Self {
            min,
            max,
            present,
            total,
        }
    }

    /// Whether min-max normalisation would divide by zero: an all-missing
    /// column, or a constant one.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.present == 0 || self.min == self.max
    }

    /// Normalise one value onto `[0, 1]` against these statistics.
    ///
    /// Missing and not-implemented values map to the neutral midpoint, as
    /// does every value of a degenerate column.
    #[must_use]
    pub fn normalise(&self, value: FeatureValue) -> f64 {
        if self.is_degenerate() {
            return NEUTRAL;
        }
        match value.as_f64() {
            Some(v) => (v - self.min) / (self.max - self.min),
            None => NEUTRAL,
        }
    }

    /// Fraction of entries without a numeric value.
    #[must_use]
    pub fn missing_share(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let missing = self.total - self.present;
        missing as f64 / self.total as f64
    }
}

/// One cell's normalised components and composite scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCell {
    /// Cell identifier carried through from the feature table.
    pub cell_id: String,
    /// Normalised benefit component.
    pub energy_n: f64,
    /// Inverted, normalised impact component.
    pub impact_n: f64,
    /// Normalised cost component.
    pub connection_cost_n: f64,
    /// Raw weighted combination, unbounded.
    pub score: f64,
    /// The raw score min-max rescaled to `[0, 1]` across the grid.
    pub score_norm: f64,
}

/// The scored grid, ordered as the feature table it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTable {
    cells: Vec<ScoredCell>,
}

impl ScoredTable {
    pub(crate) fn new(cells: Vec<ScoredCell>) -> Self {
        Self { cells }
    }

    /// All scored cells, in feature-table order.
    #[must_use]
    pub fn cells(&self) -> &[ScoredCell] {
        &self.cells
    }

    /// Look up a cell by identifier.
    #[must_use]
    pub fn cell(&self, cell_id: &str) -> Option<&ScoredCell> {
        self.cells.iter().find(|cell| cell.cell_id == cell_id)
    }

    /// Every cell attaining the maximum `score_norm`.
    ///
    /// Ties are not broken: all qualifying cells are returned, in table
    /// order.
    #[must_use]
    pub fn best_cells(&self) -> Vec<&ScoredCell> {
        self.extreme_cells(f64::max)
    }

    /// Every cell attaining the minimum `score_norm`.
    #[must_use]
    pub fn worst_cells(&self) -> Vec<&ScoredCell> {
        self.extreme_cells(f64::min)
    }

    fn extreme_cells(&self, pick: fn(f64, f64) -> f64) -> Vec<&ScoredCell> {
        let Some(target) = self
            .cells
            .iter()
            .map(|cell| cell.score_norm)
            .reduce(pick)
        else {
            return Vec::new();
        };
        self.cells
            .iter()
            .filter(|cell| cell.score_norm == target)
            .collect()
    }
}
