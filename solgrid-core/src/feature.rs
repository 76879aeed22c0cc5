//! Feature values, per-feature columns, and the assembled feature table.
//!
//! A feature value is always one of three states: a finite number, an
//! explicit missing marker, or a "not yet implemented" placeholder. The
//! missing marker is never conflated with zero, and a placeholder feature
//! is distinguishable from one whose extractor failed at runtime.
//!
//! Columns map cell identifiers to values and are joined onto the grid by
//! key, never by position, so they stay correct under missing or
//! reordered rows.

use std::collections::BTreeMap;

use crate::Grid;

/// Textual sentinel persisted for [`FeatureValue::NotImplemented`] so the
/// placeholder state survives a round trip through the store.
pub const NOT_IMPLEMENTED_SENTINEL: &str = "not_implemented";

/// One feature observation for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FeatureValue {
    /// A finite numeric observation.
    Value(f64),
    /// No observation; distinct from zero and from a placeholder.
    #[default]
    Missing,
    /// The feature exists in the schema but no extractor produces it yet.
    NotImplemented,
}

impl FeatureValue {
    /// The numeric value, when present.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Missing | Self::NotImplemented => None,
        }
    }

    /// Whether this is a numeric observation.
    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Coerce raw text into a feature value.
    ///
    /// Unparseable or non-finite text becomes [`FeatureValue::Missing`]
    /// rather than an error; the [`NOT_IMPLEMENTED_SENTINEL`] round-trips
    /// back to the placeholder state. This is the single, central coercion
    /// point for the pipeline.
    #[must_use]
    pub fn coerce(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed == NOT_IMPLEMENTED_SENTINEL {
            return Self::NotImplemented;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Value(v),
            _ => Self::Missing,
        }
    }

    /// Wrap a raw number, demoting non-finite values to missing.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Missing
        }
    }
}

/// A named mapping from cell identifier to feature value.
///
/// Produced independently per extractor; cells the extractor never saw
/// are simply absent and read back as [`FeatureValue::Missing`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    name: String,
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureColumn {
    /// Create an empty column.
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self {
            name,
            values: BTreeMap::new(),
        }
    }

    /// Create a column holding the same value for every cell of `grid`.
    ///
    /// Used when a source is unavailable (all-missing degradation) or a
    /// feature is a placeholder.
    #[must_use]
    pub fn uniform(name: &str, grid: &Grid, value: FeatureValue) -> Self {
        let values = grid
            .cells()
            .iter()
            .map(|cell| (cell.id.clone(), value))
            .collect();
        Self {
            name: name.to_owned(),
            values,
        }
    }

    /// The feature name this column carries.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the value for one cell.
    pub fn insert(&mut self, cell_id: &str, value: FeatureValue) {
        self.values.insert(cell_id.to_owned(), value);
    }

    /// The value for one cell; absent cells are missing.
    #[must_use]
    pub fn get(&self, cell_id: &str) -> FeatureValue {
        self.values.get(cell_id).copied().unwrap_or_default()
    }

    /// Iterate over `(cell_id, value)` pairs in cell-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.values.iter().map(|(id, value)| (id.as_str(), *value))
    }

    /// Number of cells holding a numeric observation.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.values.values().filter(|v| v.is_value()).count()
    }
}

/// One row per cell, one column per declared feature.
///
/// Assembly joins strictly by `cell_id`. Every declared feature name is
/// present as a column even when its extractor failed entirely, so
/// downstream scoring never encounters an absent column.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    cell_ids: Vec<String>,
    columns: Vec<FeatureColumn>,
}

impl FeatureTable {
    /// Assemble a table from independently computed columns.
    ///
    /// `declared` fixes the column set and order. A declared feature with
    /// no matching column in `columns` is filled with
    /// [`FeatureValue::Missing`] for every cell; values for cell ids not
    /// present in `grid` are dropped.
    #[must_use]
    pub fn assemble(grid: &Grid, declared: &[&str], columns: Vec<FeatureColumn>) -> Self {
        let cell_ids: Vec<String> = grid.cells().iter().map(|cell| cell.id.clone()).collect();
        Self::from_cell_ids(cell_ids, declared, columns)
    }

    /// Assemble a table over an explicit cell-id ordering.
    ///
    /// Used when the table is rebuilt from persisted rows rather than a
    /// live grid; the join semantics match [`FeatureTable::assemble`].
    #[must_use]
    pub fn from_cell_ids(
        cell_ids: Vec<String>,
        declared: &[&str],
        columns: Vec<FeatureColumn>,
    ) -> Self {
        let assembled = declared
            .iter()
            .map(|&name| {
                let mut column = FeatureColumn::new(name.to_owned());
                let source = columns.iter().find(|c| c.name() == name);
                for id in &cell_ids {
                    let value = source.map_or(FeatureValue::Missing, |c| c.get(id));
                    column.insert(id, value);
                }
                column
            })
            .collect();
        Self {
            cell_ids,
            columns: assembled,
        }
    }

    /// Cell identifiers in grid order.
    #[must_use]
    pub fn cell_ids(&self) -> &[String] {
        &self.cell_ids
    }

    /// All columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Look up a column by feature name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// The value of one feature for one cell.
    ///
    /// An undeclared feature reads as missing, preserving totality for
    /// downstream stages.
    #[must_use]
    pub fn value(&self, name: &str, cell_id: &str) -> FeatureValue {
        self.column(name)
            .map_or(FeatureValue::Missing, |c| c.get(cell_id))
    }
}
