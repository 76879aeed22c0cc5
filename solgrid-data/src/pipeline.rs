//! Feature extraction pipeline: one row per cell, one column per
//! feature.
//!
//! [`extract_features`] runs every extractor against a grid and a store
//! handle and assembles the results into a [`FeatureTable`]. The column
//! set is declared up front, so the table always carries every feature
//! the scorer may ask for, with missing-or-degraded sources showing as
//! missing values rather than absent columns.

use solgrid_core::{FeatureStore, FeatureTable, Grid, IrradianceLookup};

use crate::{cost, energy, impact};

/// Every column the extraction pipeline declares, in table order.
pub const FEATURE_COLUMNS: &[&str] = &[
    energy::SOLAR_COLUMN,
    energy::WIND_COLUMN,
    impact::PROTECTED_DISTANCE_COLUMN,
    impact::POP_DENSITY_COLUMN,
    cost::GRID_DISTANCE_COLUMN,
    cost::CONNECTION_COST_COLUMN,
];

/// Configuration for a feature extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Options for the solar extractor.
    pub solar: energy::SolarOptions,
    /// Store table holding protected-area geometries.
    pub protected_table: String,
    /// Store table holding transmission-grid geometries.
    pub grid_table: String,
    /// Connection cost per kilometre of line.
    pub cost_per_km: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            solar: energy::SolarOptions::default(),
            protected_table: impact::DEFAULT_PROTECTED_TABLE.to_owned(),
            grid_table: cost::DEFAULT_GRID_TABLE.to_owned(),
            cost_per_km: cost::DEFAULT_COST_PER_KM,
        }
    }
}

/// Run every extractor and assemble the per-cell feature table.
#[must_use]
pub fn extract_features(
    grid: &Grid,
    store: &dyn FeatureStore,
    lookup: Option<&dyn IrradianceLookup>,
    config: &ExtractionConfig,
) -> FeatureTable {
    let grid_distances = cost::grid_distance_column(grid, store, &config.grid_table);
    let connection_costs = cost::connection_cost_column(&grid_distances, config.cost_per_km);

    let columns = vec![
        energy::solar_column(grid, store, lookup, &config.solar),
        energy::wind_column(grid),
        impact::protected_distance_column(grid, store, &config.protected_table),
        impact::population_density_column(grid),
        grid_distances,
        connection_costs,
    ];

    FeatureTable::assemble(grid, FEATURE_COLUMNS, columns)
}
