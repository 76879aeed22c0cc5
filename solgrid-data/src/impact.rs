//! Environmental-impact feature extraction.
//!
//! Proximity to protected areas is the impact proxy: the distance from
//! each cell centroid to the nearest protected-area geometry, in
//! kilometres. Larger distances mean lower impact; the scorer inverts the
//! normalised column so that the weight still rewards suitability.
//!
//! Population density is declared but has no extractor yet.

use solgrid_core::{FeatureColumn, FeatureStore, FeatureValue, Grid};

use crate::join;

/// Column name for distance to the nearest protected area.
pub const PROTECTED_DISTANCE_COLUMN: &str = "dist_to_protected_km";

/// Column name for the population-density placeholder.
pub const POP_DENSITY_COLUMN: &str = "pop_density";

/// Default store table holding protected-area geometries.
pub const DEFAULT_PROTECTED_TABLE: &str = "protected_areas";

/// Distance from each cell to the nearest protected area, in kilometres.
///
/// Degrades to an all-missing column when the table cannot be read.
#[must_use]
pub fn protected_distance_column(
    grid: &Grid,
    store: &dyn FeatureStore,
    table: &str,
) -> FeatureColumn {
    join::distance_column(grid, store, table, PROTECTED_DISTANCE_COLUMN)
}

/// The population-density column: declared but not yet extracted.
#[must_use]
pub fn population_density_column(grid: &Grid) -> FeatureColumn {
    FeatureColumn::uniform(POP_DENSITY_COLUMN, grid, FeatureValue::NotImplemented)
}
