//! Grid-connection cost feature extraction.
//!
//! Connection cost is modelled as a linear function of the distance from
//! each cell centroid to the nearest transmission-grid geometry. The
//! distance column is kept alongside the derived cost so downstream
//! consumers can reprice without re-running the spatial join.

use solgrid_core::{FeatureColumn, FeatureStore, FeatureValue, Grid};

use crate::join;

/// Column name for distance to the nearest transmission line.
pub const GRID_DISTANCE_COLUMN: &str = "dist_to_grid_km";

/// Column name for the derived connection cost.
pub const CONNECTION_COST_COLUMN: &str = "connection_cost";

/// Default store table holding transmission-grid geometries.
pub const DEFAULT_GRID_TABLE: &str = "transmission_grid";

/// Default connection cost per kilometre of line, in currency units.
pub const DEFAULT_COST_PER_KM: f64 = 50_000.0;

/// Distance from each cell to the nearest transmission line, in
/// kilometres.
///
/// Degrades to an all-missing column when the table cannot be read.
#[must_use]
pub fn grid_distance_column(grid: &Grid, store: &dyn FeatureStore, table: &str) -> FeatureColumn {
    join::distance_column(grid, store, table, GRID_DISTANCE_COLUMN)
}

/// Derive the connection-cost column from a distance column.
///
/// Missing and not-implemented distances carry through unchanged, so a
/// degraded distance join never manufactures a zero cost.
#[must_use]
pub fn connection_cost_column(distances: &FeatureColumn, cost_per_km: f64) -> FeatureColumn {
    let mut column = FeatureColumn::new(CONNECTION_COST_COLUMN.to_owned());
    for (cell_id, value) in distances.iter() {
        let cost = match value {
            FeatureValue::Value(km) => FeatureValue::Value(km * cost_per_km),
            other => other,
        };
        column.insert(cell_id, cost);
    }
    column
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, LineString};
    use rstest::{fixture, rstest};
    use solgrid_core::{Crs, Extent, SqliteFeatureStore, StoredRecord};

    use super::*;

    #[fixture]
    fn grid() -> Grid {
        let extent = Extent::new(0.0, 0.0, 10_000.0, 10_000.0).unwrap();
        Grid::build(&extent, 5_000.0, Crs::new(32724)).unwrap()
    }

    #[rstest]
    fn cost_scales_linearly_with_distance(grid: Grid) {
        let store = SqliteFeatureStore::open_in_memory().unwrap();
        // A north-south line 500 m west of the grid.
        let line = StoredRecord::new(
            Geometry::LineString(LineString::from(vec![(-500.0, 0.0), (-500.0, 10_000.0)])),
            [],
        );
        store.replace_table("transmission_grid", &[line]).unwrap();

        let distances = grid_distance_column(&grid, &store, DEFAULT_GRID_TABLE);
        let costs = connection_cost_column(&distances, DEFAULT_COST_PER_KM);

        // cell_0_0 centroid is 3 km from the line: 2500 + 500 m.
        assert_eq!(distances.get("cell_0_0"), FeatureValue::Value(3.0));
        assert_eq!(costs.get("cell_0_0"), FeatureValue::Value(150_000.0));
        // cell_1_0 centroid is 8 km away.
        assert_eq!(costs.get("cell_1_0"), FeatureValue::Value(400_000.0));
    }

    #[rstest]
    fn missing_distances_never_become_zero_cost(grid: Grid) {
        let store = SqliteFeatureStore::open_in_memory().unwrap();
        let distances = grid_distance_column(&grid, &store, DEFAULT_GRID_TABLE);
        let costs = connection_cost_column(&distances, DEFAULT_COST_PER_KM);

        assert_eq!(costs.get("cell_0_0"), FeatureValue::Missing);
        assert_eq!(costs.present_count(), 0);
    }

    #[rstest]
    fn not_implemented_distances_carry_through() {
        let mut distances = FeatureColumn::new(GRID_DISTANCE_COLUMN.to_owned());
        distances.insert("cell_0_0", FeatureValue::NotImplemented);

        let costs = connection_cost_column(&distances, DEFAULT_COST_PER_KM);

        assert_eq!(costs.get("cell_0_0"), FeatureValue::NotImplemented);
    }
}
