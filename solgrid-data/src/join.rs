//! Spatial joins from source tables onto grid cells.
//!
//! Two join shapes cover every feature the pipeline extracts:
//!
//! - **Attribute polygons** ([`mean_intersecting`]): each cell takes the
//!   unweighted mean of the values of every source row whose geometry
//!   intersects the cell. A candidate set is taken from an R\*-tree over
//!   the rows' bounding boxes, then refined with an exact intersection
//!   test, so degenerate near-misses at cell borders never contribute.
//! - **Distance features** ([`distance_to_nearest_km`]): each cell takes
//!   the distance from its centroid to the nearest source geometry, in
//!   kilometres. The nearest-member minimum equals the distance to the
//!   union of the sources.
//!
//! A cell with no intersecting rows, or no rows at all, reads as missing
//! rather than zero.

use geo::Intersects;
use rstar::{AABB, RTree, RTreeObject};
use solgrid_core::{FeatureColumn, FeatureStore, FeatureValue, Grid, SourceRow};

use crate::dist::point_geometry_distance;

/// Bounding box of a source row, indexed by its position in the row set.
struct IndexedEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn index_rows(rows: &[SourceRow]) -> RTree<IndexedEnvelope> {
    use geo::BoundingRect;

    let envelopes = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            row.geometry.bounding_rect().map(|rect| IndexedEnvelope {
                index,
                envelope: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    RTree::bulk_load(envelopes)
}

/// Mean of the values of all rows intersecting each cell.
///
/// Rows whose value is missing or not implemented intersect without
/// contributing; a cell whose intersecting rows carry no numeric value
/// reads as missing.
#[must_use]
pub fn mean_intersecting(grid: &Grid, rows: &[SourceRow], name: &str) -> FeatureColumn {
    let tree = index_rows(rows);
    let mut column = FeatureColumn::new(name.to_owned());

    for cell in grid.cells() {
        let envelope = AABB::from_corners(
            [cell.geometry.min().x, cell.geometry.min().y],
            [cell.geometry.max().x, cell.geometry.max().y],
        );
        let mut sum = 0.0;
        let mut count = 0_u32;
        for candidate in tree.locate_in_envelope_intersecting(&envelope) {
            let Some(row) = rows.get(candidate.index) else {
                continue;
            };
            if !row.geometry.intersects(&cell.geometry) {
                continue;
            }
            if let Some(value) = row.value.as_f64() {
                sum += value;
                count += 1;
            }
        }
        let value = if count > 0 {
            FeatureValue::Value(sum / f64::from(count))
        } else {
            FeatureValue::Missing
        };
        column.insert(&cell.id, value);
    }
    column
}

/// Distance from each cell centroid to the nearest source geometry, in
/// kilometres.
#[must_use]
pub fn distance_to_nearest_km(grid: &Grid, rows: &[SourceRow], name: &str) -> FeatureColumn {
    let mut column = FeatureColumn::new(name.to_owned());
    for cell in grid.cells() {
        let nearest = rows
            .iter()
            .map(|row| point_geometry_distance(cell.centroid, &row.geometry))
            .fold(f64::INFINITY, f64::min);
        let value = if nearest.is_finite() {
            FeatureValue::Value(nearest / 1000.0)
        } else {
            FeatureValue::Missing
        };
        column.insert(&cell.id, value);
    }
    column
}

/// Read `table` and join its `value_column` onto the grid by mean.
///
/// An unreadable table degrades to an all-missing column with a warning
/// rather than failing the extraction.
#[must_use]
pub fn mean_column(
    grid: &Grid,
    store: &dyn FeatureStore,
    table: &str,
    value_column: &str,
    name: &str,
) -> FeatureColumn {
    match store.read_rows(table, Some(value_column)) {
        Ok(rows) => mean_intersecting(grid, &rows, name),
        Err(err) => {
            log::warn!("feature table {table} unavailable, {name} will be missing: {err}");
            FeatureColumn::uniform(name, grid, FeatureValue::Missing)
        }
    }
}

/// Read `table` and join the distance to its nearest geometry onto the
/// grid.
///
/// Degrades like [`mean_column`] when the table cannot be read.
#[must_use]
pub fn distance_column(
    grid: &Grid,
    store: &dyn FeatureStore,
    table: &str,
    name: &str,
) -> FeatureColumn {
    match store.read_rows(table, None) {
        Ok(rows) => distance_to_nearest_km(grid, &rows, name),
        Err(err) => {
            log::warn!("feature table {table} unavailable, {name} will be missing: {err}");
            FeatureColumn::uniform(name, grid, FeatureValue::Missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, polygon};
    use rstest::{fixture, rstest};
    use solgrid_core::{Crs, Extent, SqliteFeatureStore};

    fn row(geometry: Geometry<f64>, value: FeatureValue) -> SourceRow {
        SourceRow { geometry, value }
    }

    fn square(min_x: f64, min_y: f64, side: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: min_x, y: min_y),
            (x: min_x + side, y: min_y),
            (x: min_x + side, y: min_y + side),
            (x: min_x, y: min_y + side),
        ])
    }

    /// 2x2 grid of 5 km cells over a 10 km square.
    #[fixture]
    fn grid() -> Grid {
        let extent = Extent::new(0.0, 0.0, 10_000.0, 10_000.0).unwrap();
        Grid::build(&extent, 5_000.0, Crs::new(32724)).unwrap()
    }

    #[rstest]
    fn means_only_intersecting_rows(grid: Grid) {
        // One polygon over the south-west cell, one spanning both western
        // cells, one far outside the grid.
        let rows = vec![
            row(square(1_000.0, 1_000.0, 2_000.0), FeatureValue::Value(4.0)),
            row(square(1_000.0, 1_000.0, 8_000.0), FeatureValue::Value(8.0)),
            row(square(50_000.0, 50_000.0, 100.0), FeatureValue::Value(99.0)),
        ];

        let column = mean_intersecting(&grid, &rows, "solar_irradiance");

        assert_eq!(column.get("cell_0_0"), FeatureValue::Value(6.0));
        assert_eq!(column.get("cell_0_1"), FeatureValue::Value(8.0));
        assert_eq!(column.get("cell_1_1"), FeatureValue::Value(8.0));
    }

    #[rstest]
    fn cells_without_rows_read_missing_not_zero(grid: Grid) {
        let rows = vec![row(square(1_000.0, 1_000.0, 500.0), FeatureValue::Value(3.0))];

        let column = mean_intersecting(&grid, &rows, "solar_irradiance");

        assert_eq!(column.get("cell_0_0"), FeatureValue::Value(3.0));
        assert_eq!(column.get("cell_1_1"), FeatureValue::Missing);
    }

    #[rstest]
    fn valueless_rows_intersect_without_contributing(grid: Grid) {
        let rows = vec![
            row(square(1_000.0, 1_000.0, 500.0), FeatureValue::Missing),
            row(square(1_200.0, 1_200.0, 500.0), FeatureValue::NotImplemented),
        ];

        let column = mean_intersecting(&grid, &rows, "solar_irradiance");

        assert_eq!(column.get("cell_0_0"), FeatureValue::Missing);
    }

    #[rstest]
    fn distance_takes_nearest_member_in_km(grid: Grid) {
        // Nearest edge of the first square is 1 km east of cell_0_0's
        // centroid at (2500, 2500); the second square is much further.
        let rows = vec![
            row(square(3_500.0, 1_500.0, 1_000.0), FeatureValue::Missing),
            row(square(40_000.0, 2_000.0, 1_000.0), FeatureValue::Missing),
        ];

        let column = distance_to_nearest_km(&grid, &rows, "dist_to_grid_km");

        let FeatureValue::Value(d) = column.get("cell_0_0") else {
            panic!("expected a value");
        };
        assert!((d - 1.0).abs() < 1e-9, "got {d}");
    }

    #[rstest]
    fn centroid_inside_a_source_is_at_distance_zero(grid: Grid) {
        let rows = vec![row(square(0.0, 0.0, 5_000.0), FeatureValue::Missing)];

        let column = distance_to_nearest_km(&grid, &rows, "dist_to_protected_km");

        assert_eq!(column.get("cell_0_0"), FeatureValue::Value(0.0));
    }

    #[rstest]
    fn empty_source_set_yields_missing_distances(grid: Grid) {
        let column = distance_to_nearest_km(&grid, &[], "dist_to_grid_km");
        assert_eq!(column.get("cell_0_0"), FeatureValue::Missing);
        assert_eq!(column.present_count(), 0);
    }

    #[rstest]
    fn unreadable_table_degrades_to_missing_column(grid: Grid) {
        let store = SqliteFeatureStore::open_in_memory().unwrap();

        let mean = mean_column(&grid, &store, "absent", "annual", "solar_irradiance");
        let distance = distance_column(&grid, &store, "absent", "dist_to_grid_km");

        assert_eq!(mean.present_count(), 0);
        assert_eq!(distance.present_count(), 0);
        assert_eq!(mean.get("cell_1_0"), FeatureValue::Missing);
    }
}
