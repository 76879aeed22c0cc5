//! Behavioural coverage for scoring assembled feature tables.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use solgrid_core::{Crs, Extent, FeatureColumn, FeatureTable, FeatureValue, Grid};
use solgrid_scorer::{NEUTRAL, ScoreConfig, ScoredTable, score_table};

const COLUMNS: [&str; 3] = ["solar_irradiance", "dist_to_protected_km", "connection_cost"];

/// Feature table under test, built by a `given` step.
#[fixture]
pub fn feature_table() -> RefCell<Option<FeatureTable>> {
    RefCell::new(None)
}

/// Captures the scoring output for assertions.
#[fixture]
pub fn scored() -> RefCell<Option<ScoredTable>> {
    RefCell::new(None)
}

fn four_cell_grid() -> Grid {
    let extent = match Extent::new(0.0, 0.0, 10_000.0, 10_000.0) {
        Ok(extent) => extent,
        Err(err) => panic!("build extent: {err}"),
    };
    match Grid::build(&extent, 5_000.0, Crs::new(32724)) {
        Ok(grid) => grid,
        Err(err) => panic!("build grid: {err}"),
    }
}

fn column(name: &str, grid: &Grid, values: &[FeatureValue]) -> FeatureColumn {
    let mut column = FeatureColumn::new(name.to_owned());
    for (cell, value) in grid.cells().iter().zip(values) {
        column.insert(&cell.id, *value);
    }
    column
}

#[given("a feature table with increasing irradiance and constant penalties")]
fn table_with_increasing_irradiance(feature_table: &RefCell<Option<FeatureTable>>) {
    let grid = four_cell_grid();
    let columns = vec![
        column(
            "solar_irradiance",
            &grid,
            &[1.0, 2.0, 3.0, 4.0].map(FeatureValue::Value),
        ),
        column(
            "dist_to_protected_km",
            &grid,
            &[10.0; 4].map(FeatureValue::Value),
        ),
        column("connection_cost", &grid, &[0.0; 4].map(FeatureValue::Value)),
    ];
    *feature_table.borrow_mut() = Some(FeatureTable::assemble(&grid, &COLUMNS, columns));
}

#[given("a feature table with no feature values")]
fn table_with_no_values(feature_table: &RefCell<Option<FeatureTable>>) {
    let grid = four_cell_grid();
    *feature_table.borrow_mut() = Some(FeatureTable::assemble(&grid, &COLUMNS, Vec::new()));
}

#[given("a feature table where only the protected distance varies")]
fn table_with_varying_distance(feature_table: &RefCell<Option<FeatureTable>>) {
    let grid = four_cell_grid();
    let columns = vec![
        column(
            "solar_irradiance",
            &grid,
            &[5.0; 4].map(FeatureValue::Value),
        ),
        column(
            "dist_to_protected_km",
            &grid,
            &[1.0, 2.0, 3.0, 4.0].map(FeatureValue::Value),
        ),
    ];
    *feature_table.borrow_mut() = Some(FeatureTable::assemble(&grid, &COLUMNS, columns));
}

#[when("I score the table")]
fn score_the_table(
    feature_table: &RefCell<Option<FeatureTable>>,
    scored: &RefCell<Option<ScoredTable>>,
) {
    let binding = feature_table.borrow();
    let table = binding
        .as_ref()
        .unwrap_or_else(|| panic!("feature table must be initialised"));
    *scored.borrow_mut() = Some(score_table(table, &ScoreConfig::default()));
}

#[then("the cell with the highest irradiance ranks best")]
fn highest_irradiance_ranks_best(scored: &RefCell<Option<ScoredTable>>) {
    let binding = scored.borrow();
    let table = binding
        .as_ref()
        .unwrap_or_else(|| panic!("scoring result must be recorded"));

    let best = table.best_cells();
    assert_eq!(best.len(), 1, "expected a single best cell");
    assert_eq!(best[0].cell_id, "cell_1_1");
    assert_eq!(best[0].score_norm, 1.0);

    let worst = table.worst_cells();
    assert_eq!(worst.len(), 1);
    assert_eq!(worst[0].cell_id, "cell_0_0");
}

#[then("every cell scores the neutral midpoint")]
fn every_cell_scores_neutral(scored: &RefCell<Option<ScoredTable>>) {
    let binding = scored.borrow();
    let table = binding
        .as_ref()
        .unwrap_or_else(|| panic!("scoring result must be recorded"));

    assert_eq!(table.cells().len(), 4);
    for cell in table.cells() {
        assert_eq!(
            cell.score_norm, NEUTRAL,
            "{} should be neutral, got {}",
            cell.cell_id, cell.score_norm
        );
    }
}

#[then("cells further from protected areas rank at least as well")]
fn further_cells_rank_at_least_as_well(scored: &RefCell<Option<ScoredTable>>) {
    let binding = scored.borrow();
    let table = binding
        .as_ref()
        .unwrap_or_else(|| panic!("scoring result must be recorded"));

    // The distance column increases in table order, so score_norm must be
    // non-decreasing in the same order.
    let norms: Vec<f64> = table.cells().iter().map(|cell| cell.score_norm).collect();
    assert!(
        norms.windows(2).all(|pair| pair[0] <= pair[1]),
        "score_norm decreased along increasing distance: {norms:?}"
    );
}

#[scenario(path = "tests/features/scoring.feature", index = 0)]
fn benefit_ordering_drives_the_ranking(
    feature_table: RefCell<Option<FeatureTable>>,
    scored: RefCell<Option<ScoredTable>>,
) {
    let _ = (feature_table, scored);
}

#[scenario(path = "tests/features/scoring.feature", index = 1)]
fn missing_features_score_neutral(
    feature_table: RefCell<Option<FeatureTable>>,
    scored: RefCell<Option<ScoredTable>>,
) {
    let _ = (feature_table, scored);
}

#[scenario(path = "tests/features/scoring.feature", index = 2)]
fn protected_distance_is_inverted(
    feature_table: RefCell<Option<FeatureTable>>,
    scored: RefCell<Option<ScoredTable>>,
) {
    let _ = (feature_table, scored);
}
