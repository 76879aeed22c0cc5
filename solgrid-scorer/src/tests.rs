//! Unit coverage for normalisation and scoring helpers.
#![forbid(unsafe_code)]

use rstest::rstest;
use solgrid_core::{Crs, Extent, FeatureColumn, FeatureTable, FeatureValue, Grid};

use crate::{ColumnStats, NEUTRAL, ScoreConfig, ScoreError, ScoreWeights, score_table};

fn four_cell_grid() -> Grid {
    let extent = Extent::new(0.0, 0.0, 10_000.0, 10_000.0).expect("valid extent");
    Grid::build(&extent, 5_000.0, Crs::new(32724)).expect("valid grid")
}

fn column(name: &str, grid: &Grid, values: &[FeatureValue]) -> FeatureColumn {
    let mut column = FeatureColumn::new(name.to_owned());
    for (cell, value) in grid.cells().iter().zip(values) {
        column.insert(&cell.id, *value);
    }
    column
}

fn table_with(grid: &Grid, columns: Vec<FeatureColumn>) -> FeatureTable {
    let names: Vec<&str> = columns.iter().map(FeatureColumn::name).collect();
    FeatureTable::assemble(grid, &names, columns.clone())
}

#[rstest]
fn normalises_to_unit_range() {
    let stats = ColumnStats::from_values(
        [2.0, 4.0, 6.0].into_iter().map(FeatureValue::Value),
    );

    assert_eq!(stats.normalise(FeatureValue::Value(2.0)), 0.0);
    assert_eq!(stats.normalise(FeatureValue::Value(4.0)), 0.5);
    assert_eq!(stats.normalise(FeatureValue::Value(6.0)), 1.0);
}

#[rstest]
fn missing_values_normalise_to_neutral() {
    let stats = ColumnStats::from_values(
        [
            FeatureValue::Value(1.0),
            FeatureValue::Missing,
            FeatureValue::Value(3.0),
        ]
        .into_iter(),
    );

    assert_eq!(stats.normalise(FeatureValue::Missing), NEUTRAL);
    assert_eq!(stats.normalise(FeatureValue::NotImplemented), NEUTRAL);
}

#[rstest]
#[case::all_missing(&[FeatureValue::Missing, FeatureValue::Missing])]
#[case::constant(&[FeatureValue::Value(7.0), FeatureValue::Value(7.0)])]
#[case::empty(&[])]
fn degenerate_columns_normalise_to_neutral(#[case] values: &[FeatureValue]) {
    let stats = ColumnStats::from_values(values.iter().copied());

    assert!(stats.is_degenerate());
    assert_eq!(stats.normalise(FeatureValue::Value(7.0)), NEUTRAL);
    assert_eq!(stats.normalise(FeatureValue::Missing), NEUTRAL);
}

#[rstest]
fn missing_share_counts_every_non_value() {
    let stats = ColumnStats::from_values(
        [
            FeatureValue::Value(1.0),
            FeatureValue::Missing,
            FeatureValue::NotImplemented,
            FeatureValue::Value(2.0),
        ]
        .into_iter(),
    );

    assert_eq!(stats.missing_share(), 0.5);
}

#[rstest]
fn default_weights_encode_the_policy() {
    let weights = ScoreWeights::default();
    assert_eq!(weights.benefit, 0.6);
    assert_eq!(weights.impact, 0.25);
    assert_eq!(weights.cost, 0.15);
}

#[rstest]
#[case(f64::NAN, 0.25, 0.15)]
#[case(-0.1, 0.25, 0.15)]
#[case(0.0, 0.0, 0.0)]
fn rejects_unusable_weights(#[case] benefit: f64, #[case] impact: f64, #[case] cost: f64) {
    let err = ScoreWeights::new(benefit, impact, cost).unwrap_err();
    assert!(matches!(err, ScoreError::InvalidWeights { .. }));
}

#[rstest]
fn benefit_order_drives_ranking_under_constant_penalties() {
    let grid = four_cell_grid();
    let benefit = [1.0, 2.0, 3.0, 4.0].map(FeatureValue::Value);
    let distance = [10.0; 4].map(FeatureValue::Value);
    let cost = [0.0; 4].map(FeatureValue::Value);
    let table = table_with(
        &grid,
        vec![
            column("solar_irradiance", &grid, &benefit),
            column("dist_to_protected_km", &grid, &distance),
            column("connection_cost", &grid, &cost),
        ],
    );

    let scored = score_table(&table, &ScoreConfig::default());

    let norms: Vec<f64> = scored.cells().iter().map(|c| c.score_norm).collect();
    assert!(norms.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(scored.cells()[0].impact_n, NEUTRAL);
    assert_eq!(scored.cells()[0].connection_cost_n, NEUTRAL);
    let best = scored.best_cells();
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].score_norm, 1.0);
}

#[rstest]
fn fully_missing_table_scores_neutral_everywhere() {
    let grid = four_cell_grid();
    let table = FeatureTable::assemble(
        &grid,
        &["solar_irradiance", "dist_to_protected_km", "connection_cost"],
        Vec::new(),
    );

    let scored = score_table(&table, &ScoreConfig::default());

    for cell in scored.cells() {
        assert_eq!(cell.energy_n, NEUTRAL);
        assert_eq!(cell.impact_n, NEUTRAL);
        assert_eq!(cell.connection_cost_n, NEUTRAL);
        assert_eq!(cell.score_norm, NEUTRAL);
    }
}

#[rstest]
fn larger_protected_distance_never_scores_worse() {
    let grid = four_cell_grid();
    let benefit = [5.0; 4].map(FeatureValue::Value);
    let distance = [1.0, 2.0, 3.0, 4.0].map(FeatureValue::Value);
    let table = table_with(
        &grid,
        vec![
            column("solar_irradiance", &grid, &benefit),
            column("dist_to_protected_km", &grid, &distance),
        ],
    );

    let scored = score_table(&table, &ScoreConfig::default());

    let impacts: Vec<f64> = scored.cells().iter().map(|c| c.impact_n).collect();
    assert!(impacts.windows(2).all(|pair| pair[0] >= pair[1]));
    let norms: Vec<f64> = scored.cells().iter().map(|c| c.score_norm).collect();
    assert!(norms.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[rstest]
fn rescoring_an_unchanged_table_is_bit_identical() {
    let grid = four_cell_grid();
    let benefit = [1.5, 2.5, 3.5, 4.5].map(FeatureValue::Value);
    let cost = [9.0, 3.0, 6.0, 1.0].map(FeatureValue::Value);
    let table = table_with(
        &grid,
        vec![
            column("solar_irradiance", &grid, &benefit),
            column("connection_cost", &grid, &cost),
        ],
    );
    let config = ScoreConfig::default();

    let first = score_table(&table, &config);
    let second = score_table(&table, &config);

    assert_eq!(first, second);
}

#[rstest]
fn ties_report_every_qualifying_cell() {
    let grid = four_cell_grid();
    let benefit = [4.0, 1.0, 4.0, 1.0].map(FeatureValue::Value);
    let table = table_with(&grid, vec![column("solar_irradiance", &grid, &benefit)]);

    let scored = score_table(&table, &ScoreConfig::default());

    assert_eq!(scored.best_cells().len(), 2);
    assert_eq!(scored.worst_cells().len(), 2);
}

#[rstest]
fn score_norm_is_always_in_unit_range() {
    let grid = four_cell_grid();
    let mixed = [
        FeatureValue::Value(800.0),
        FeatureValue::Missing,
        FeatureValue::NotImplemented,
        FeatureValue::Value(-3.0),
    ];
    let table = table_with(&grid, vec![column("solar_irradiance", &grid, &mixed)]);

    let scored = score_table(&table, &ScoreConfig::default());

    for cell in scored.cells() {
        assert!(
            (0.0..=1.0).contains(&cell.score_norm),
            "{} out of range: {}",
            cell.cell_id,
            cell.score_norm
        );
    }
}
