//! Energy-potential feature extraction.
//!
//! The primary solar source is an atlas table of irradiance polygons
//! joined onto cells by mean. Cells the atlas leaves without a value are
//! offered to a point-lookup service, querying a deterministic capped
//! subsample of their centroids instead of every one; cells outside the
//! subsample stay missing and normalise to the neutral midpoint
//! downstream.
//!
//! Wind potential has no extractor yet and is recorded as not
//! implemented, which is distinct from a source that was tried and
//! failed.

use rand::SeedableRng;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use solgrid_core::{Cell, FeatureColumn, FeatureStore, FeatureValue, Grid, IrradianceLookup};

use crate::{join, proj};

/// Column name for mean annual solar irradiance.
pub const SOLAR_COLUMN: &str = "solar_irradiance";

/// Column name for the wind-potential placeholder.
pub const WIND_COLUMN: &str = "wind_potential";

/// Upper bound on point lookups when falling back to a remote service.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Options for the solar extractor.
#[derive(Debug, Clone)]
pub struct SolarOptions {
    /// Store table holding irradiance polygons.
    pub table: String,
    /// Attribute column carrying the annual irradiance value.
    pub value_column: String,
    /// Maximum number of cells queried against the fallback lookup.
    pub sample_size: usize,
    /// Seed for the fallback subsample, so reruns query the same cells.
    pub seed: u64,
}

impl Default for SolarOptions {
    fn default() -> Self {
        Self {
            table: "atlas_solar".to_owned(),
            value_column: "annual".to_owned(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: 0,
        }
    }
}

/// Extract the solar irradiance column from the atlas table, filling a
/// subsample of the cells the join left missing from the point lookup.
#[must_use]
pub fn solar_column(
    grid: &Grid,
    store: &dyn FeatureStore,
    lookup: Option<&dyn IrradianceLookup>,
    options: &SolarOptions,
) -> FeatureColumn {
    let mut joined = join::mean_column(
        grid,
        store,
        &options.table,
        &options.value_column,
        SOLAR_COLUMN,
    );
    let missing: Vec<&Cell> = grid
        .cells()
        .iter()
        .filter(|cell| !joined.get(&cell.id).is_value())
        .collect();
    if missing.is_empty() {
        return joined;
    }

    let Some(lookup) = lookup else {
        return joined;
    };
    log::warn!(
        "{} of {} cells have no irradiance after joining table {}, sampling up to {} via point lookup",
        missing.len(),
        grid.cells().len(),
        options.table,
        options.sample_size
    );
    fill_from_lookup(&mut joined, grid, &missing, lookup, options);
    joined
}

/// Query the lookup at a seeded subsample of the missing cells' centroids
/// and write the results into `column`.
fn fill_from_lookup(
    column: &mut FeatureColumn,
    grid: &Grid,
    missing: &[&Cell],
    lookup: &dyn IrradianceLookup,
    options: &SolarOptions,
) {
    let Some(zone) = grid.crs().utm_zone() else {
        log::warn!(
            "cannot reproject {} centroids for point lookups; unjoined cells stay missing",
            grid.crs()
        );
        return;
    };

    let amount = options.sample_size.min(missing.len());
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    for index in sample(&mut rng, missing.len(), amount) {
        let Some(cell) = missing.get(index) else {
            continue;
        };
        let (lon, lat) = proj::utm_to_wgs84(cell.centroid, zone);
        match lookup.annual_irradiance(lon, lat) {
            Ok(value) => column.insert(&cell.id, FeatureValue::from_f64(value)),
            Err(err) => {
                log::warn!("irradiance lookup failed for {}: {err}", cell.id);
            }
        }
    }
}

/// The wind-potential column: declared but not yet extracted.
#[must_use]
pub fn wind_column(grid: &Grid) -> FeatureColumn {
    FeatureColumn::uniform(WIND_COLUMN, grid, FeatureValue::NotImplemented)
}
