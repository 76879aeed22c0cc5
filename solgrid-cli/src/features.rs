//! Features command implementation for the solgrid CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use solgrid_core::{
    Extent, FeatureStore, FeatureTable, FieldValue, Grid, IrradianceLookup, StoredRecord,
};
use solgrid_data::{ExtractionConfig, FEATURE_COLUMNS, SolarOptions, extract_features};

use crate::{
    ARG_BOUNDS, ARG_CELL_SIZE, ARG_DB, ARG_EPSG, CliError, DEFAULT_CELL_SIZE_M, DEFAULT_CELLS_TABLE,
    DEFAULT_EPSG, DEFAULT_FEATURES_TABLE, ENV_FEATURES_DB, FIELD_CELL_SIZE_KM,
};

/// CLI arguments for the `features` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Extract the per-cell feature table. The grid is rebuilt \
                 from the persisted cell table by default, or from explicit \
                 bounds; features are joined from the named source tables \
                 in the database, with the NASA POWER service as the solar \
                 fallback unless --offline is set.",
    about = "Extract the per-cell feature table"
)]
#[ortho_config(prefix = "SOLGRID")]
pub(crate) struct FeaturesArgs {
    /// Explicit study area bounds as `BOX(x1 y1, x2 y2)`, overriding the
    /// persisted cell table.
    #[arg(long = ARG_BOUNDS, value_name = "box")]
    #[serde(default)]
    pub(crate) bounds: Option<String>,
    /// Store table the grid stage wrote its cells to.
    #[arg(long, value_name = "name", conflicts_with = ARG_BOUNDS)]
    #[serde(default)]
    pub(crate) cells_table: Option<String>,
    /// Cell edge length in metres.
    #[arg(long = ARG_CELL_SIZE, value_name = "metres")]
    #[serde(default)]
    pub(crate) cell_size_m: Option<f64>,
    /// EPSG code of the projected CRS the bounds are expressed in.
    #[arg(long = ARG_EPSG, value_name = "code")]
    #[serde(default)]
    pub(crate) epsg: Option<u32>,
    /// Path to the SQLite feature database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
    /// Store table the feature rows are written to.
    #[arg(long, value_name = "name")]
    #[serde(default)]
    pub(crate) table: Option<String>,
    /// Source table holding irradiance polygons.
    #[arg(long, value_name = "name")]
    #[serde(default)]
    pub(crate) solar_table: Option<String>,
    /// Attribute column carrying the annual irradiance value.
    #[arg(long, value_name = "name")]
    #[serde(default)]
    pub(crate) solar_column: Option<String>,
    /// Source table holding protected-area geometries.
    #[arg(long, value_name = "name")]
    #[serde(default)]
    pub(crate) protected_table: Option<String>,
    /// Source table holding transmission-grid geometries.
    #[arg(long, value_name = "name")]
    #[serde(default)]
    pub(crate) grid_table: Option<String>,
    /// Connection cost per kilometre of line.
    #[arg(long, value_name = "currency")]
    #[serde(default)]
    pub(crate) cost_per_km: Option<f64>,
    /// Seed for the solar fallback subsample.
    #[arg(long, value_name = "seed")]
    #[serde(default)]
    pub(crate) sample_seed: Option<u64>,
    /// Skip the HTTP solar fallback; absent atlas coverage stays missing.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "bool")]
    #[serde(default)]
    pub(crate) offline: Option<bool>,
}

impl FeaturesArgs {
    pub(crate) fn into_config(self) -> Result<FeaturesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FeaturesConfig::try_from(merged)
    }
}

/// Where the grid a feature run operates over comes from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GridSource {
    /// Rebuild from explicit bounds with the configured cell size.
    Bounds(Extent),
    /// Rebuild from the persisted cell table's extent and cell size.
    CellTable(String),
}

/// Resolved `features` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct FeaturesConfig {
    /// Grid source for the run.
    pub(crate) grid_source: GridSource,
    /// Cell edge length in metres, used with explicit bounds.
    pub(crate) cell_size_m: f64,
    /// EPSG code of the projected CRS.
    pub(crate) epsg: u32,
    /// Path to the SQLite feature database.
    pub(crate) db: Utf8PathBuf,
    /// Store table the feature rows are written to.
    pub(crate) table: String,
    /// Options for the extraction stage.
    pub(crate) extraction: ExtractionConfig,
    /// Whether the HTTP solar fallback is disabled.
    pub(crate) offline: bool,
}

impl TryFrom<FeaturesArgs> for FeaturesConfig {
    type Error = CliError;

    fn try_from(args: FeaturesArgs) -> Result<Self, Self::Error> {
        let grid_source = match (args.bounds, args.cells_table) {
            (Some(raw), _) => GridSource::Bounds(crate::parse_bounds(ARG_BOUNDS, &raw)?),
            (None, table) => {
                GridSource::CellTable(table.unwrap_or_else(|| DEFAULT_CELLS_TABLE.to_owned()))
            }
        };
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_DB,
            env: ENV_FEATURES_DB,
        })?;

        let defaults = ExtractionConfig::default();
        let solar = SolarOptions {
            table: args.solar_table.unwrap_or(defaults.solar.table),
            value_column: args.solar_column.unwrap_or(defaults.solar.value_column),
            sample_size: defaults.solar.sample_size,
            seed: args.sample_seed.unwrap_or(defaults.solar.seed),
        };
        let extraction = ExtractionConfig {
            solar,
            protected_table: args.protected_table.unwrap_or(defaults.protected_table),
            grid_table: args.grid_table.unwrap_or(defaults.grid_table),
            cost_per_km: args.cost_per_km.unwrap_or(defaults.cost_per_km),
        };

        Ok(Self {
            grid_source,
            cell_size_m: args.cell_size_m.unwrap_or(DEFAULT_CELL_SIZE_M),
            epsg: args.epsg.unwrap_or(DEFAULT_EPSG),
            db,
            table: args
                .table
                .unwrap_or_else(|| DEFAULT_FEATURES_TABLE.to_owned()),
            extraction,
            offline: args.offline.unwrap_or(false),
        })
    }
}

pub(super) fn run_features(args: FeaturesArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    #[cfg(feature = "store-sqlite")]
    {
        let store = crate::open_store(&config.db)?;
        if config.offline {
            execute_features(&config, &store, None)
        } else {
            let lookup = solgrid_data::lookup::HttpIrradianceLookup::new()?;
            execute_features(&config, &store, Some(&lookup))
        }
    }
    #[cfg(not(feature = "store-sqlite"))]
    {
        let _ = config;
        Err(CliError::MissingFeature {
            feature: "store-sqlite",
            action: "writing the feature table",
        })
    }
}

/// Rebuild the grid, extract every feature column, and replace the
/// feature table in the store.
pub(crate) fn execute_features(
    config: &FeaturesConfig,
    store: &dyn FeatureStore,
    lookup: Option<&dyn IrradianceLookup>,
) -> Result<(), CliError> {
    let grid = resolve_grid(config, store)?;
    let table = extract_features(&grid, store, lookup, &config.extraction);
    let records = feature_records(&grid, &table);
    store
        .replace_table(&config.table, &records)
        .map_err(|source| CliError::WriteTable {
            table: config.table.clone(),
            source,
        })
}

/// Reproduce the grid a run operates over.
///
/// The persisted cell table pins both the extent and the cell size, so
/// rebuilding from it yields the same cells (and ids) the grid stage
/// wrote.
fn resolve_grid(config: &FeaturesConfig, store: &dyn FeatureStore) -> Result<Grid, CliError> {
    match &config.grid_source {
        GridSource::Bounds(extent) => crate::build_grid(extent, config.cell_size_m, config.epsg),
        GridSource::CellTable(table) => {
            let records = store
                .read_records(table)
                .map_err(|source| CliError::ReadTable {
                    table: table.clone(),
                    source,
                })?;
            let Some(FieldValue::Real(cell_size_km)) = records
                .first()
                .and_then(|record| record.fields.get(FIELD_CELL_SIZE_KM))
            else {
                return Err(CliError::UnusableCellTable {
                    table: table.clone(),
                });
            };
            let cell_size_m = cell_size_km * 1_000.0;
            let extent = store
                .table_extent(table)
                .map_err(|source| CliError::ReadTable {
                    table: table.clone(),
                    source,
                })?
                .ok_or_else(|| CliError::UnusableCellTable {
                    table: table.clone(),
                })?;
            crate::build_grid(&extent, cell_size_m, config.epsg)
        }
    }
}

/// One store record per cell: identity fields plus every feature value.
pub(crate) fn feature_records(grid: &Grid, table: &FeatureTable) -> Vec<StoredRecord> {
    grid.cells()
        .iter()
        .map(|cell| {
            let mut fields = crate::cell_fields(cell);
            for name in FEATURE_COLUMNS {
                let value = table.value(name, &cell.id);
                fields.push(((*name).to_owned(), FieldValue::from(value)));
            }
            StoredRecord::new(crate::cell_geometry(cell), fields)
        })
        .collect()
}
