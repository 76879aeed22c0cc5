//! Grid command implementation for the solgrid CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use solgrid_core::{Extent, Grid, StoredRecord};

use crate::{
    ARG_BOUNDS, ARG_CELL_SIZE, ARG_DB, ARG_EPSG, CliError, DEFAULT_CELL_SIZE_M,
    DEFAULT_CELLS_TABLE, DEFAULT_EPSG, ENV_GRID_BOUNDS, ENV_GRID_DB,
};

/// CLI arguments for the `grid` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Tessellate the study area into square cells and persist \
                 them as a store table. The bounds, cell size, and CRS can \
                 come from CLI flags, configuration files, or environment \
                 variables.",
    about = "Tessellate the study area into a cell table"
)]
#[ortho_config(prefix = "SOLGRID")]
pub(crate) struct GridArgs {
    /// Study area bounds as `BOX(x1 y1, x2 y2)` in projected metres.
    #[arg(long = ARG_BOUNDS, value_name = "box")]
    #[serde(default)]
    pub(crate) bounds: Option<String>,
    /// Cell edge length in metres.
    #[arg(long = ARG_CELL_SIZE, value_name = "metres")]
    #[serde(default)]
    pub(crate) cell_size_m: Option<f64>,
    /// EPSG code of the projected CRS the bounds are expressed in.
    #[arg(long = ARG_EPSG, value_name = "code")]
    #[serde(default)]
    pub(crate) epsg: Option<u32>,
    /// Store table whose combined geometry bounds define the study area.
    #[arg(long, value_name = "name", conflicts_with = ARG_BOUNDS)]
    #[serde(default)]
    pub(crate) study_area_table: Option<String>,
    /// Path to the SQLite feature database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
    /// Store table the cells are written to.
    #[arg(long, value_name = "name")]
    #[serde(default)]
    pub(crate) table: Option<String>,
}

impl GridArgs {
    pub(crate) fn into_config(self) -> Result<GridConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        GridConfig::try_from(merged)
    }
}

/// Where the study area comes from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StudyArea {
    /// Explicit bounds in projected metres.
    Bounds(Extent),
    /// Combined bounds of every geometry in a store table.
    Table(String),
}

/// Resolved `grid` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GridConfig {
    /// Study area source.
    pub(crate) area: StudyArea,
    /// Cell edge length in metres.
    pub(crate) cell_size_m: f64,
    /// EPSG code of the projected CRS.
    pub(crate) epsg: u32,
    /// Path to the SQLite feature database.
    pub(crate) db: Utf8PathBuf,
    /// Store table the cells are written to.
    pub(crate) table: String,
}

impl TryFrom<GridArgs> for GridConfig {
    type Error = CliError;

    fn try_from(args: GridArgs) -> Result<Self, Self::Error> {
        let area = match (args.bounds, args.study_area_table) {
            (Some(raw), _) => StudyArea::Bounds(crate::parse_bounds(ARG_BOUNDS, &raw)?),
            (None, Some(table)) => StudyArea::Table(table),
            (None, None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_BOUNDS,
                    env: ENV_GRID_BOUNDS,
                });
            }
        };
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_DB,
            env: ENV_GRID_DB,
        })?;
        Ok(Self {
            area,
            cell_size_m: args.cell_size_m.unwrap_or(DEFAULT_CELL_SIZE_M),
            epsg: args.epsg.unwrap_or(DEFAULT_EPSG),
            db,
            table: args
                .table
                .unwrap_or_else(|| DEFAULT_CELLS_TABLE.to_owned()),
        })
    }
}

pub(super) fn run_grid(args: GridArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    #[cfg(feature = "store-sqlite")]
    {
        let store = crate::open_store(&config.db)?;
        execute_grid(&config, &store)
    }
    #[cfg(not(feature = "store-sqlite"))]
    {
        let _ = config;
        Err(CliError::MissingFeature {
            feature: "store-sqlite",
            action: "writing the cell table",
        })
    }
}

/// Build the grid and replace the cell table in the store.
pub(crate) fn execute_grid(
    config: &GridConfig,
    store: &dyn solgrid_core::FeatureStore,
) -> Result<(), CliError> {
    let bounds = resolve_bounds(config, store)?;
    let grid = crate::build_grid(&bounds, config.cell_size_m, config.epsg)?;
    let records = cell_records(&grid);
    store
        .replace_table(&config.table, &records)
        .map_err(|source| CliError::WriteTable {
            table: config.table.clone(),
            source,
        })
}

fn resolve_bounds(
    config: &GridConfig,
    store: &dyn solgrid_core::FeatureStore,
) -> Result<Extent, CliError> {
    match &config.area {
        StudyArea::Bounds(extent) => Ok(*extent),
        StudyArea::Table(table) => store
            .table_extent(table)
            .map_err(|source| CliError::ReadTable {
                table: table.clone(),
                source,
            })?
            .ok_or_else(|| CliError::EmptyStudyArea {
                table: table.clone(),
            }),
    }
}

/// One store record per cell: polygon geometry plus identity fields.
pub(crate) fn cell_records(grid: &Grid) -> Vec<StoredRecord> {
    grid.cells()
        .iter()
        .map(|cell| StoredRecord::new(crate::cell_geometry(cell), crate::cell_fields(cell)))
        .collect()
}
