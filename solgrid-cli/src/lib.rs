//! Command-line interface for the solgrid suitability pipeline.
//!
//! Three subcommands mirror the pipeline stages: `grid` tessellates the
//! study area and persists the cells, `features` extracts the per-cell
//! feature table, and `score` ranks the cells and persists the scored
//! surface. Every stage reads and writes named tables in one SQLite
//! database, so a full run is three invocations against the same file.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use geo::Geometry;
use solgrid_core::{Cell, Crs, Extent, FieldValue, Grid};

mod error;
mod features;
mod grid;
mod score;

pub use error::CliError;

pub(crate) const ARG_BOUNDS: &str = "bounds";
pub(crate) const ARG_DB: &str = "db";
pub(crate) const ARG_CELL_SIZE: &str = "cell-size-m";
pub(crate) const ARG_EPSG: &str = "epsg";
pub(crate) const ENV_GRID_BOUNDS: &str = "SOLGRID_CMDS_GRID_BOUNDS";
pub(crate) const ENV_GRID_DB: &str = "SOLGRID_CMDS_GRID_DB";
pub(crate) const ENV_FEATURES_DB: &str = "SOLGRID_CMDS_FEATURES_DB";
pub(crate) const ENV_SCORE_DB: &str = "SOLGRID_CMDS_SCORE_DB";

/// Store table the `grid` subcommand writes by default.
pub(crate) const DEFAULT_CELLS_TABLE: &str = "grid_cells";
/// Store table the `features` subcommand writes by default.
pub(crate) const DEFAULT_FEATURES_TABLE: &str = "grid_features";
/// Store table the `score` subcommand writes by default.
pub(crate) const DEFAULT_SCORED_TABLE: &str = "scored_grid";

pub(crate) const DEFAULT_CELL_SIZE_M: f64 = 1_000.0;
pub(crate) const DEFAULT_EPSG: u32 = 32_724;

pub(crate) const FIELD_CELL_ID: &str = "cell_id";
pub(crate) const FIELD_CELL_SIZE_KM: &str = "cell_size_km";
pub(crate) const FIELD_AREA_KM2: &str = "area_km2";

/// Run the solgrid CLI with the current process arguments and environment.
///
/// # Errors
/// Returns a [`CliError`] when argument parsing, configuration merging,
/// or the selected subcommand fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Grid(args) => grid::run_grid(args),
        Command::Features(args) => features::run_features(args),
        Command::Score(args) => score::run_score(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "solgrid",
    about = "Grid, feature, and scoring stages of the solgrid pipeline",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tessellate the study area into square cells and persist them.
    Grid(grid::GridArgs),
    /// Extract the per-cell feature table from the source tables.
    Features(features::FeaturesArgs),
    /// Score the persisted feature table and persist the ranked surface.
    Score(score::ScoreArgs),
}

/// Parse a `BOX(x1 y1, x2 y2)` bounds string into an extent.
pub(crate) fn parse_bounds(field: &'static str, raw: &str) -> Result<Extent, CliError> {
    raw.parse().map_err(|source| CliError::InvalidBounds {
        field,
        value: raw.to_owned(),
        source,
    })
}

/// Build the grid a subcommand operates over from its resolved options.
pub(crate) fn build_grid(extent: &Extent, cell_size_m: f64, epsg: u32) -> Result<Grid, CliError> {
    Grid::build(extent, cell_size_m, Crs::new(epsg)).map_err(CliError::BuildGrid)
}

pub(crate) fn cell_geometry(cell: &Cell) -> Geometry<f64> {
    Geometry::Polygon(cell.geometry.to_polygon())
}

/// The identity fields every persisted cell row carries.
pub(crate) fn cell_fields(cell: &Cell) -> Vec<(String, FieldValue)> {
    vec![
        (FIELD_CELL_ID.to_owned(), FieldValue::Text(cell.id.clone())),
        (
            FIELD_CELL_SIZE_KM.to_owned(),
            FieldValue::Real(cell.cell_size_km),
        ),
        (FIELD_AREA_KM2.to_owned(), FieldValue::Real(cell.area_km2)),
    ]
}

#[cfg(feature = "store-sqlite")]
pub(crate) fn open_store(
    path: &camino::Utf8Path,
) -> Result<solgrid_core::SqliteFeatureStore, CliError> {
    solgrid_core::SqliteFeatureStore::open(path.as_std_path()).map_err(|source| {
        CliError::OpenStore {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests;
