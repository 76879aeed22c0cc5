//! Error types emitted by the solgrid CLI.
//!
//! Keep this error type reasonably small, as most CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use solgrid_core::{ExtentError, GridError, StoreError};
use solgrid_data::lookup::LookupBuildError;
use solgrid_scorer::ScoreError;
use thiserror::Error;

/// Errors emitted by the solgrid CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        feature: &'static str,
        action: &'static str,
    },
    /// The bounds option could not be parsed into a usable extent.
    #[error("invalid {field} value {value:?}: {source}")]
    InvalidBounds {
        field: &'static str,
        value: String,
        #[source]
        source: ExtentError,
    },
    /// The study area and cell size do not produce a grid.
    #[error("failed to build grid: {0}")]
    BuildGrid(#[from] GridError),
    /// Opening the feature database failed.
    #[error("failed to open store at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// Reading a store table failed.
    #[error("failed to read table {table}: {source}")]
    ReadTable {
        table: String,
        #[source]
        source: StoreError,
    },
    /// Writing a store table failed.
    #[error("failed to write table {table}: {source}")]
    WriteTable {
        table: String,
        #[source]
        source: StoreError,
    },
    /// The study-area table holds no geometries to take bounds from.
    #[error("study area table {table} has no geometries")]
    EmptyStudyArea { table: String },
    /// The persisted cell table cannot pin a grid (empty, or without
    /// cell sizes); the grid stage has to run first.
    #[error("cell table {table} is empty or carries no cell_size_km; run the grid stage first")]
    UnusableCellTable { table: String },
    /// A persisted feature row does not carry a cell identifier.
    #[error("row {row} of table {table} has no cell_id field")]
    RowMissingCellId { table: String, row: usize },
    /// The configured score weights are unusable.
    #[error("invalid score weights: {0}")]
    InvalidWeights(#[from] ScoreError),
    /// Constructing the irradiance lookup failed.
    #[error("failed to build irradiance lookup: {0}")]
    BuildLookup(#[from] LookupBuildError),
    /// Serialising the command summary failed.
    #[error("failed to serialise summary: {0}")]
    SerialiseSummary(#[source] serde_json::Error),
    /// Writing the command summary failed.
    #[error("failed to write summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
