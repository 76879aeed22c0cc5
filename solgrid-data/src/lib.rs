//! Feature extraction and source access for the solgrid pipeline.
//!
//! Responsibilities:
//! - Join stored geometry tables onto grid cells (means and distances).
//! - Extract the declared feature columns and assemble the per-cell
//!   feature table.
//! - Provide the HTTP irradiance lookup and the UTM-to-WGS84 transform
//!   it depends on.
//!
//! Boundaries:
//! - Do not encode scoring rules (live in `solgrid-scorer`).
//! - Keep blocking I/O off async executors; the HTTP lookup bridges its
//!   async client internally.
//!
//! Invariants:
//! - A missing or unreadable source degrades to missing values with a
//!   warning; extraction never aborts a run.

mod cost;
mod dist;
mod energy;
mod impact;
mod join;
pub mod lookup;
mod pipeline;
mod proj;

pub use cost::{
    CONNECTION_COST_COLUMN, DEFAULT_COST_PER_KM, DEFAULT_GRID_TABLE, GRID_DISTANCE_COLUMN,
    connection_cost_column, grid_distance_column,
};
pub use dist::point_geometry_distance;
pub use energy::{
    DEFAULT_SAMPLE_SIZE, SOLAR_COLUMN, SolarOptions, WIND_COLUMN, solar_column, wind_column,
};
pub use impact::{
    DEFAULT_PROTECTED_TABLE, POP_DENSITY_COLUMN, PROTECTED_DISTANCE_COLUMN,
    population_density_column, protected_distance_column,
};
pub use join::{distance_column, distance_to_nearest_km, mean_column, mean_intersecting};
pub use pipeline::{ExtractionConfig, FEATURE_COLUMNS, extract_features};
pub use proj::utm_to_wgs84;
