//! Core domain types for the solgrid suitability pipeline.
//!
//! These models provide basic validation to keep downstream
//! components honest. Constructors return `Result` to surface
//! invalid input early.
//!
//! Responsibilities:
//! - Define the analysis grid, its reference system and extent.
//! - Model per-cell feature values, columns and the assembled table.
//! - Declare the store and irradiance-lookup seams the pipeline
//!   stages depend on.
//!
//! Boundaries:
//! - No I/O beyond the store trait's own implementations; extraction
//!   and scoring live in the `solgrid-data` and `solgrid-scorer`
//!   crates.

mod crs;
mod extent;
mod feature;
mod grid;
mod lookup;
mod store;

pub use crs::{Crs, Hemisphere, UtmZone};
pub use extent::{Extent, ExtentError};
pub use feature::{
    FeatureColumn, FeatureTable, FeatureValue, NOT_IMPLEMENTED_SENTINEL,
};
pub use grid::{Cell, Grid, GridError, cell_id};
pub use lookup::{IrradianceLookup, LookupError};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteFeatureStore;
pub use store::{FeatureStore, FieldValue, SourceRow, StoreError, StoredRecord};
