//! Facade crate for the solgrid suitability engine.
//!
//! This crate re-exports the core domain types and exposes the optional
//! `SQLite` store implementation behind a feature flag.

#![forbid(unsafe_code)]

pub use solgrid_core::{
    Cell, Crs, Extent, ExtentError, FeatureColumn, FeatureStore, FeatureTable, FeatureValue,
    FieldValue, Grid, GridError, Hemisphere, IrradianceLookup, LookupError,
    NOT_IMPLEMENTED_SENTINEL, SourceRow, StoreError, StoredRecord, UtmZone, cell_id,
};

#[cfg(feature = "store-sqlite")]
pub use solgrid_core::SqliteFeatureStore;
