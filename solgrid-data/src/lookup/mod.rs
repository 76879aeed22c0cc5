//! HTTP-based irradiance lookups for external climatology services.
//!
//! This module provides [`HttpIrradianceLookup`], an implementation of
//! [`solgrid_core::IrradianceLookup`] that fetches annual irradiance
//! aggregates from NASA's POWER climatology point API.
//!
//! # Example
//!
//! ```no_run
//! use solgrid_data::lookup::{HttpIrradianceLookup, HttpIrradianceLookupConfig};
//! use solgrid_core::IrradianceLookup;
//! use std::time::Duration;
//!
//! let config = HttpIrradianceLookupConfig::default().with_timeout(Duration::from_secs(30));
//! let lookup = HttpIrradianceLookup::with_config(config)?;
//!
//! let annual = lookup.annual_irradiance(-39.0, -12.5)?;
//! println!("annual irradiance: {annual} kWh/m2/day");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod power;
mod provider;

pub use provider::{
    DEFAULT_USER_AGENT, HttpIrradianceLookup, HttpIrradianceLookupConfig, LookupBuildError,
};
