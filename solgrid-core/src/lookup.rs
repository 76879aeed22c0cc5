//! Supplementary point lookups for annual solar irradiance.
//!
//! The `IrradianceLookup` trait abstracts an external point-query service
//! that returns an annual aggregate irradiance for a geographic
//! coordinate. The trait is synchronous so the batch pipeline stays
//! embeddable in synchronous contexts; HTTP implementations bridge their
//! async clients internally.
//!
//! A lookup failure is a per-cell degradation, never a batch abort:
//! callers record the cell as missing and move on.

use thiserror::Error;

/// Errors from [`IrradianceLookup::annual_irradiance`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The request exceeded the configured timeout.
    #[error("lookup of {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with an HTTP error status.
    #[error("lookup of {url} failed with HTTP {status}: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail from the client.
        message: String,
    },
    /// The request could not be delivered at all.
    #[error("lookup of {url} failed: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Error detail from the client.
        message: String,
    },
    /// The response body did not contain a usable annual value.
    #[error("could not parse irradiance response: {message}")]
    Parse {
        /// Parse failure detail.
        message: String,
    },
    /// The grid's coordinate reference cannot be reprojected for lookups.
    #[error("coordinate reference {crs} is not a recognised UTM code")]
    UnsupportedCrs {
        /// Display form of the offending reference.
        crs: String,
    },
}

/// Query an external service for annual irradiance at a point.
///
/// Coordinates are geographic WGS84 (`lon` = longitude east, `lat` =
/// latitude north); callers working in a projected reference reproject
/// before calling. Implementations must return finite values.
///
/// # Examples
///
/// ```
/// use solgrid_core::{IrradianceLookup, LookupError};
///
/// struct ConstantLookup(f64);
///
/// impl IrradianceLookup for ConstantLookup {
///     fn annual_irradiance(&self, _lon: f64, _lat: f64) -> Result<f64, LookupError> {
///         Ok(self.0)
///     }
/// }
///
/// let lookup = ConstantLookup(5.6);
/// assert_eq!(lookup.annual_irradiance(-39.0, -12.0)?, 5.6);
/// # Ok::<(), LookupError>(())
/// ```
pub trait IrradianceLookup {
    /// Return the annual aggregate irradiance at `(lon, lat)`.
    fn annual_irradiance(&self, lon: f64, lat: f64) -> Result<f64, LookupError>;
}
