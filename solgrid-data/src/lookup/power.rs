//! NASA POWER climatology API response types.
//!
//! This module provides deserialisation types for the POWER point
//! climatology endpoint, which returns long-term monthly and annual
//! aggregates of surface solar irradiance for a coordinate.
//!
//! See: <https://power.larc.nasa.gov/docs/services/api/temporal/climatology/>

use std::collections::BTreeMap;

use serde::Deserialize;

/// Fill value the service uses for cells without data.
const FILL_VALUE_THRESHOLD: f64 = -900.0;

/// POWER point climatology response.
#[derive(Debug, Deserialize)]
pub struct PointResponse {
    /// GeoJSON-style properties wrapper holding the parameter block.
    pub properties: Properties,
}

/// The `properties` member of a point response.
#[derive(Debug, Deserialize)]
pub struct Properties {
    /// Requested parameters keyed by period label.
    pub parameter: Parameters,
}

/// Parameter blocks keyed by period label (`"JAN"`..`"DEC"`, `"ANN"`).
#[derive(Debug, Deserialize)]
pub struct Parameters {
    /// All-sky surface shortwave downward irradiance, kWh/m²/day.
    #[serde(rename = "ALLSKY_SFC_SW_DWN", default)]
    pub irradiance: BTreeMap<String, f64>,
}

impl PointResponse {
    /// The annual aggregate irradiance, if the response carries one.
    ///
    /// Prefers the `ANN` period (the service's annual label), falling
    /// back to any finite period value when the annual label is absent.
    /// Fill values such as `-999` are treated as absent.
    #[must_use]
    pub fn annual_irradiance(&self) -> Option<f64> {
        let usable = |value: &f64| value.is_finite() && *value > FILL_VALUE_THRESHOLD;
        let periods = &self.properties.parameter.irradiance;
        periods
            .get("ANN")
            .or_else(|| periods.get("annual"))
            .filter(|value| usable(value))
            .or_else(|| periods.values().find(|value| usable(value)))
            .copied()
    }
}
