//! Coordinate reference identifiers for grids and extents.
//!
//! The pipeline works in a projected, metre-based reference so that cell
//! sizes, areas, and distances are all linear measures. The reference is
//! carried explicitly rather than hardcoded so a grid built for one UTM
//! zone can be rebuilt for another without touching the core.
//!
//! # Examples
//! ```
//! use solgrid_core::Crs;
//!
//! let crs = Crs::new(32724);
//! let zone = crs.utm_zone().expect("EPSG:32724 is UTM 24S");
//! assert_eq!(zone.zone, 24);
//! ```

use std::fmt;

/// Hemisphere of a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    /// Northern hemisphere (EPSG 326xx).
    North,
    /// Southern hemisphere (EPSG 327xx).
    South,
}

/// A UTM zone decoded from an EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    /// Zone number, 1 through 60.
    pub zone: u8,
    /// Which hemisphere the zone covers.
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    /// Longitude of the zone's central meridian, in degrees.
    #[must_use]
    pub fn central_meridian_deg(&self) -> f64 {
        f64::from(self.zone) * 6.0 - 183.0
    }
}

/// A projected, metre-based coordinate reference identified by EPSG code.
///
/// The core does not validate the code against an EPSG registry; it only
/// requires that coordinates expressed in it are planar metres. The UTM
/// ranges (326xx north, 327xx south) are recognised so centroids can be
/// reprojected to WGS84 for external point lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// Wrap an EPSG code of a projected, metre-based reference.
    #[must_use]
    pub const fn new(epsg: u32) -> Self {
        Self { epsg }
    }

    /// The wrapped EPSG code.
    #[must_use]
    pub const fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Decode the UTM zone when the EPSG code is in the WGS84 UTM ranges.
    ///
    /// Returns `None` for any other projected reference; callers that need
    /// geographic coordinates must then supply their own transform.
    #[must_use]
    pub fn utm_zone(&self) -> Option<UtmZone> {
        let (base, hemisphere) = match self.epsg {
            32601..=32660 => (32600, Hemisphere::North),
            32701..=32760 => (32700, Hemisphere::South),
            _ => return None,
        };
        let zone = u8::try_from(self.epsg - base).ok()?;
        Some(UtmZone { zone, hemisphere })
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(32724, 24, Hemisphere::South)]
    #[case(32601, 1, Hemisphere::North)]
    #[case(32660, 60, Hemisphere::North)]
    fn decodes_utm_zones(#[case] epsg: u32, #[case] zone: u8, #[case] hemisphere: Hemisphere) {
        let decoded = Crs::new(epsg).utm_zone().unwrap();
        assert_eq!(decoded.zone, zone);
        assert_eq!(decoded.hemisphere, hemisphere);
    }

    #[rstest]
    #[case(4326)]
    #[case(3857)]
    #[case(32761)]
    fn rejects_non_utm_codes(#[case] epsg: u32) {
        assert!(Crs::new(epsg).utm_zone().is_none());
    }

    #[rstest]
    fn central_meridian_of_zone_24_is_minus_39() {
        let zone = Crs::new(32724).utm_zone().unwrap();
        assert!((zone.central_meridian_deg() - (-39.0)).abs() < f64::EPSILON);
    }

    #[rstest]
    fn displays_as_epsg_code() {
        assert_eq!(Crs::new(32724).to_string(), "EPSG:32724");
    }
}
