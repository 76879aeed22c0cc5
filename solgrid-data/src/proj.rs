//! Inverse transverse Mercator projection for UTM grid coordinates.
//!
//! Converts UTM eastings and northings on the WGS84 ellipsoid back to
//! geodetic longitude and latitude. Irradiance services take geographic
//! coordinates, while the grid lives in a projected UTM system, so cell
//! centroids pass through this conversion before a lookup.
//!
//! Uses the standard series expansion (Snyder, "Map Projections: A
//! Working Manual", USGS PP 1395, eqs. 8-17..8-25). Accuracy is well
//! under a metre across a UTM zone, far finer than a grid cell.

use geo::Coord;
use solgrid_core::{Hemisphere, UtmZone};

/// WGS84 semi-major axis in metres.
const SEMI_MAJOR_AXIS_M: f64 = 6_378_137.0;
/// WGS84 flattening.
const FLATTENING: f64 = 1.0 / 298.257_223_563;
/// UTM central scale factor.
const SCALE_FACTOR: f64 = 0.9996;
/// UTM false easting in metres.
const FALSE_EASTING_M: f64 = 500_000.0;
/// UTM false northing for the southern hemisphere in metres.
const FALSE_NORTHING_SOUTH_M: f64 = 10_000_000.0;

/// Convert a projected UTM coordinate to WGS84 `(longitude, latitude)` in
/// degrees.
#[must_use]
pub fn utm_to_wgs84(position: Coord<f64>, zone: UtmZone) -> (f64, f64) {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let ep2 = e2 / (1.0 - e2);

    let x = position.x - FALSE_EASTING_M;
    let y = match zone.hemisphere {
        Hemisphere::North => position.y,
        Hemisphere::South => position.y - FALSE_NORTHING_SOUTH_M,
    };

    // Footpoint latitude from the meridian arc distance.
    let m = y / SCALE_FACTOR;
    let mu = m
        / (SEMI_MAJOR_AXIS_M
            * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let n1 = SEMI_MAJOR_AXIS_M / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = SEMI_MAJOR_AXIS_M * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * SCALE_FACTOR);

    let lat_rad = phi1
        - (n1 * tan_phi1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * ep2
                    - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lon_rad = zone.central_meridian_deg().to_radians()
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    (lon_rad.to_degrees(), lat_rad.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn zone_24_south() -> UtmZone {
        UtmZone {
            zone: 24,
            hemisphere: Hemisphere::South,
        }
    }

    #[rstest]
    fn equator_on_central_meridian_is_exact() {
        let (lon, lat) = utm_to_wgs84(
            Coord {
                x: 500_000.0,
                y: 10_000_000.0,
            },
            zone_24_south(),
        );
        assert!((lon - (-39.0)).abs() < 1e-9, "lon {lon}");
        assert!(lat.abs() < 1e-9, "lat {lat}");
    }

    #[rstest]
    fn points_on_the_central_meridian_keep_its_longitude() {
        let (lon, lat) = utm_to_wgs84(
            Coord {
                x: 500_000.0,
                y: 8_900_000.0,
            },
            zone_24_south(),
        );
        assert!((lon - (-39.0)).abs() < 1e-9, "lon {lon}");
        // 1 100 km south of the equator is close to 10 degrees south.
        assert!(lat > -10.2 && lat < -9.7, "lat {lat}");
    }

    #[rstest]
    fn easting_moves_longitude_eastward() {
        let zone = zone_24_south();
        let (west, _) = utm_to_wgs84(
            Coord {
                x: 400_000.0,
                y: 9_000_000.0,
            },
            zone,
        );
        let (east, _) = utm_to_wgs84(
            Coord {
                x: 600_000.0,
                y: 9_000_000.0,
            },
            zone,
        );
        assert!(west < -39.0 && east > -39.0, "west {west}, east {east}");
        // The offsets are nearly symmetric around the central meridian.
        assert!(((east + 39.0) - (-39.0 - west)).abs() < 1e-3);
    }

    #[rstest]
    fn northern_zones_take_unshifted_northings() {
        let zone = UtmZone {
            zone: 31,
            hemisphere: Hemisphere::North,
        };
        let (lon, lat) = utm_to_wgs84(
            Coord {
                x: 500_000.0,
                y: 0.0,
            },
            zone,
        );
        assert!((lon - 3.0).abs() < 1e-9, "lon {lon}");
        assert!(lat.abs() < 1e-9, "lat {lat}");
    }
}
