//! Geographic coordinates and great-circle distance.

use std::fmt;

use serde::Serialize;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Error returned when constructing an invalid coordinate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({lat}, {lon}): {reason}")]
pub struct InvalidPoint {
    lat: f64,
    lon: f64,
    reason: &'static str,
}

/// A geographic coordinate in decimal degrees.
///
/// Guaranteed finite with latitude in [-90, 90] and longitude in [-180, 180].
#[derive(Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    lat: f64,
    lon: f64,
}

impl Point {
    /// Construct a coordinate, validating its bounds.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidPoint> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(InvalidPoint {
                lat,
                lon,
                reason: "must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidPoint {
                lat,
                lon,
                reason: "latitude out of range",
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidPoint {
                lat,
                lon,
                reason: "longitude out of range",
            });
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in decimal degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {})", self.lat, self.lon)
    }
}

/// Great-circle distance between two coordinates in meters.
pub fn haversine_meters(a: Point, b: Point) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn reject_out_of_range() {
        assert!(Point::new(91.0, 0.0).is_err());
        assert!(Point::new(-91.0, 0.0).is_err());
        assert!(Point::new(0.0, 181.0).is_err());
        assert!(Point::new(0.0, -181.0).is_err());
    }

    #[test]
    fn reject_non_finite() {
        assert!(Point::new(f64::NAN, 0.0).is_err());
        assert!(Point::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn zero_distance_to_self() {
        let p = point(51.5074, -0.1278);
        assert_eq!(haversine_meters(p, p), 0.0);
    }

    #[test]
    fn known_distance() {
        // London (Charing Cross) to Paris (Notre-Dame): roughly 343 km.
        let london = point(51.5074, -0.1278);
        let paris = point(48.8530, 2.3499);
        let d = haversine_meters(london, paris);
        assert!((d - 343_000.0).abs() < 2_000.0, "got {d}");
    }

    #[test]
    fn short_distance() {
        // Two points ~111 m apart along a meridian (0.001 degree latitude).
        let a = point(40.0, -3.0);
        let b = point(40.001, -3.0);
        let d = haversine_meters(a, b);
        assert!((d - 111.0).abs() < 1.0, "got {d}");
    }
}
