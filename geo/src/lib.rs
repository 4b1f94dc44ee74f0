//! Proximity verification.
//!
//! Haversine great-circle distance on a spherical Earth. Distances are rounded
//! to the nearest meter before any comparison so that the server and client
//! agree on the boundary case and no sub-meter precision is exposed.

use vouch_types::Coordinates;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default proximity gate radius in meters.
pub const DEFAULT_RADIUS_M: u64 = 50;

/// Great-circle distance in meters between two points given in decimal degrees.
///
/// Symmetric in its arguments and zero for identical points. Angular deltas
/// are taken as absolute values so that swapping the points yields the same
/// bit pattern.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).abs().to_radians();
    let d_lambda = (lon2 - lon1).abs().to_radians();

    let sin_dphi = (d_phi / 2.0).sin();
    let sin_dlambda = (d_lambda / 2.0).sin();
    let a = sin_dphi * sin_dphi + phi1.cos() * phi2.cos() * sin_dlambda * sin_dlambda;
    let c = 2.0 * a.sqrt().min(1.0).asin();
    (EARTH_RADIUS_M * c).max(0.0)
}

/// [`distance_meters`] rounded to the nearest whole meter.
pub fn rounded_distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> u64 {
    distance_meters(lat1, lon1, lat2, lon2).round() as u64
}

/// Whether the rounded distance is within `radius_m` (inclusive).
pub fn is_within_range(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius_m: u64) -> bool {
    rounded_distance_meters(lat1, lon1, lat2, lon2) <= radius_m
}

/// Outcome of checking a device position against a place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProximityCheck {
    /// Rounded distance in meters.
    pub distance_m: u64,
    /// Radius the distance was compared against.
    pub radius_m: u64,
}

impl ProximityCheck {
    pub fn between(device: Coordinates, place: Coordinates, radius_m: u64) -> Self {
        let distance_m = rounded_distance_meters(
            device.latitude,
            device.longitude,
            place.latitude,
            place.longitude,
        );
        Self {
            distance_m,
            radius_m,
        }
    }

    pub fn in_range(&self) -> bool {
        self.distance_m <= self.radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Meters per degree of latitude on this sphere.
    const M_PER_DEG_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_meters(37.5755766, 127.0215101, 37.5755766, 127.0215101), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        assert!((d - M_PER_DEG_LAT).abs() < 1e-6, "got {d}");
        assert_eq!(rounded_distance_meters(0.0, 0.0, 1.0, 0.0), 111_195);
    }

    #[test]
    fn seoul_blocks_apart() {
        // Two cafes in Jongno-gu, about 2.85 km apart.
        let d = rounded_distance_meters(37.5755766, 127.0215101, 37.5739727, 126.989275);
        assert!((2_800..2_900).contains(&d), "got {d}");
    }

    #[test]
    fn boundary_is_inclusive_after_rounding() {
        let fifty = 50.0 / M_PER_DEG_LAT;
        let fifty_point_four = 50.4 / M_PER_DEG_LAT;
        let fifty_one = 51.0 / M_PER_DEG_LAT;
        assert!(is_within_range(0.0, 0.0, fifty, 0.0, 50));
        assert!(is_within_range(0.0, 0.0, fifty_point_four, 0.0, 50));
        assert!(!is_within_range(0.0, 0.0, fifty_one, 0.0, 50));
    }

    #[test]
    fn proximity_check_reports_distance() {
        let place = Coordinates::new(0.0, 0.0).unwrap();
        let device = Coordinates::new(51.0 / M_PER_DEG_LAT, 0.0).unwrap();
        let check = ProximityCheck::between(device, place, DEFAULT_RADIUS_M);
        assert_eq!(check.distance_m, 51);
        assert!(!check.in_range());
    }

    #[test]
    fn antipodes_do_not_overflow() {
        let d = distance_meters(0.0, 0.0, 0.0, 180.0);
        assert!((d - EARTH_RADIUS_M * std::f64::consts::PI).abs() < 1e-3);
    }
}
