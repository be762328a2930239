//! Geographic helpers shared by lifecycle and scoring.
//!
//! Distances use the haversine formula; the segment/circle intersection used
//! for finish-time reconstruction works on a local equirectangular projection
//! around the circle center, which is accurate at geofence scales.

use serde::{Deserialize, Serialize};

/// Mean Earth radius (m).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,
}

/// Great-circle distance between two points (m).
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Project a point into meters relative to `origin` (equirectangular).
fn project_m(point: GeoPoint, origin: GeoPoint) -> (f64, f64) {
    let x = (point.longitude - origin.longitude).to_radians()
        * origin.latitude.to_radians().cos()
        * EARTH_RADIUS_M;
    let y = (point.latitude - origin.latitude).to_radians() * EARTH_RADIUS_M;
    (x, y)
}

/// First parameter `t` in [0, 1] where the segment `a -> b` enters the circle
/// of `radius_m` around `center`, or `None` if the segment never touches it.
///
/// A segment starting inside the circle returns `Some(0.0)`.
pub fn segment_circle_entry(a: GeoPoint, b: GeoPoint, center: GeoPoint, radius_m: f64) -> Option<f64> {
    let (ax, ay) = project_m(a, center);
    let (bx, by) = project_m(b, center);

    if (ax * ax + ay * ay).sqrt() <= radius_m {
        return Some(0.0);
    }

    let dx = bx - ax;
    let dy = by - ay;
    let a_coef = dx * dx + dy * dy;
    if a_coef == 0.0 {
        return None;
    }
    let b_coef = 2.0 * (ax * dx + ay * dy);
    let c_coef = ax * ax + ay * ay - radius_m * radius_m;

    let disc = b_coef * b_coef - 4.0 * a_coef * c_coef;
    if disc < 0.0 {
        return None;
    }

    let sqrt_disc = disc.sqrt();
    let t1 = (-b_coef - sqrt_disc) / (2.0 * a_coef);
    let t2 = (-b_coef + sqrt_disc) / (2.0 * a_coef);

    // Smallest root inside the segment is the entry point.
    for t in [t1, t2] {
        if (0.0..=1.0).contains(&t) {
            return Some(t);
        }
    }
    None
}
