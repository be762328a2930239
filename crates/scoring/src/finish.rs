//! Finish-time reconstruction.
//!
//! The geofence trigger that stops a match fires on a sampled position, so
//! its timestamp carries up to one sampling period of error. The crossing
//! time reported in the summary is instead reconstructed from the buffered
//! finish candidates (positions that came within 2x the finish radius).

use contracts::geo::{haversine_m, segment_circle_entry};
use contracts::{GeoZone, PathPoint};
use tracing::debug;

/// Reconstruct the finish-line crossing time (ms since epoch).
///
/// Tried in order:
/// 1. the first candidate strictly inside the finish radius;
/// 2. the first candidate segment intersecting the finish circle, with the
///    crossing time linearly interpolated along it;
/// 3. extrapolation from the last candidate's speed and remaining distance;
/// 4. `now_ms`.
pub fn reconstruct_finish_time(candidates: &[PathPoint], finish: &GeoZone, now_ms: i64) -> i64 {
    if let Some(inside) = candidates
        .iter()
        .find(|p| haversine_m(p.geo(), finish.center) < finish.radius_m)
    {
        debug!(timestamp_ms = inside.timestamp_ms, "finish: point inside radius");
        return inside.timestamp_ms;
    }

    for pair in candidates.windows(2) {
        if let Some(t) = segment_circle_entry(pair[0].geo(), pair[1].geo(), finish.center, finish.radius_m)
        {
            let span = (pair[1].timestamp_ms - pair[0].timestamp_ms) as f64;
            let crossing = pair[0].timestamp_ms + (span * t) as i64;
            debug!(timestamp_ms = crossing, t, "finish: segment interpolation");
            return crossing;
        }
    }

    if let Some(last) = candidates.last() {
        if last.speed_mps > 0.0 {
            let remaining_m = (haversine_m(last.geo(), finish.center) - finish.radius_m).max(0.0);
            let crossing = last.timestamp_ms + (remaining_m / last.speed_mps * 1_000.0) as i64;
            debug!(timestamp_ms = crossing, remaining_m, "finish: extrapolated");
            return crossing;
        }
    }

    debug!(timestamp_ms = now_ms, "finish: fallback to now");
    now_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::geo::GeoPoint;

    fn zone() -> GeoZone {
        GeoZone {
            center: GeoPoint {
                latitude: 48.0,
                longitude: 11.0,
            },
            radius_m: 100.0,
        }
    }

    fn candidate(latitude: f64, speed_mps: f64, timestamp_ms: i64) -> PathPoint {
        PathPoint {
            latitude,
            longitude: 11.0,
            speed_mps,
            altitude_m: 500.0,
            heart_rate_bpm: 150.0,
            timestamp_ms,
        }
    }

    #[test]
    fn point_inside_radius_wins() {
        // ~55 m from the center.
        let candidates = vec![
            candidate(48.003, 5.0, 1_000),
            candidate(48.0005, 5.0, 4_000),
        ];
        assert_eq!(reconstruct_finish_time(&candidates, &zone(), 99_000), 4_000);
    }

    #[test]
    fn segment_crossing_is_interpolated() {
        // From ~222 m north to ~222 m south, crossing the 100 m circle.
        let candidates = vec![
            candidate(48.002, 5.0, 0),
            candidate(47.998, 5.0, 8_000),
        ];
        let crossing = reconstruct_finish_time(&candidates, &zone(), 99_000);
        // Entry at roughly t = 0.27 of the segment.
        assert!((1_500..=3_000).contains(&crossing), "crossing = {crossing}");
    }

    #[test]
    fn extrapolates_from_last_candidate() {
        // Single candidate ~334 m out, moving at 10 m/s: ~23 s to the edge.
        let candidates = vec![candidate(48.003, 10.0, 10_000)];
        let crossing = reconstruct_finish_time(&candidates, &zone(), 99_000);
        assert!((30_000..=38_000).contains(&crossing), "crossing = {crossing}");
    }

    #[test]
    fn falls_back_to_now() {
        assert_eq!(reconstruct_finish_time(&[], &zone(), 77_000), 77_000);
        // Stationary candidate outside the circle cannot be extrapolated.
        let stalled = vec![candidate(48.003, 0.0, 10_000)];
        assert_eq!(reconstruct_finish_time(&stalled, &zone(), 77_000), 77_000);
    }
}
