//! Start/end geofence tracking.
//!
//! While idle, positions are only compared against the start zone to set the
//! "in valid area" flag. While recording, positions near the finish zone are
//! buffered as candidates (2x radius) and positions inside it (1x radius)
//! end the match; the buffered candidates feed the post-hoc finish-time
//! reconstruction.

use contracts::geo::{haversine_m, GeoPoint};
use contracts::{GeofenceConfig, PathPoint};
use tracing::debug;

/// Verdict for one recorded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceVerdict {
    /// Nowhere near the finish zone
    Clear,

    /// Within 2x the finish radius; buffered as a finish candidate
    FinishCandidate,

    /// Inside the finish radius; the match must stop
    Finish,
}

/// Geofence state for one match.
#[derive(Debug)]
pub struct GeofenceTracker {
    config: GeofenceConfig,
    in_start_area: bool,
    candidates: Vec<PathPoint>,
}

impl GeofenceTracker {
    pub fn new(config: GeofenceConfig) -> Self {
        Self {
            config,
            in_start_area: false,
            candidates: Vec::new(),
        }
    }

    /// Compare an idle-state position against the start zone. No side
    /// effects beyond the flag.
    pub fn observe_idle(&mut self, position: GeoPoint) {
        let distance = haversine_m(position, self.config.start.center);
        self.in_start_area = distance <= self.config.start.radius_m;
    }

    /// Compare a recording-state position against the finish zone.
    pub fn observe_recording(&mut self, point: PathPoint) -> GeofenceVerdict {
        let distance = haversine_m(point.geo(), self.config.end.center);
        if distance <= self.config.end.radius_m * 2.0 {
            debug!(distance_m = distance, "finish candidate buffered");
            self.candidates.push(point);
            if distance <= self.config.end.radius_m {
                return GeofenceVerdict::Finish;
            }
            return GeofenceVerdict::FinishCandidate;
        }
        GeofenceVerdict::Clear
    }

    /// Whether the last idle-state position was inside the start zone.
    pub fn in_start_area(&self) -> bool {
        self.in_start_area
    }

    /// Buffered finish candidates, in arrival order.
    pub fn candidates(&self) -> &[PathPoint] {
        &self.candidates
    }

    /// Forget per-match state, keeping the configuration.
    pub fn reset(&mut self) {
        self.in_start_area = false;
        self.candidates.clear();
    }
}
