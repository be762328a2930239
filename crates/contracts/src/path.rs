//! PathPoint / SportSample - recorded trajectory
//!
//! Appended roughly every 3 s during recording, immutable once appended.
//! The full ordered sequence is the artifact the validation scorer consumes.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Competition sport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Cycling,
    Running,
}

/// One recorded trajectory sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PathPoint {
    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,

    /// Ground speed (m/s)
    pub speed_mps: f64,

    /// Altitude (m)
    pub altitude_m: f64,

    /// Heart rate at the time of the sample (beats/min)
    pub heart_rate_bpm: f64,

    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl PathPoint {
    /// Geographic coordinate of this point.
    pub fn geo(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Sport-specific extension of a path point.
///
/// Parallel to the plain path: one per recorded point, carrying the cadence
/// estimates produced by the signal-processing effects at that time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SportSample {
    /// The underlying trajectory sample
    pub point: PathPoint,

    /// Pedal-stroke rate estimate (revolutions/min); cycling
    pub pedal_rpm: f64,

    /// Step cadence estimate (steps/min); running
    pub step_cadence_spm: f64,

    /// Estimated stroke/step count for the cycle ending at this point
    pub step_count: u32,
}
