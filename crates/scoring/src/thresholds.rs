//! Scorer thresholds.
//!
//! Both sports share the algorithm shape; only these numbers differ. They
//! are deliberately named constants rather than configuration: the scorer
//! must behave identically for every participant.

use contracts::Sport;

/// Per-sport speed and anomaly thresholds.
#[derive(Debug, Clone, Copy)]
pub struct SportThresholds {
    /// Average speed below which the path is trusted unconditionally (km/h)
    pub trust_below_kmh: f64,

    /// Average speed above which the path is rejected outright (km/h)
    pub reject_above_kmh: f64,

    /// Fixed-distance segment length for per-segment speed checks (m)
    pub segment_distance_m: f64,

    /// Per-segment speed counting as suspiciously fast (km/h)
    pub fast_segment_kmh: f64,

    /// Fast segments tolerated before penalties start
    pub fast_segment_budget: u32,

    /// Points deducted per fast segment beyond the budget
    pub fast_segment_penalty: f64,

    /// Adjacent-sample altitude jump counting as an anomaly (m)
    pub altitude_jump_m: f64,

    /// Points deducted per altitude anomaly
    pub altitude_anomaly_penalty: f64,

    /// Physically implausible adjacent-sample speed ceiling (m/s)
    pub implausible_speed_mps: f64,
}

/// Running thresholds: trusted below a brisk jog, rejected above sprint-pace
/// sustained over the whole match.
pub const RUNNING: SportThresholds = SportThresholds {
    trust_below_kmh: 16.0,
    reject_above_kmh: 30.0,
    segment_distance_m: 100.0,
    fast_segment_kmh: 25.0,
    fast_segment_budget: 3,
    fast_segment_penalty: 10.0,
    altitude_jump_m: 5.0,
    altitude_anomaly_penalty: 10.0,
    implausible_speed_mps: 12.0,
};

/// Cycling thresholds.
pub const CYCLING: SportThresholds = SportThresholds {
    trust_below_kmh: 28.0,
    reject_above_kmh: 60.0,
    segment_distance_m: 250.0,
    fast_segment_kmh: 55.0,
    fast_segment_budget: 3,
    fast_segment_penalty: 10.0,
    altitude_jump_m: 10.0,
    altitude_anomaly_penalty: 10.0,
    implausible_speed_mps: 25.0,
};

pub fn for_sport(sport: Sport) -> &'static SportThresholds {
    match sport {
        Sport::Running => &RUNNING,
        Sport::Cycling => &CYCLING,
    }
}

/// Points deducted per implausible adjacent-sample speed occurrence.
pub const IMPLAUSIBLE_SPEED_PENALTY: f64 = 5.0;

/// Pedal rate below which a cycling sample counts as "not pedaling" (rev/min).
pub const LOW_PEDAL_RPM: f64 = 20.0;

/// Net altitude gain marking a low-pedal run as an uphill (m).
pub const UPHILL_GAIN_M: f64 = 5.0;

/// A low-pedal uphill run is anomalous unless its average speed dropped
/// below this fraction of the whole-path average.
pub const UPHILL_SPEED_DROP_RATIO: f64 = 0.8;

/// Points deducted per sample in an anomalous low-pedal uphill run.
pub const UPHILL_PENALTY_PER_SAMPLE: f64 = 1.0;

/// Minimum samples for a cadence-consistency run to be considered.
pub const CADENCE_RUN_MIN_SAMPLES: usize = 3;

/// Net movement above which a zero-step run is anomalous (m).
pub const ZERO_STEP_MOVEMENT_M: f64 = 20.0;

/// Points deducted per anomalous zero-step run.
pub const ZERO_STEP_RUN_PENALTY: f64 = 10.0;

/// Sample-window size for implied step-length checks.
pub const STEP_LENGTH_WINDOW_SAMPLES: usize = 10;

/// Longest plausible implied step length (m).
pub const MAX_STEP_LENGTH_M: f64 = 2.0;

/// Points deducted per meter of implied step length beyond the maximum.
pub const STEP_LENGTH_PENALTY_PER_M: f64 = 5.0;
