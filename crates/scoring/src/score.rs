//! Legitimacy scorer.
//!
//! Assigns a 0-100 score to a completed match's recorded path with
//! independent heuristic checks, each deducting from a starting score of
//! 100. The checks are ordered from cheapest to most specific; rule 1
//! short-circuits both ways so pathological paths never reach the
//! per-segment work.

use contracts::geo::haversine_m;
use contracts::{PathPoint, ScoringConfig, Sport, SportSample};
use tracing::{debug, instrument};

use crate::thresholds::{self, SportThresholds};

/// No path, too short, or zero elapsed time.
pub const COULD_NOT_EVALUATE: f64 = -1.0;

/// The path never entered the finish-candidate buffer.
pub const DID_NOT_FINISH: f64 = -2.0;

/// Score a completed match path.
///
/// `reached_finish` reflects whether the finish-candidate buffer ever
/// received a point (2x finish radius); a path that never got there cannot
/// be scored and returns `DID_NOT_FINISH`.
#[instrument(name = "validation_score", skip(path, samples), fields(points = path.len()))]
pub fn score(
    sport: Sport,
    path: &[PathPoint],
    samples: &[SportSample],
    reached_finish: bool,
) -> f64 {
    if path.len() < 2 {
        return COULD_NOT_EVALUATE;
    }
    if !reached_finish {
        return DID_NOT_FINISH;
    }

    let elapsed_s = (path[path.len() - 1].timestamp_ms - path[0].timestamp_ms) as f64 / 1_000.0;
    if elapsed_s <= 0.0 {
        return COULD_NOT_EVALUATE;
    }

    let t = thresholds::for_sport(sport);
    let total_distance_m: f64 = path
        .windows(2)
        .map(|pair| haversine_m(pair[0].geo(), pair[1].geo()))
        .sum();
    let avg_kmh = total_distance_m / elapsed_s * 3.6;

    // Rule 1: slow activity is not worth deep scrutiny, absurd pace is
    // rejected outright.
    if avg_kmh < t.trust_below_kmh {
        debug!(avg_kmh, "below trust threshold");
        return 100.0;
    }
    if avg_kmh > t.reject_above_kmh {
        debug!(avg_kmh, "above reject threshold");
        return 0.0;
    }

    let avg_speed_mps = total_distance_m / elapsed_s;
    let mut total = 100.0;
    total -= fast_segment_penalty(path, t);
    total -= altitude_penalty(path, t);
    total -= match sport {
        Sport::Cycling => pedal_consistency_penalty(samples, avg_speed_mps),
        Sport::Running => zero_step_penalty(samples) + step_length_penalty(samples),
    };
    total -= implausible_speed_penalty(path, t);

    let result = total.max(0.0);
    debug!(result, avg_kmh, "score computed");
    result
}

/// Score with the debug override applied.
///
/// The real computation always runs; under `debug_force_pass` its result is
/// discarded in favor of the configured passing value.
pub fn score_with_config(
    sport: Sport,
    path: &[PathPoint],
    samples: &[SportSample],
    reached_finish: bool,
    config: &ScoringConfig,
) -> f64 {
    let computed = score(sport, path, samples, reached_finish);
    metrics::histogram!("validation_score").record(computed);
    if config.debug_force_pass {
        debug!(computed, forced = config.forced_score, "score forced");
        return config.forced_score;
    }
    computed
}

/// Rule 2: fixed-distance segments, cumulative fast-segment points beyond a
/// budget.
fn fast_segment_penalty(path: &[PathPoint], t: &SportThresholds) -> f64 {
    let mut fast_segments = 0u32;
    let mut segment_distance = 0.0;
    let mut segment_start_ms = path[0].timestamp_ms;

    for pair in path.windows(2) {
        segment_distance += haversine_m(pair[0].geo(), pair[1].geo());
        if segment_distance < t.segment_distance_m {
            continue;
        }
        let segment_s = (pair[1].timestamp_ms - segment_start_ms) as f64 / 1_000.0;
        if segment_s > 0.0 && segment_distance / segment_s * 3.6 > t.fast_segment_kmh {
            fast_segments += 1;
        }
        segment_distance = 0.0;
        segment_start_ms = pair[1].timestamp_ms;
    }

    fast_segments.saturating_sub(t.fast_segment_budget) as f64 * t.fast_segment_penalty
}

/// Rule 3: adjacent-sample altitude jumps.
fn altitude_penalty(path: &[PathPoint], t: &SportThresholds) -> f64 {
    let anomalies = path
        .windows(2)
        .filter(|pair| (pair[1].altitude_m - pair[0].altitude_m).abs() > t.altitude_jump_m)
        .count();
    anomalies as f64 * t.altitude_anomaly_penalty
}

/// Rule 4 (cycling): low-pedal runs on an uphill without a compensating
/// speed drop.
fn pedal_consistency_penalty(samples: &[SportSample], avg_speed_mps: f64) -> f64 {
    let mut penalty = 0.0;
    for run in runs(samples, |s| s.pedal_rpm < thresholds::LOW_PEDAL_RPM) {
        if run.len() < thresholds::CADENCE_RUN_MIN_SAMPLES {
            continue;
        }
        let gain = run[run.len() - 1].point.altitude_m - run[0].point.altitude_m;
        if gain <= thresholds::UPHILL_GAIN_M {
            continue;
        }
        let run_avg_speed =
            run.iter().map(|s| s.point.speed_mps).sum::<f64>() / run.len() as f64;
        if run_avg_speed >= avg_speed_mps * thresholds::UPHILL_SPEED_DROP_RATIO {
            // Coasting uphill at full speed without pedaling.
            penalty += run.len() as f64 * thresholds::UPHILL_PENALTY_PER_SAMPLE;
        }
    }
    penalty
}

/// Rule 4 (running, part 1): zero-step runs with real movement.
fn zero_step_penalty(samples: &[SportSample]) -> f64 {
    let mut penalty = 0.0;
    for run in runs(samples, |s| s.step_count == 0) {
        if run.len() < 2 {
            continue;
        }
        let moved = haversine_m(run[0].point.geo(), run[run.len() - 1].point.geo());
        if moved > thresholds::ZERO_STEP_MOVEMENT_M {
            penalty += thresholds::ZERO_STEP_RUN_PENALTY;
        }
    }
    penalty
}

/// Rule 4 (running, part 2): implied step length per fixed-size sample
/// window.
fn step_length_penalty(samples: &[SportSample]) -> f64 {
    let mut penalty = 0.0;
    for window in samples.chunks(thresholds::STEP_LENGTH_WINDOW_SAMPLES) {
        if window.len() < 2 {
            continue;
        }
        let distance: f64 = window
            .windows(2)
            .map(|pair| haversine_m(pair[0].point.geo(), pair[1].point.geo()))
            .sum();
        let steps: u32 = window.iter().map(|s| s.step_count).sum();
        if steps == 0 {
            continue; // covered by the zero-step check
        }
        let step_length = distance / steps as f64;
        if step_length > thresholds::MAX_STEP_LENGTH_M {
            penalty +=
                (step_length - thresholds::MAX_STEP_LENGTH_M) * thresholds::STEP_LENGTH_PENALTY_PER_M;
        }
    }
    penalty
}

/// Rule 5: adjacent-sample speed implied by raw distance/time.
fn implausible_speed_penalty(path: &[PathPoint], t: &SportThresholds) -> f64 {
    let occurrences = path
        .windows(2)
        .filter(|pair| {
            let dt_s = (pair[1].timestamp_ms - pair[0].timestamp_ms) as f64 / 1_000.0;
            if dt_s <= 0.0 {
                return false;
            }
            haversine_m(pair[0].geo(), pair[1].geo()) / dt_s > t.implausible_speed_mps
        })
        .count();
    occurrences as f64 * thresholds::IMPLAUSIBLE_SPEED_PENALTY
}

/// Maximal runs of consecutive samples matching the predicate.
fn runs<'a>(
    samples: &'a [SportSample],
    predicate: impl Fn(&SportSample) -> bool + 'a,
) -> impl Iterator<Item = &'a [SportSample]> {
    let mut index = 0;
    std::iter::from_fn(move || {
        while index < samples.len() && !predicate(&samples[index]) {
            index += 1;
        }
        if index >= samples.len() {
            return None;
        }
        let start = index;
        while index < samples.len() && predicate(&samples[index]) {
            index += 1;
        }
        Some(&samples[start..index])
    })
}
