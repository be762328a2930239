//! Shared signal-processing primitives for the cadence estimators.
//!
//! Operates on one source's slot prefix from a `WindowSnapshot`: gap-fills
//! missing slots, extracts per-axis magnitude series, filters them, and
//! detects shape-bounded local extrema.

use contracts::{MotionData, TelemetrySample, Vector3};

/// Cascaded one-pole filter parameters.
///
/// The high-pass stage removes sensor drift and gravity bias, the low-pass
/// stage smooths out jitter before extrema detection.
#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    /// High-pass coefficient, closer to 1.0 = lower cutoff
    pub high_pass_alpha: f64,

    /// Low-pass coefficient, closer to 1.0 = higher cutoff
    pub low_pass_alpha: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            high_pass_alpha: 0.9,
            low_pass_alpha: 0.3,
        }
    }
}

/// Shape bounds for a valid extremum.
///
/// Both flanks must be strictly monotonic for `min_flank..=max_flank`
/// samples, and the combined flank amplitude must reach `min_amplitude`.
/// At 20 Hz this admits periods roughly in the human-cadence range.
#[derive(Debug, Clone, Copy)]
pub struct ExtremaConfig {
    /// Minimum flank length (samples)
    pub min_flank: usize,

    /// Maximum flank length (samples)
    pub max_flank: usize,

    /// Minimum combined left+right flank amplitude
    pub min_amplitude: f64,
}

impl Default for ExtremaConfig {
    fn default() -> Self {
        Self {
            min_flank: 3,
            max_flank: 13,
            min_amplitude: 0.8,
        }
    }
}

/// One detected extremum with its flank amplitudes.
#[derive(Debug, Clone, Copy)]
pub struct Extremum {
    /// Slot index within the analyzed window
    pub index: usize,

    /// Amplitude of the flank leading into the extremum
    pub left_amplitude: f64,

    /// Amplitude of the flank leading out of the extremum
    pub right_amplitude: f64,
}

/// Gap-fill a slot prefix into a dense motion series.
///
/// Missing slots (or samples without motion data) are linearly interpolated
/// between the nearest valid neighbors; slots before the first or after the
/// last valid sample take that single neighbor. Returns `None` when the
/// window holds no motion data at all.
pub fn fill_motion_gaps(window: &[Option<TelemetrySample>]) -> Option<Vec<MotionData>> {
    let valid: Vec<(usize, MotionData)> = window
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.as_ref().and_then(|s| s.motion).map(|m| (i, m)))
        .collect();
    if valid.is_empty() {
        return None;
    }

    let mut filled = Vec::with_capacity(window.len());
    let mut cursor = 0; // index into `valid` of the first entry at or after i
    for i in 0..window.len() {
        while cursor < valid.len() && valid[cursor].0 < i {
            cursor += 1;
        }
        let after = valid.get(cursor);
        let before = if cursor > 0 { Some(&valid[cursor - 1]) } else { None };

        let motion = match (before, after) {
            (_, Some(&(j, m))) if j == i => m,
            (Some(&(p, a)), Some(&(n, b))) => {
                let t = (i - p) as f64 / (n - p) as f64;
                MotionData::lerp(&a, &b, t)
            }
            (Some(&(_, a)), None) => a,
            (None, Some(&(_, b))) => b,
            (None, None) => unreachable!("valid is non-empty"),
        };
        filled.push(motion);
    }
    Some(filled)
}

/// Accelerometer magnitude series.
pub fn accel_magnitudes(motion: &[MotionData]) -> Vec<f64> {
    magnitudes(motion, |m| m.accel)
}

/// Gyroscope magnitude series.
pub fn gyro_magnitudes(motion: &[MotionData]) -> Vec<f64> {
    magnitudes(motion, |m| m.gyro)
}

/// Magnetometer magnitude series.
pub fn mag_magnitudes(motion: &[MotionData]) -> Vec<f64> {
    magnitudes(motion, |m| m.mag)
}

fn magnitudes(motion: &[MotionData], axis: impl Fn(&MotionData) -> Vector3) -> Vec<f64> {
    motion.iter().map(|m| axis(m).magnitude()).collect()
}

/// One-pole high-pass filter.
pub fn high_pass(signal: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(signal.len());
    let mut prev_in = 0.0;
    let mut prev_out = 0.0;
    for (i, &x) in signal.iter().enumerate() {
        let y = if i == 0 {
            0.0
        } else {
            alpha * (prev_out + x - prev_in)
        };
        out.push(y);
        prev_in = x;
        prev_out = y;
    }
    out
}

/// One-pole low-pass filter.
pub fn low_pass(signal: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(signal.len());
    let mut prev = match signal.first() {
        Some(&x) => x,
        None => return out,
    };
    for (i, &x) in signal.iter().enumerate() {
        let y = if i == 0 { x } else { prev + alpha * (x - prev) };
        out.push(y);
        prev = y;
    }
    out
}

/// Cascaded high-pass then low-pass.
pub fn band_filter(signal: &[f64], config: &FilterConfig) -> Vec<f64> {
    low_pass(&high_pass(signal, config.high_pass_alpha), config.low_pass_alpha)
}

/// Detect shape-bounded local minima.
pub fn local_minima(signal: &[f64], config: &ExtremaConfig) -> Vec<Extremum> {
    let flank_ok = |len: usize| (config.min_flank..=config.max_flank).contains(&len);
    let mut out = Vec::new();
    for i in 0..signal.len() {
        let (left_len, left_amplitude) = left_flank(signal, i);
        if !flank_ok(left_len) {
            continue;
        }
        let (right_len, right_amplitude) = right_flank(signal, i);
        if !flank_ok(right_len) {
            continue;
        }
        if left_amplitude + right_amplitude < config.min_amplitude {
            continue;
        }
        out.push(Extremum {
            index: i,
            left_amplitude,
            right_amplitude,
        });
    }
    out
}

/// Detect shape-bounded local maxima.
pub fn local_maxima(signal: &[f64], config: &ExtremaConfig) -> Vec<Extremum> {
    let negated: Vec<f64> = signal.iter().map(|&x| -x).collect();
    local_minima(&negated, config)
}

/// Strictly descending run ending at `i`.
fn left_flank(signal: &[f64], i: usize) -> (usize, f64) {
    let mut j = i;
    while j > 0 && signal[j - 1] > signal[j] {
        j -= 1;
    }
    (i - j, signal[j] - signal[i])
}

/// Strictly ascending run starting at `i`.
fn right_flank(signal: &[f64], i: usize) -> (usize, f64) {
    let mut k = i;
    while k + 1 < signal.len() && signal[k + 1] > signal[k] {
        k += 1;
    }
    (k - i, signal[k] - signal[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourcePosition;

    fn motion_with_accel(x: f64) -> MotionData {
        MotionData {
            accel: Vector3::new(x, 0.0, 0.0),
            ..Default::default()
        }
    }

    fn slot(i: i64, x: f64) -> Option<TelemetrySample> {
        Some(TelemetrySample::motion(
            SourcePosition::LeftWrist,
            i * 50,
            motion_with_accel(x),
        ))
    }

    #[test]
    fn gap_fill_interpolates_between_neighbors() {
        let window = vec![slot(0, 0.0), None, None, None, slot(4, 4.0)];
        let filled = fill_motion_gaps(&window).unwrap();
        assert_eq!(filled.len(), 5);
        assert!((filled[1].accel.x - 1.0).abs() < 1e-12);
        assert!((filled[3].accel.x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn gap_fill_single_sided_takes_neighbor() {
        let window = vec![None, None, slot(2, 7.0), None];
        let filled = fill_motion_gaps(&window).unwrap();
        assert!((filled[0].accel.x - 7.0).abs() < 1e-12);
        assert!((filled[3].accel.x - 7.0).abs() < 1e-12);
    }

    #[test]
    fn gap_fill_empty_window_is_none() {
        let window: Vec<Option<TelemetrySample>> = vec![None; 60];
        assert!(fill_motion_gaps(&window).is_none());
    }

    #[test]
    fn high_pass_removes_constant_offset() {
        let signal = vec![9.81; 40];
        let filtered = high_pass(&signal, 0.9);
        assert!(filtered.iter().all(|&y| y.abs() < 1e-9));
    }

    #[test]
    fn low_pass_converges_to_step_level() {
        let mut signal = vec![0.0; 5];
        signal.extend(vec![1.0; 40]);
        let filtered = low_pass(&signal, 0.3);
        assert!((filtered.last().unwrap() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn minima_found_on_sine() {
        // 1.25 Hz sine at 20 Hz: period 16 slots, minima at 12, 28, 44
        let signal: Vec<f64> = (0..60)
            .map(|i| (2.0 * std::f64::consts::PI * 1.25 * i as f64 * 0.05).sin())
            .collect();
        let minima = local_minima(
            &signal,
            &ExtremaConfig {
                min_amplitude: 1.0,
                ..Default::default()
            },
        );
        let indices: Vec<usize> = minima.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![12, 28, 44]);
    }

    #[test]
    fn minima_rejects_small_amplitude() {
        let signal: Vec<f64> = (0..60)
            .map(|i| 0.01 * (2.0 * std::f64::consts::PI * 1.25 * i as f64 * 0.05).sin())
            .collect();
        let minima = local_minima(
            &signal,
            &ExtremaConfig {
                min_amplitude: 1.0,
                ..Default::default()
            },
        );
        assert!(minima.is_empty());
    }

    #[test]
    fn flat_signal_has_no_extrema() {
        let signal = vec![5.0; 60];
        assert!(local_minima(&signal, &ExtremaConfig::default()).is_empty());
        assert!(local_maxima(&signal, &ExtremaConfig::default()).is_empty());
    }

    #[test]
    fn maxima_mirror_minima() {
        let signal: Vec<f64> = (0..60)
            .map(|i| (2.0 * std::f64::consts::PI * 1.25 * i as f64 * 0.05).sin())
            .collect();
        let maxima = local_maxima(
            &signal,
            &ExtremaConfig {
                min_amplitude: 1.0,
                ..Default::default()
            },
        );
        let indices: Vec<usize> = maxima.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![4, 20, 36, 52]);
    }
}
