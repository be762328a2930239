//! Step-cadence estimator (running).
//!
//! Detects steps as magnetometer-magnitude peaks validated by a nearby
//! accelerometer or gyroscope peak, then reconciles a bounded per-window
//! step count with an inter-peak frequency estimate.

use contracts::{Effect, EffectId, MatchContext, MatchEvent, SourcePosition, TelemetrySample};
use tracing::{debug, instrument};

use crate::signal::{self, ExtremaConfig, FilterConfig};

/// Step-cadence estimator configuration.
#[derive(Debug, Clone)]
pub struct StepCadenceConfig {
    /// Wearable the estimator reads
    pub source: SourcePosition,

    /// Slot duration (s)
    pub slot_s: f64,

    /// Number of trailing slots analyzed per snapshot
    pub window_slots: usize,

    /// Cascaded filter parameters
    pub filter: FilterConfig,

    /// Peak shape bounds
    pub extrema: ExtremaConfig,

    /// Corroborating-peak tolerance (s)
    pub corroboration_s: f64,

    /// Step-count ceiling per window
    pub max_steps_per_window: u32,

    /// Frequency-estimate ceiling (steps/min)
    pub max_cadence_spm: f64,
}

impl Default for StepCadenceConfig {
    fn default() -> Self {
        Self {
            source: SourcePosition::LeftWrist,
            slot_s: 0.05,
            window_slots: 60,
            filter: FilterConfig::default(),
            extrema: ExtremaConfig::default(),
            corroboration_s: 0.2,
            max_steps_per_window: 12,
            max_cadence_spm: 240.0,
        }
    }
}

/// One per-window estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEstimate {
    /// Validated step count, capped per window
    pub step_count: u32,

    /// Reconciled cadence (steps/min)
    pub cadence_spm: f64,
}

impl StepEstimate {
    const ZERO: StepEstimate = StepEstimate {
        step_count: 0,
        cadence_spm: 0.0,
    };
}

/// Step-cadence estimator effect.
///
/// Writes the latest estimate into `MatchContext::step_cadence_spm` and
/// `step_count` on every snapshot.
pub struct StepCadenceEstimator {
    id: EffectId,
    config: StepCadenceConfig,
}

impl StepCadenceEstimator {
    pub fn new(config: StepCadenceConfig) -> Self {
        Self {
            id: EffectId::from("step_cadence"),
            config,
        }
    }

    /// Estimate step count and cadence over one slot prefix.
    pub fn estimate(&self, window: &[Option<TelemetrySample>]) -> StepEstimate {
        let Some(motion) = signal::fill_motion_gaps(window) else {
            return StepEstimate::ZERO;
        };
        let mag = signal::band_filter(&signal::mag_magnitudes(&motion), &self.config.filter);
        let accel = signal::band_filter(&signal::accel_magnitudes(&motion), &self.config.filter);
        let gyro = signal::band_filter(&signal::gyro_magnitudes(&motion), &self.config.filter);

        let mag_peaks = signal::local_maxima(&mag, &self.config.extrema);
        let accel_peaks = signal::local_maxima(&accel, &self.config.extrema);
        let gyro_peaks = signal::local_maxima(&gyro, &self.config.extrema);
        let tolerance_slots = self.config.corroboration_s / self.config.slot_s;

        let validated: Vec<usize> = mag_peaks
            .iter()
            .map(|p| p.index)
            .filter(|&idx| {
                let near = |other: &[signal::Extremum]| {
                    other
                        .iter()
                        .any(|o| (o.index as f64 - idx as f64).abs() <= tolerance_slots)
                };
                near(&accel_peaks) || near(&gyro_peaks)
            })
            .collect();

        if validated.is_empty() {
            return StepEstimate::ZERO;
        }

        let step_count = (validated.len() as u32).min(self.config.max_steps_per_window);
        let duration_s = window.len() as f64 * self.config.slot_s;
        let count_spm = if duration_s > 0.0 {
            step_count as f64 / duration_s * 60.0
        } else {
            0.0
        };

        let interval_spm = if validated.len() >= 2 {
            let span = (validated[validated.len() - 1] - validated[0]) as f64 * self.config.slot_s;
            let avg_interval = span / (validated.len() - 1) as f64;
            (60.0 / avg_interval).min(self.config.max_cadence_spm)
        } else {
            0.0
        };

        StepEstimate {
            step_count,
            cadence_spm: reconcile(count_spm, interval_spm),
        }
    }

    #[instrument(name = "step_estimate", skip(self, window), fields(slots = window.len()))]
    fn process_window(&self, window: &[Option<TelemetrySample>], ctx: &mut MatchContext) {
        let trailing = window.len().saturating_sub(self.config.window_slots);
        let estimate = self.estimate(&window[trailing..]);
        debug!(
            steps = estimate.step_count,
            cadence_spm = estimate.cadence_spm,
            "step cadence estimate"
        );
        metrics::histogram!("effect_step_cadence_spm").record(estimate.cadence_spm);
        ctx.step_cadence_spm = estimate.cadence_spm;
        ctx.step_count = estimate.step_count;
    }
}

/// Average the two estimates unless they disagree by more than 2x, in which
/// case the peak-count estimate is trusted alone.
fn reconcile(count_spm: f64, interval_spm: f64) -> f64 {
    if count_spm <= 0.0 {
        return interval_spm;
    }
    if interval_spm <= 0.0 {
        return count_spm;
    }
    let ratio = if count_spm > interval_spm {
        count_spm / interval_spm
    } else {
        interval_spm / count_spm
    };
    if ratio > 2.0 {
        count_spm
    } else {
        (count_spm + interval_spm) / 2.0
    }
}

impl Effect for StepCadenceEstimator {
    fn id(&self) -> EffectId {
        self.id.clone()
    }

    fn on_event(&mut self, event: &MatchEvent, ctx: &mut MatchContext) {
        if let MatchEvent::WindowReady(snapshot) = event {
            if let Some(window) = snapshot.window(self.config.source) {
                self.process_window(window, ctx);
            }
        }
    }
}
