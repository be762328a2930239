//! Pedal-stroke estimator (cycling).
//!
//! Detects pedaling cycles as shape-bounded local minima in the filtered
//! accelerometer magnitude of an ankle wearable, corroborated by the
//! gyroscope, and converts the average inter-minima period to a stroke rate.

use contracts::{Effect, EffectId, MatchContext, MatchEvent, SourcePosition, TelemetrySample};
use tracing::{debug, instrument};

use crate::signal::{self, ExtremaConfig, FilterConfig};

/// Pedal-stroke estimator configuration.
#[derive(Debug, Clone)]
pub struct PedalStrokeConfig {
    /// Wearable the estimator reads (an ankle position)
    pub source: SourcePosition,

    /// Slot duration (s)
    pub slot_s: f64,

    /// Number of trailing slots analyzed per snapshot
    pub window_slots: usize,

    /// Cascaded filter parameters
    pub filter: FilterConfig,

    /// Minima shape bounds
    pub extrema: ExtremaConfig,

    /// Shortest plausible stroke period (s)
    pub min_period_s: f64,

    /// Longest plausible stroke period (s)
    pub max_period_s: f64,

    /// Gyroscope corroboration tolerance around the pair midpoint (s)
    pub corroboration_s: f64,

    /// A pair qualifies only while the first minimum's left-flank amplitude
    /// stays below the next one's times this ratio; rejects decaying
    /// artifacts without disqualifying steady pedaling
    pub left_rise_ratio: f64,
}

impl Default for PedalStrokeConfig {
    fn default() -> Self {
        Self {
            source: SourcePosition::LeftAnkle,
            slot_s: 0.05,
            window_slots: 60,
            filter: FilterConfig::default(),
            extrema: ExtremaConfig::default(),
            min_period_s: 0.4,
            max_period_s: 2.0,
            corroboration_s: 0.2,
            left_rise_ratio: 1.25,
        }
    }
}

/// Pedal-stroke rate estimator effect.
///
/// Writes the latest estimate into `MatchContext::pedal_rpm` on every
/// snapshot; a window without qualifying pairs yields 0.
pub struct PedalStrokeEstimator {
    id: EffectId,
    config: PedalStrokeConfig,
}

impl PedalStrokeEstimator {
    pub fn new(config: PedalStrokeConfig) -> Self {
        Self {
            id: EffectId::from("pedal_stroke"),
            config,
        }
    }

    /// Estimate the stroke rate (rev/min) over one slot prefix.
    ///
    /// Returns 0 when the window holds no motion data or fewer than 2
    /// qualifying minima pairs are found.
    pub fn estimate(&self, window: &[Option<TelemetrySample>]) -> f64 {
        let Some(motion) = signal::fill_motion_gaps(window) else {
            return 0.0;
        };
        let accel = signal::band_filter(&signal::accel_magnitudes(&motion), &self.config.filter);
        let gyro = signal::band_filter(&signal::gyro_magnitudes(&motion), &self.config.filter);

        let accel_minima = signal::local_minima(&accel, &self.config.extrema);
        let gyro_minima = signal::local_minima(&gyro, &self.config.extrema);
        let tolerance_slots = self.config.corroboration_s / self.config.slot_s;

        let mut periods = Vec::new();
        for pair in accel_minima.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            let period = (second.index - first.index) as f64 * self.config.slot_s;
            if period < self.config.min_period_s || period > self.config.max_period_s {
                continue;
            }
            if first.left_amplitude >= second.left_amplitude * self.config.left_rise_ratio {
                continue;
            }
            let midpoint = (first.index + second.index) as f64 / 2.0;
            let corroborated = gyro_minima
                .iter()
                .any(|g| (g.index as f64 - midpoint).abs() <= tolerance_slots);
            if corroborated {
                periods.push(period);
            }
        }

        if periods.len() < 2 {
            return 0.0;
        }
        let avg_period = periods.iter().sum::<f64>() / periods.len() as f64;
        60.0 / avg_period
    }

    #[instrument(name = "pedal_estimate", skip(self, window), fields(slots = window.len()))]
    fn process_window(&self, window: &[Option<TelemetrySample>], ctx: &mut MatchContext) {
        let trailing = window.len().saturating_sub(self.config.window_slots);
        let rpm = self.estimate(&window[trailing..]);
        debug!(rpm, "pedal stroke estimate");
        metrics::histogram!("effect_pedal_rpm").record(rpm);
        ctx.pedal_rpm = rpm;
    }
}

impl Effect for PedalStrokeEstimator {
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
