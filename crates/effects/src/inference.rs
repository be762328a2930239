//! Inference gate - black-box predictor driver.
//!
//! Wraps an externally supplied `InferencePredictor` and honors the
//! snapshot's trigger-opportunity count: exactly `predict_time` predictions
//! per snapshot, each over a trailing slice of the fused window. Windows
//! shorter than the predictor's input length are skipped silently and
//! retried at the next snapshot.

use contracts::{
    Effect, EffectId, InferenceOutput, InferencePredictor, MatchContext, MatchEvent,
    SourcePosition, WindowSnapshot,
};
use tracing::{debug, instrument, warn};

use crate::signal;

/// Inference gate configuration.
#[derive(Debug, Clone)]
pub struct InferenceGateConfig {
    /// Effect identifier for bonus records and logging
    pub id: EffectId,

    /// Source whose accelerometer magnitude feeds the predictor
    pub source: SourcePosition,

    /// Bonus seconds credited per positive prediction (0 = record only)
    pub bonus_seconds: f64,
}

/// Predictor-driven effect.
pub struct InferenceGate {
    config: InferenceGateConfig,
    predictor: Box<dyn InferencePredictor>,
    predictions: u64,
    positives: u64,
}

impl InferenceGate {
    pub fn new(config: InferenceGateConfig, predictor: Box<dyn InferencePredictor>) -> Self {
        Self {
            config,
            predictor,
            predictions: 0,
            positives: 0,
        }
    }

    /// Total predictions run so far.
    pub fn predictions(&self) -> u64 {
        self.predictions
    }

    /// Total positive predictions so far.
    pub fn positives(&self) -> u64 {
        self.positives
    }

    #[instrument(
        name = "inference_gate",
        skip(self, snapshot, ctx),
        fields(effect = %self.config.id, predict_time = snapshot.predict_time)
    )]
    fn process_snapshot(&mut self, snapshot: &WindowSnapshot, ctx: &mut MatchContext) {
        let Some(window) = snapshot.window(self.config.source) else {
            return;
        };
        let Some(motion) = signal::fill_motion_gaps(window) else {
            return;
        };
        let series: Vec<f32> = signal::accel_magnitudes(&motion)
            .into_iter()
            .map(|v| v as f32)
            .collect();

        let input_len = self.predictor.input_len();
        for opportunity in 0..snapshot.predict_time {
            // Opportunity 0 is the oldest newly-covered slot.
            let lag = (snapshot.predict_time - 1 - opportunity) as usize;
            let Some(end) = series.len().checked_sub(lag) else {
                continue;
            };
            if end < input_len {
                continue; // window not long enough yet
            }
            let input = &series[end - input_len..end];

            match self.predictor.predict(input) {
                Ok(output) => {
                    self.predictions += 1;
                    metrics::counter!(
                        "inference_predictions_total",
                        "effect" => self.config.id.to_string()
                    )
                    .increment(1);
                    if is_positive(&output) {
                        self.positives += 1;
                        debug!(?output, "positive prediction");
                        if self.config.bonus_seconds > 0.0 {
                            ctx.add_bonus(&self.config.id, self.config.bonus_seconds);
                        }
                    }
                }
                Err(e) => {
                    // A failed call is a skipped opportunity, never fatal.
                    warn!(error = %e, "prediction failed");
                    metrics::counter!(
                        "inference_errors_total",
                        "effect" => self.config.id.to_string()
                    )
                    .increment(1);
                }
            }
        }
    }
}

fn is_positive(output: &InferenceOutput) -> bool {
    match output {
        InferenceOutput::Bool(b) => *b,
        InferenceOutput::Int(i) => *i > 0,
        InferenceOutput::Float(f) => *f > 0.5,
    }
}

impl Effect for InferenceGate {
    fn id(&self) -> EffectId {
        self.config.id.clone()
    }

    fn on_event(&mut self, event: &MatchEvent, ctx: &mut MatchContext) {
        if let MatchEvent::WindowReady(snapshot) = event {
            self.process_snapshot(snapshot, ctx);
        }
    }
}
